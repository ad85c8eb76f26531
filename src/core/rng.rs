// Copyright @yucwang 2026

use crate::math::constants::{ Float, Vector3f };

pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> Float {
        (self.next_u32() >> 8) as Float / (1u32 << 24) as Float
    }

    pub fn next_vector3(&mut self) -> Vector3f {
        let x = self.next_f32();
        let y = self.next_f32();
        let z = self.next_f32();
        Vector3f::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::LcgRng;

    #[test]
    fn test_rng_is_deterministic_and_in_range() {
        let mut a = LcgRng::new(7);
        let mut b = LcgRng::new(7);
        for _ in 0..1000 {
            let x = a.next_f32();
            assert_eq!(x, b.next_f32());
            assert!(x >= 0.0 && x < 1.0);
        }
    }
}
