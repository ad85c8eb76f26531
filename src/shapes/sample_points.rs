// Copyright @yucwang 2026

use crate::core::material::Material;
use crate::core::rng::LcgRng;
use crate::math::constants::{ Float, Vector3f };

pub const DEFAULT_SAMPLE_COUNT: usize = 1560;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleSettings {
    pub count: usize,
    pub seed: u64,
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self { count: DEFAULT_SAMPLE_COUNT, seed: 0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplePoint {
    pub direction: Vector3f,
    pub pdf: Float,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleCloud {
    pub points: Vec<SamplePoint>,
}

impl SampleCloud {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Importance samples of `material` for light arriving from `light_dir`
/// over a Y-up surface. Materials that cannot sample give an empty cloud.
pub fn sample_points(material: &dyn Material, light_dir: Vector3f, settings: &SampleSettings) -> SampleCloud {
    let normal = Vector3f::new(0.0, 1.0, 0.0);
    let mut rng = LcgRng::new(settings.seed);
    let mut points = Vec::with_capacity(settings.count);

    for _ in 0..settings.count {
        let u = rng.next_vector3();
        if let Some(sample) = material.sample(normal, normal, light_dir, u) {
            points.push(SamplePoint { direction: sample.direction, pdf: sample.pdf });
        }
    }

    if points.len() < settings.count {
        log::debug!("{} of {} samples were rejected.", settings.count - points.len(), settings.count);
    }
    SampleCloud { points }
}
