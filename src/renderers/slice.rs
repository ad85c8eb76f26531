// Copyright @yucwang 2026

use crate::core::material::Material;
use crate::core::progress::progress_bar;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{ Float, Vector3f, EPSILON, PI, TWO_PI };
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::spherical_direction_y_up;
use crate::shapes::lobe_mesh::LobeError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliceSettings {
    pub width: usize,
    pub height: usize,
    pub show_progress: bool,
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self { width: 256, height: 64, show_progress: true }
    }
}

/// View direction behind pixel `(x, y)`: columns sweep the azimuth over
/// `[0, 2π)`, rows the polar angle from the normal over `[0, π/2]`.
pub fn slice_direction(x: usize, y: usize, width: usize, height: usize) -> Vector3f {
    let theta = TWO_PI * x as Float / width as Float;
    let phi = if height > 1 {
        0.5 * PI * y as Float / (height - 1) as Float
    } else {
        0.0
    };
    spherical_direction_y_up(phi, theta)
}

/// Tabulates the reflected radiance over the upper hemisphere for a fixed
/// light.
pub fn render_slice(material: &dyn Material,
                    light_dir: Vector3f,
                    light_intensity: RGBSpectrum,
                    settings: &SliceSettings) -> Result<Bitmap, LobeError> {
    let (width, height) = (settings.width, settings.height);
    if width == 0 || height == 0 {
        return Err(LobeError::EmptyImage { width, height });
    }
    let light_dir = light_dir.try_normalize(EPSILON).ok_or(LobeError::DegenerateLight)?;

    let normal = Vector3f::new(0.0, 1.0, 0.0);
    let mut bitmap = Bitmap::new(width, height);
    let progress = progress_bar(height as u64, "rows", settings.show_progress);
    for y in 0..height {
        for x in 0..width {
            let view = slice_direction(x, y, width, height);
            let value = material.eval(normal, normal, view, light_dir, light_intensity);
            bitmap[(x, y)] = value.clamp_non_negative().to_vector();
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    log::debug!("Rendered {}x{} slice of {}, peak {}.", width, height, material.subtype(), bitmap.max_value());
    Ok(bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::standard::{ StandardMaterial, MATTE };
    use crate::math::constants::INV_PI;

    fn settings(width: usize, height: usize) -> SliceSettings {
        SliceSettings { width, height, show_progress: false }
    }

    #[test]
    fn test_slice_direction_layout() {
        assert!((slice_direction(0, 0, 8, 5) - Vector3f::new(0.0, 1.0, 0.0)).norm() < 1e-5);
        let horizon = slice_direction(0, 4, 8, 5);
        assert!(horizon.y.abs() < 1e-5);
        assert!((horizon.x - 1.0).abs() < 1e-5);
        let quarter = slice_direction(2, 4, 8, 5);
        assert!((quarter.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_matte_slice_is_flat_above_horizon() {
        let mat = StandardMaterial::new(MATTE).unwrap();
        let image = render_slice(&mat, Vector3f::new(0.0, 1.0, 0.0), RGBSpectrum::splat(2.0), &settings(16, 6)).unwrap();
        assert_eq!((image.width(), image.height()), (16, 6));
        for y in 0..5 {
            for x in 0..16 {
                assert!((image[(x, y)].y - 2.0 * INV_PI).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_empty_slice_is_an_error() {
        let mat = StandardMaterial::default();
        let err = render_slice(&mat, Vector3f::new(0.0, 1.0, 0.0), RGBSpectrum::splat(1.0), &settings(0, 4));
        assert_eq!(err, Err(LobeError::EmptyImage { width: 0, height: 4 }));
    }
}
