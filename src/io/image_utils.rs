// Copyright @yucwang 2026

use std::path::Path;

use image::{ ImageResult, Rgb, RgbImage };

use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

/// Linear to sRGB transfer of a value clamped to `[0, 1]`.
pub fn linear_to_srgb(v: Float) -> Float {
    let v = if v.is_nan() { 0.0 } else { v.max(0.0).min(1.0) };
    if v <= 0.0031308 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

fn quantize(v: Float) -> u8 {
    (linear_to_srgb(v) * 255.0 + 0.5) as u8
}

pub fn bitmap_to_rgb8(bitmap: &Bitmap) -> RgbImage {
    RgbImage::from_fn(bitmap.width() as u32, bitmap.height() as u32, |x, y| {
        let pixel = bitmap[(x as usize, y as usize)];
        Rgb([quantize(pixel.x), quantize(pixel.y), quantize(pixel.z)])
    })
}

/// Writes an 8-bit sRGB image; the format follows the file extension.
pub fn write_ldr_to_file<P: AsRef<Path>>(bitmap: &Bitmap, file_path: P) -> ImageResult<()> {
    let file_path = file_path.as_ref();
    bitmap_to_rgb8(bitmap).save(file_path)?;
    log::info!("Image written to: {}.", file_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Vector3f;

    #[test]
    fn test_srgb_transfer() {
        assert_eq!(linear_to_srgb(0.0), 0.0);
        assert!((linear_to_srgb(1.0) - 1.0).abs() < 1e-5);
        assert!((linear_to_srgb(0.5) - 0.7354).abs() < 1e-3);
        assert_eq!(linear_to_srgb(4.0), linear_to_srgb(1.0));
        assert_eq!(linear_to_srgb(-1.0), 0.0);
    }

    #[test]
    fn test_bitmap_to_rgb8() {
        let mut bitmap = Bitmap::new(3, 2);
        bitmap[(2, 1)] = Vector3f::new(1.0, 0.0, 0.5);
        let image = bitmap_to_rgb8(&bitmap);
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [255, 0, 188]);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0]);
    }
}
