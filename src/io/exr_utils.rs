/* Copyright 2020 @TwoCookingMice */

use std::path::Path;

use exr::prelude::write_rgb_file;

use crate::math::bitmap::Bitmap;

// Write a linear RGB bitmap as OpenEXR
pub fn write_exr_to_file<P: AsRef<Path>>(bitmap: &Bitmap, file_path: P) -> Result<(), exr::error::Error> {
    let file_path = file_path.as_ref();
    log::info!("Starting writing openexr images: {}.", file_path.display());

    write_rgb_file(file_path, bitmap.width(), bitmap.height(), |x, y| {
        let pixel = bitmap[(x, y)];
        (pixel.x, pixel.y, pixel.z)
    })?;

    log::info!("EXR written to: {}.", file_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Vector3f;

    #[test]
    fn test_write_exr_to_file() {
        let mut bitmap = Bitmap::new(4, 2);
        bitmap[(1, 1)] = Vector3f::new(0.25, 0.5, 2.0);
        let path = std::env::temp_dir().join(format!("brdf_explorer_slice_{}.exr", std::process::id()));
        write_exr_to_file(&bitmap, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        let _ = std::fs::remove_file(&path);
    }
}
