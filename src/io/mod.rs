// Copyright @yucwang 2026

pub mod exr_utils;
pub mod image_utils;
pub mod obj_utils;
pub mod ply_utils;

use std::fmt;
use std::path::{ Path, PathBuf };

use crate::math::bitmap::Bitmap;
use crate::shapes::lobe_mesh::LobeMesh;
use crate::shapes::sample_points::SampleCloud;

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Exr(exr::error::Error),
    Image(image::ImageError),
    UnsupportedFormat { path: PathBuf, expected: &'static str },
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<exr::error::Error> for ExportError {
    fn from(err: exr::error::Error) -> Self {
        ExportError::Exr(err)
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::Image(err)
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(err) => write!(f, "io error: {}", err),
            ExportError::Exr(err) => write!(f, "exr error: {}", err),
            ExportError::Image(err) => write!(f, "image error: {}", err),
            ExportError::UnsupportedFormat { path, expected } =>
                write!(f, "cannot export {}: expected a .{} file", path.display(), expected),
        }
    }
}

impl std::error::Error for ExportError {}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase())
}

/// Writes the lobe as `.obj` or `.ply`.
pub fn export_lobe<P: AsRef<Path>>(path: P, mesh: &LobeMesh) -> Result<(), ExportError> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("obj") => obj_utils::write_lobe_obj_file(path, mesh)?,
        Some("ply") => ply_utils::write_lobe_ply_file(path, mesh)?,
        _ => return Err(ExportError::UnsupportedFormat { path: path.to_path_buf(), expected: "obj or .ply" }),
    }
    log::info!("Lobe written to: {}.", path.display());
    Ok(())
}

/// Writes the sample cloud as `.obj` or `.ply`.
pub fn export_samples<P: AsRef<Path>>(path: P, cloud: &SampleCloud) -> Result<(), ExportError> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("obj") => obj_utils::write_samples_obj_file(path, cloud)?,
        Some("ply") => ply_utils::write_samples_ply_file(path, cloud)?,
        _ => return Err(ExportError::UnsupportedFormat { path: path.to_path_buf(), expected: "obj or .ply" }),
    }
    log::info!("{} samples written to: {}.", cloud.len(), path.display());
    Ok(())
}

/// Writes the slice as linear `.exr` or sRGB `.png`.
pub fn export_slice<P: AsRef<Path>>(path: P, bitmap: &Bitmap) -> Result<(), ExportError> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("exr") => exr_utils::write_exr_to_file(bitmap, path)?,
        Some("png") => image_utils::write_ldr_to_file(bitmap, path)?,
        _ => return Err(ExportError::UnsupportedFormat { path: path.to_path_buf(), expected: "exr or .png" }),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Vector3f;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("brdf_explorer_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let mesh = LobeMesh::default();
        assert!(matches!(export_lobe(temp_path("lobe.stl"), &mesh), Err(ExportError::UnsupportedFormat { .. })));
        assert!(matches!(export_samples(temp_path("samples"), &SampleCloud::default()),
                         Err(ExportError::UnsupportedFormat { .. })));
        assert!(matches!(export_slice(temp_path("slice.obj"), &Bitmap::new(1, 1)),
                         Err(ExportError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_export_by_extension() {
        let mesh = LobeMesh {
            vertices: vec![Vector3f::zeros(), Vector3f::new(1.0, 0.0, 0.0), Vector3f::new(0.0, 1.0, 0.0)],
            indices: vec![[0, 1, 2]],
            values: vec![Default::default(); 3],
        };
        for name in ["lobe.OBJ", "lobe.ply"] {
            let path = temp_path(name);
            export_lobe(&path, &mesh).unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
            let _ = std::fs::remove_file(&path);
        }

        let path = temp_path("slice.png");
        export_slice(&path, &Bitmap::new(4, 4)).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        let _ = std::fs::remove_file(&path);
    }
}
