// Copyright @yucwang 2026

use std::fs::File;
use std::io::{ self, BufWriter, Write };
use std::path::Path;

use crate::math::constants::Vector3f;
use crate::shapes::lobe_mesh::LobeMesh;
use crate::shapes::sample_points::SampleCloud;

fn write_vertex<W: Write>(out: &mut W, v: &Vector3f) -> io::Result<()> {
    writeln!(out, "v {} {} {}", v.x, v.y, v.z)
}

/// Lobe as a triangle mesh, OBJ indices are 1-based.
pub fn write_lobe_obj<W: Write>(out: &mut W, mesh: &LobeMesh) -> io::Result<()> {
    writeln!(out, "# brdf-explorer lobe: {} vertices, {} triangles", mesh.vertex_count(), mesh.triangle_count())?;
    writeln!(out, "o lobe")?;
    for v in &mesh.vertices {
        write_vertex(out, v)?;
    }
    for [a, b, c] in &mesh.indices {
        writeln!(out, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }
    Ok(())
}

/// Sample directions as a point cloud on the unit sphere.
pub fn write_samples_obj<W: Write>(out: &mut W, cloud: &SampleCloud) -> io::Result<()> {
    writeln!(out, "# brdf-explorer samples: {}", cloud.len())?;
    writeln!(out, "o samples")?;
    for p in &cloud.points {
        write_vertex(out, &p.direction)?;
    }
    for i in 0..cloud.len() {
        writeln!(out, "p {}", i + 1)?;
    }
    Ok(())
}

pub fn write_lobe_obj_file<P: AsRef<Path>>(path: P, mesh: &LobeMesh) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    write_lobe_obj(&mut out, mesh)?;
    out.flush()
}

pub fn write_samples_obj_file<P: AsRef<Path>>(path: P, cloud: &SampleCloud) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    write_samples_obj(&mut out, cloud)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::standard::{ StandardMaterial, PBM };
    use crate::math::spectrum::RGBSpectrum;
    use crate::shapes::lobe_mesh::{ sample_lobe, LobeSettings, RadianceMetric };
    use crate::shapes::sample_points::SamplePoint;
    use wavefront_obj::obj;

    #[test]
    fn test_lobe_obj_parses_back() {
        let mat = StandardMaterial::new(PBM).unwrap();
        let settings = LobeSettings { segments: 8, metric: RadianceMetric::Green, show_progress: false };
        let mesh = sample_lobe(&mat, Vector3f::new(1.0, 1.0, 0.0), RGBSpectrum::splat(1.0), &settings).unwrap();

        let mut buf = Vec::new();
        write_lobe_obj(&mut buf, &mesh).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let obj_set = obj::parse(text).expect("failed to parse obj");
        assert_eq!(obj_set.objects.len(), 1);
        let object = &obj_set.objects[0];
        assert_eq!(object.name, "lobe");
        assert_eq!(object.vertices.len(), mesh.vertex_count());
        let shapes: usize = object.geometry.iter().map(|g| g.shapes.len()).sum();
        assert_eq!(shapes, mesh.triangle_count());
    }

    #[test]
    fn test_samples_obj_lines() {
        let cloud = SampleCloud {
            points: vec![
                SamplePoint { direction: Vector3f::new(0.0, 1.0, 0.0), pdf: 0.3 },
                SamplePoint { direction: Vector3f::new(1.0, 0.0, 0.0), pdf: 0.1 },
            ],
        };
        let mut buf = Vec::new();
        write_samples_obj(&mut buf, &cloud).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[2], "v 0 1 0");
        assert_eq!(lines[5], "p 2");
    }
}
