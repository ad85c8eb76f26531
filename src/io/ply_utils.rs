// Copyright @yucwang 2026

use std::fs::File;
use std::io::{ self, BufWriter, Write };
use std::path::Path;

use ply_rs_bw::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType, ScalarType,
};
use ply_rs_bw::writer::Writer;

use crate::io::image_utils::linear_to_srgb;
use crate::math::constants::{ Float, Vector3f };
use crate::math::spectrum::RGBSpectrum;
use crate::shapes::lobe_mesh::LobeMesh;
use crate::shapes::sample_points::SampleCloud;

fn scalar(name: &str, ty: ScalarType) -> PropertyDef {
    PropertyDef::new(name.to_string(), PropertyType::Scalar(ty))
}

fn vertex_element(count: usize, with_color: bool, with_pdf: bool) -> ElementDef {
    let mut element = ElementDef::new("vertex".to_string());
    element.count = count;
    for name in ["x", "y", "z"] {
        element.properties.add(scalar(name, ScalarType::Float));
    }
    if with_color {
        for name in ["red", "green", "blue"] {
            element.properties.add(scalar(name, ScalarType::UChar));
        }
    }
    if with_pdf {
        element.properties.add(scalar("pdf", ScalarType::Float));
    }
    element
}

fn vertex(position: &Vector3f) -> DefaultElement {
    let mut v = DefaultElement::new();
    v.insert("x".to_string(), Property::Float(position.x));
    v.insert("y".to_string(), Property::Float(position.y));
    v.insert("z".to_string(), Property::Float(position.z));
    v
}

fn color_channel(v: Float, scale: Float) -> u8 {
    (linear_to_srgb(v * scale) * 255.0 + 0.5) as u8
}

fn new_ply(comment: String) -> Ply<DefaultElement> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header.comments.push(comment);
    ply
}

fn write_ply<W: Write>(out: &mut W, ply: &mut Ply<DefaultElement>) -> io::Result<usize> {
    ply.make_consistent()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{:?}", e)))?;
    Writer::<DefaultElement>::new().write_ply(out, ply)
}

/// Lobe mesh with per-vertex colors. The radiance is normalized by its
/// peak so the brightest vertex is white.
pub fn write_lobe_ply<W: Write>(out: &mut W, mesh: &LobeMesh) -> io::Result<usize> {
    let mut ply = new_ply(String::from("brdf-explorer lobe"));

    let peak = mesh.values.iter().map(RGBSpectrum::max_component).fold(0.0, Float::max);
    let scale = if peak > 0.0 { 1.0 / peak } else { 0.0 };

    ply.header.elements.add(vertex_element(mesh.vertex_count(), true, false));
    let mut face_element = ElementDef::new("face".to_string());
    face_element.count = mesh.triangle_count();
    face_element.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::UInt),
    ));
    ply.header.elements.add(face_element);

    let vertices = mesh.vertices.iter().zip(&mesh.values).map(|(p, value)| {
        let mut v = vertex(p);
        v.insert("red".to_string(), Property::UChar(color_channel(value.r(), scale)));
        v.insert("green".to_string(), Property::UChar(color_channel(value.g(), scale)));
        v.insert("blue".to_string(), Property::UChar(color_channel(value.b(), scale)));
        v
    }).collect();
    let faces = mesh.indices.iter().map(|tri| {
        let mut f = DefaultElement::new();
        f.insert("vertex_indices".to_string(), Property::ListUInt(tri.to_vec()));
        f
    }).collect();
    ply.payload.insert("vertex".to_string(), vertices);
    ply.payload.insert("face".to_string(), faces);

    write_ply(out, &mut ply)
}

/// Sample directions with their pdf.
pub fn write_samples_ply<W: Write>(out: &mut W, cloud: &SampleCloud) -> io::Result<usize> {
    let mut ply = new_ply(String::from("brdf-explorer samples"));
    ply.header.elements.add(vertex_element(cloud.len(), false, true));

    let vertices = cloud.points.iter().map(|p| {
        let mut v = vertex(&p.direction);
        v.insert("pdf".to_string(), Property::Float(p.pdf));
        v
    }).collect();
    ply.payload.insert("vertex".to_string(), vertices);

    write_ply(out, &mut ply)
}

pub fn write_lobe_ply_file<P: AsRef<Path>>(path: P, mesh: &LobeMesh) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    write_lobe_ply(&mut out, mesh)?;
    out.flush()
}

pub fn write_samples_ply_file<P: AsRef<Path>>(path: P, cloud: &SampleCloud) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    write_samples_ply(&mut out, cloud)?;
    out.flush()
}
