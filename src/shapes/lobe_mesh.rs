// Copyright @yucwang 2026

use std::fmt;
use std::str::FromStr;

use crate::core::material::Material;
use crate::core::progress::progress_bar;
use crate::math::constants::{ Float, Vector3f, EPSILON, PI, TWO_PI };
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::spherical_direction_y_up;

pub const DEFAULT_SEGMENTS: usize = 400;
pub const MIN_SEGMENTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum LobeError {
    TooFewSegments(usize),
    UnknownMetric(String),
    DegenerateLight,
    EmptyImage { width: usize, height: usize },
}

impl fmt::Display for LobeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LobeError::TooFewSegments(n) =>
                write!(f, "lobe needs at least {} segments, got {}", MIN_SEGMENTS, n),
            LobeError::UnknownMetric(name) =>
                write!(f, "unknown radiance metric: {} (expected green, luminance, max or length)", name),
            LobeError::DegenerateLight => write!(f, "light direction must not be zero"),
            LobeError::EmptyImage { width, height } =>
                write!(f, "image size {}x{} has no pixels", width, height),
        }
    }
}

impl std::error::Error for LobeError {}

/// Reduces RGB radiance to the scalar radius of a lobe vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadianceMetric {
    Green,
    Luminance,
    Max,
    Length,
}

impl Default for RadianceMetric {
    fn default() -> Self {
        RadianceMetric::Green
    }
}

impl RadianceMetric {
    pub fn apply(&self, value: &RGBSpectrum) -> Float {
        let m = match self {
            RadianceMetric::Green => value.g().abs(),
            RadianceMetric::Luminance => value.luminance(),
            RadianceMetric::Max => value.max_component(),
            RadianceMetric::Length => value.length(),
        };
        if m.is_finite() { m.max(0.0) } else { 0.0 }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RadianceMetric::Green => "green",
            RadianceMetric::Luminance => "luminance",
            RadianceMetric::Max => "max",
            RadianceMetric::Length => "length",
        }
    }
}

impl fmt::Display for RadianceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RadianceMetric {
    type Err = LobeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" | "g" => Ok(RadianceMetric::Green),
            "luminance" | "y" => Ok(RadianceMetric::Luminance),
            "max" => Ok(RadianceMetric::Max),
            "length" => Ok(RadianceMetric::Length),
            _ => Err(LobeError::UnknownMetric(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LobeSettings {
    pub segments: usize,
    pub metric: RadianceMetric,
    pub show_progress: bool,
}

impl Default for LobeSettings {
    fn default() -> Self {
        Self { segments: DEFAULT_SEGMENTS, metric: RadianceMetric::default(), show_progress: true }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LobeMesh {
    pub vertices: Vec<Vector3f>,
    pub indices: Vec<[u32; 3]>,
    /// Radiance behind each vertex.
    pub values: Vec<RGBSpectrum>,
}

impl LobeMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn max_radius(&self) -> Float {
        self.vertices.iter().map(|v| v.norm()).fold(0.0, Float::max)
    }
}

/// Triangles of a ring grid with `segments - 1` rings of `segments` vertices.
pub fn lobe_indices(segments: usize) -> Vec<[u32; 3]> {
    if segments < MIN_SEGMENTS {
        return Vec::new();
    }
    let s = segments;
    let mut indices = Vec::with_capacity(2 * s * (s - 2));
    for j in 0..(s - 2) {
        for i in 0..s {
            let a = (j * s + i) as u32;
            let b = (j * s + (i + 1) % s) as u32;
            let c = ((j + 1) * s + (i + 1) % s) as u32;
            let d = ((j + 1) * s + i) as u32;
            indices.push([a, b, c]);
            indices.push([a, c, d]);
        }
    }
    indices
}

/// Sweeps the view direction over the sphere around a Y-up surface and
/// scales each direction by the reflected radiance.
pub fn sample_lobe(material: &dyn Material,
                   light_dir: Vector3f,
                   light_intensity: RGBSpectrum,
                   settings: &LobeSettings) -> Result<LobeMesh, LobeError> {
    let s = settings.segments;
    if s < MIN_SEGMENTS {
        return Err(LobeError::TooFewSegments(s));
    }
    let light_dir = light_dir.try_normalize(EPSILON).ok_or(LobeError::DegenerateLight)?;

    let normal = Vector3f::new(0.0, 1.0, 0.0);
    let rings = s - 1;
    let mut vertices = Vec::with_capacity(rings * s);
    let mut values = Vec::with_capacity(rings * s);

    let progress = progress_bar(rings as u64, "rings", settings.show_progress);
    for ring in 0..rings {
        let phi = PI * (ring + 1) as Float / s as Float;
        for step in 0..s {
            let theta = TWO_PI * step as Float / s as Float;
            let dir = spherical_direction_y_up(phi, theta);
            let value = material.eval(normal, normal, dir, light_dir, light_intensity);
            vertices.push(dir * settings.metric.apply(&value));
            values.push(value);
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let mesh = LobeMesh { vertices, indices: lobe_indices(s), values };
    log::debug!("Sampled {} lobe: {} vertices, {} triangles.",
                material.subtype(), mesh.vertex_count(), mesh.triangle_count());
    Ok(mesh)
}
