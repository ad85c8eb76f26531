// Copyright @yucwang 2023

use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::spectrum::RGBSpectrum;

// Definitions of types used in BSDF sampling and eval
// processes. Directions are in the local shading frame, z is the normal.
// `wi` points toward the light, `wo` toward the viewer.
pub type BSDFValue = RGBSpectrum;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BSDFSampleRecord {
    pub wi: Vector3f,
    pub wo: Vector3f,
    pub pdf: Float,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BSDFEvalResult {
    pub value: BSDFValue,
    pub pdf: Float,
}

pub trait BSDF {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
    fn eval(&self, sample_record: &BSDFSampleRecord) -> BSDFEvalResult;
    /// `u1` drives the direction, `u2` chooses between lobes.
    fn sample(&self, u1: Vector2f,
                     u2: Float,
                     wi: Vector3f) -> BSDFSampleRecord;
}

impl Default for BSDFSampleRecord {
    fn default() -> Self {
        Self {
            wi: Vector3f::zeros(),
            wo: Vector3f::zeros(),
            pdf: 0.0,
        }
    }
}

impl BSDFSampleRecord {
    pub fn new(wi: Vector3f, wo: Vector3f, pdf: Float) -> Self {
        Self { wi, wo, pdf }
    }

    pub fn is_valid(&self) -> bool {
        self.pdf > 0.0 && self.pdf.is_finite()
    }
}

impl Default for BSDFEvalResult {
    fn default() -> Self {
        Self {
            value: RGBSpectrum::default(),
            pdf: 0.0,
        }
    }
}
