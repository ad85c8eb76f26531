// Copyright @yucwang 2023

use crate::core::bsdf::{BSDFSampleRecord, BSDFEvalResult, BSDF};
use crate::math::constants::{ Float, INV_PI, Vector2f, Vector3f };
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::{ sample_cosine_hemisphere, sample_cosine_hemisphere_pdf };

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatteBSDF {
    pub color: RGBSpectrum
}

impl Default for MatteBSDF {
    fn default() -> Self {
        Self::new(RGBSpectrum::splat(1.0))
    }
}

impl BSDF for MatteBSDF {
    fn eval(&self, sample_record: &BSDFSampleRecord) -> BSDFEvalResult {
        let wi = sample_record.wi;
        let wo = sample_record.wo;
        if wi.z <= 0.0 || wo.z <= 0.0 {
            return BSDFEvalResult::default();
        }

        BSDFEvalResult {
            value: self.color * INV_PI,
            pdf: sample_cosine_hemisphere_pdf(wo.z),
        }
    }

    fn sample(&self,
              u1: Vector2f,
              _u2: Float,
              wi: Vector3f) -> BSDFSampleRecord {
        if wi.z <= 0.0 {
            return BSDFSampleRecord::default();
        }
        let wo = sample_cosine_hemisphere(&u1);
        BSDFSampleRecord::new(wi, wo, sample_cosine_hemisphere_pdf(wo.z))
    }
}

impl MatteBSDF {
    pub fn new(rgb: RGBSpectrum) -> Self {
        Self {
            color: rgb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::PI;

    #[test]
    fn test_matte_is_constant_over_hemisphere() {
        let bsdf = MatteBSDF::default();
        let wi = Vector3f::new(0.0, 0.0, 1.0);
        let a = bsdf.eval(&BSDFSampleRecord::new(wi, Vector3f::new(0.0, 0.6, 0.8), 0.0));
        let b = bsdf.eval(&BSDFSampleRecord::new(wi, Vector3f::new(0.8, 0.0, 0.6), 0.0));
        assert_eq!(a.value, b.value);
        assert!((a.value.r() - 1.0 / PI).abs() < 1e-6);
    }

    #[test]
    fn test_matte_rejects_lower_hemisphere() {
        let bsdf = MatteBSDF::default();
        let rec = BSDFSampleRecord::new(Vector3f::new(0.0, 0.0, 1.0), Vector3f::new(0.0, 0.0, -1.0), 0.0);
        assert!(bsdf.eval(&rec).value.is_black());
    }

    #[test]
    fn test_matte_sample_pdf_matches_eval() {
        let bsdf = MatteBSDF::default();
        let wi = Vector3f::new(0.0, 0.0, 1.0);
        let rec = bsdf.sample(Vector2f::new(0.3, 0.7), 0.5, wi);
        assert!(rec.is_valid());
        let eval = bsdf.eval(&rec);
        assert!((eval.pdf - rec.pdf).abs() < 1e-5);
    }
}
