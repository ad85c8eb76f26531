// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFSampleRecord, BSDFEvalResult, BSDF};
use crate::materials::microfacet::{
    dielectric_f0, fresnel_schlick, fresnel_schlick_scalar, ggx_reflection, pdf_ggx_vndf,
    reflect, roughness_to_alpha, sample_ggx_vndf,
};
use crate::math::constants::{Float, INV_PI, Vector2f, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::{ sample_cosine_hemisphere, sample_cosine_hemisphere_pdf };

const CLEARCOAT_F0: Float = 0.04;

/// Metallic/roughness model with an optional clearcoat layer: a GGX
/// specular lobe over a Lambert base, both scaled by opacity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicallyBasedBSDF {
    pub base_color: RGBSpectrum,
    pub opacity: Float,
    pub metallic: Float,
    pub roughness: Float,
    pub clearcoat: Float,
    pub clearcoat_roughness: Float,
    pub ior: Float,
}

impl Default for PhysicallyBasedBSDF {
    fn default() -> Self {
        Self {
            base_color: RGBSpectrum::splat(1.0),
            opacity: 1.0,
            metallic: 0.0,
            roughness: 0.0,
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            ior: 1.0,
        }
    }
}

impl PhysicallyBasedBSDF {
    fn alpha(&self) -> Float {
        roughness_to_alpha(self.roughness)
    }

    fn specular_f0(&self) -> RGBSpectrum {
        RGBSpectrum::lerp(RGBSpectrum::splat(dielectric_f0(self.ior)),
                          self.base_color,
                          self.metallic.max(0.0).min(1.0))
    }

    fn diffuse_weight(&self) -> Float {
        0.5 * (1.0 - self.metallic.max(0.0).min(1.0))
    }

    pub fn pdf(&self, wi: &Vector3f, wo: &Vector3f) -> Float {
        if wi.z <= 0.0 || wo.z <= 0.0 {
            return 0.0;
        }
        let w_diffuse = self.diffuse_weight();
        let mut pdf = w_diffuse * sample_cosine_hemisphere_pdf(wo.z);

        let m = (wi + wo).normalize();
        let denom = 4.0 * wo.dot(&m).abs();
        if denom > 1e-6 {
            pdf += (1.0 - w_diffuse) * pdf_ggx_vndf(wi, &m, self.alpha()) / denom;
        }
        pdf
    }
}

impl BSDF for PhysicallyBasedBSDF {
    fn eval(&self, sample_record: &BSDFSampleRecord) -> BSDFEvalResult {
        let wi = sample_record.wi;
        let wo = sample_record.wo;
        if wi.z <= 0.0 || wo.z <= 0.0 {
            return BSDFEvalResult::default();
        }

        let m = (wi + wo).normalize();
        let cos_i_m = wi.dot(&m).max(0.0);

        let fresnel = fresnel_schlick(self.specular_f0(), cos_i_m);
        let specular = fresnel * ggx_reflection(&wi, &wo, self.alpha());
        let diffuse = self.base_color * (RGBSpectrum::splat(1.0) - fresnel)
            * ((1.0 - self.metallic) * INV_PI);
        let mut value = diffuse + specular;

        if self.clearcoat > 0.0 {
            let fc = fresnel_schlick_scalar(CLEARCOAT_F0, cos_i_m) * self.clearcoat;
            let coat = fc * ggx_reflection(&wi, &wo, roughness_to_alpha(self.clearcoat_roughness));
            value = value * (1.0 - fc) + RGBSpectrum::splat(coat);
        }

        BSDFEvalResult {
            value: value * self.opacity,
            pdf: self.pdf(&wi, &wo),
        }
    }

    fn sample(&self, u1: Vector2f, u2: Float, wi: Vector3f) -> BSDFSampleRecord {
        if wi.z <= 0.0 {
            return BSDFSampleRecord::default();
        }

        let wo = if u2 < self.diffuse_weight() {
            sample_cosine_hemisphere(&u1)
        } else {
            let m = sample_ggx_vndf(&wi, &u1, self.alpha());
            reflect(&wi, &m)
        };
        if wo.z <= 0.0 {
            return BSDFSampleRecord::default();
        }

        BSDFSampleRecord::new(wi, wo, self.pdf(&wi, &wo))
    }
}
