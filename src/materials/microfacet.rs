// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f, PI};
use crate::math::spectrum::RGBSpectrum;

pub const MIN_ALPHA: Float = 1e-3;

fn clamp01(v: Float) -> Float {
    v.max(0.0).min(1.0)
}

pub fn roughness_to_alpha(roughness: Float) -> Float {
    (roughness * roughness).max(MIN_ALPHA)
}

pub fn ggx_d(cos_theta: Float, alpha: Float) -> Float {
    if cos_theta <= 0.0 {
        return 0.0;
    }
    let a = alpha.max(MIN_ALPHA);
    let a2 = a * a;
    let cos2 = cos_theta * cos_theta;
    let denom = cos2 * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom)
}

pub fn ggx_g1(cos_theta: Float, alpha: Float) -> Float {
    if cos_theta <= 0.0 {
        return 0.0;
    }
    let a = alpha.max(MIN_ALPHA);
    let cos2 = cos_theta * cos_theta;
    let sin2 = (1.0 - cos2).max(0.0);
    if sin2 <= 0.0 {
        return 1.0;
    }
    let tan2 = sin2 / cos2.max(1e-6);
    let root = (1.0 + a * a * tan2).sqrt();
    2.0 / (1.0 + root)
}

pub fn ggx_g(cos_i: Float, cos_o: Float, alpha: Float) -> Float {
    ggx_g1(cos_i.abs(), alpha) * ggx_g1(cos_o.abs(), alpha)
}

pub fn pdf_ggx_vndf(wi: &Vector3f, m: &Vector3f, alpha: Float) -> Float {
    if wi.z <= 1e-6 || m.z <= 0.0 {
        return 0.0;
    }
    let d = ggx_d(m.z, alpha);
    let g1 = ggx_g1(wi.z, alpha);
    d * g1 * wi.dot(m).abs() / wi.z
}

pub fn sample_ggx_vndf(wi: &Vector3f, u: &Vector2f, alpha: Float) -> Vector3f {
    let a = alpha.max(MIN_ALPHA);
    let wi = Vector3f::new(a * wi.x, a * wi.y, wi.z).normalize();

    let mut t1 = Vector3f::new(1.0, 0.0, 0.0);
    if wi.z < 0.9999 {
        t1 = Vector3f::new(0.0, 0.0, 1.0).cross(&wi).normalize();
    }
    let t2 = wi.cross(&t1);

    let r = clamp01(u.x).sqrt();
    let phi = 2.0 * PI * clamp01(u.y);
    let t1p = r * phi.cos();
    let mut t2p = r * phi.sin();
    let s = 0.5 * (1.0 + wi.z);
    t2p = (1.0 - s) * (1.0 - t1p * t1p).max(0.0).sqrt() + s * t2p;

    let nh = t1 * t1p + t2 * t2p + wi * (1.0 - t1p * t1p - t2p * t2p).max(0.0).sqrt();
    Vector3f::new(a * nh.x, a * nh.y, nh.z.max(0.0)).normalize()
}

pub fn reflect(wi: &Vector3f, m: &Vector3f) -> Vector3f {
    2.0 * wi.dot(m) * m - wi
}

pub fn fresnel_schlick(f0: RGBSpectrum, cos_theta: Float) -> RGBSpectrum {
    let one_minus = (1.0 - clamp01(cos_theta)).powi(5);
    f0 + (RGBSpectrum::splat(1.0) - f0) * one_minus
}

pub fn fresnel_schlick_scalar(f0: Float, cos_theta: Float) -> Float {
    f0 + (1.0 - f0) * (1.0 - clamp01(cos_theta)).powi(5)
}

/// Normal-incidence reflectance of a dielectric interface against air.
pub fn dielectric_f0(ior: Float) -> Float {
    let r = (ior - 1.0) / (ior + 1.0);
    if r.is_finite() { r * r } else { 0.0 }
}

/// Torrance-Sparrow GGX reflection term `D G / (4 cos_i cos_o)` in the local
/// frame, without Fresnel.
pub fn ggx_reflection(wi: &Vector3f, wo: &Vector3f, alpha: Float) -> Float {
    let cos_i = wi.z;
    let cos_o = wo.z;
    if cos_i <= 1e-6 || cos_o <= 1e-6 {
        return 0.0;
    }
    let m = wi + wo;
    if m.norm_squared() <= 0.0 {
        return 0.0;
    }
    let m = m.normalize();
    let d = ggx_d(m.z, alpha);
    let g = ggx_g(cos_i, cos_o, alpha);
    d * g / (4.0 * cos_i * cos_o)
}
