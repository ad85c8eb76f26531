// Copyright @yucwang 2026

use crate::core::bsdf::{ BSDFSampleRecord, BSDF };
use crate::core::library::MaterialLibrary;
use crate::core::material::{ DataType, Material, MaterialError, MaterialParam, MaterialSample, ParamValue };
use crate::materials::matte::MatteBSDF;
use crate::materials::pbm::PhysicallyBasedBSDF;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::frame::Frame;
use crate::math::spectrum::RGBSpectrum;

pub const MATTE: &str = "Matte";
pub const PBM: &str = "PBM";

#[derive(Clone, Copy, Debug, PartialEq)]
enum Model {
    Matte(MatteBSDF),
    PhysicallyBased(PhysicallyBasedBSDF),
}

impl Model {
    fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype {
            MATTE => Some(Model::Matte(MatteBSDF::default())),
            PBM => Some(Model::PhysicallyBased(PhysicallyBasedBSDF::default())),
            _ => None,
        }
    }

    fn subtype(&self) -> &'static str {
        match self {
            Model::Matte(_) => MATTE,
            Model::PhysicallyBased(_) => PBM,
        }
    }

    fn bsdf(&self) -> &dyn BSDF {
        match self {
            Model::Matte(bsdf) => bsdf,
            Model::PhysicallyBased(bsdf) => bsdf,
        }
    }
}

/// The built-in shading models, switchable by subtype name.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardMaterial {
    model: Model,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self { model: Model::Matte(MatteBSDF::default()) }
    }
}

impl StandardMaterial {
    pub fn new(subtype: &str) -> Result<Self, MaterialError> {
        let model = Model::from_subtype(subtype)
            .ok_or_else(|| MaterialError::UnknownSubtype(subtype.to_string()))?;
        Ok(Self { model })
    }

    pub fn supported_subtypes() -> Vec<String> {
        vec![MATTE.to_string(), PBM.to_string()]
    }

    pub fn supported_params(subtype: &str) -> Vec<MaterialParam> {
        match Model::from_subtype(subtype) {
            Some(model) => {
                let material = StandardMaterial { model };
                param_names(subtype)
                    .iter()
                    .filter_map(|name| material.get_parameter(name))
                    .collect()
            }
            None => Vec::new(),
        }
    }
}

fn param_names(subtype: &str) -> &'static [&'static str] {
    match subtype {
        MATTE => &["color"],
        PBM => &["baseColor", "opacity", "metallic", "roughness", "clearcoat", "clearcoatRoughness", "ior"],
        _ => &[],
    }
}

fn expect_float(param: &MaterialParam) -> Result<Float, MaterialError> {
    param.value.as_float().ok_or_else(|| MaterialError::TypeMismatch {
        name: param.name.clone(),
        expected: DataType::Float,
        found: param.data_type(),
    })
}

fn expect_color(param: &MaterialParam) -> Result<RGBSpectrum, MaterialError> {
    param.value.as_float3().map(RGBSpectrum::from_vector).ok_or_else(|| MaterialError::TypeMismatch {
        name: param.name.clone(),
        expected: DataType::Float3,
        found: param.data_type(),
    })
}

impl Material for StandardMaterial {
    fn subtype(&self) -> &str {
        self.model.subtype()
    }

    fn eval(&self,
            ng: Vector3f,
            ns: Vector3f,
            view_dir: Vector3f,
            light_dir: Vector3f,
            light_intensity: RGBSpectrum) -> RGBSpectrum {
        let view_dir = view_dir.normalize();
        let light_dir = light_dir.normalize();
        if ng.dot(&view_dir) <= 0.0 || ng.dot(&light_dir) <= 0.0 {
            return RGBSpectrum::default();
        }

        let frame = Frame::from_normal(&ns);
        let wi = frame.to_local(&light_dir);
        let wo = frame.to_local(&view_dir);
        let cos_theta = wi.z.max(0.0);
        let eval = self.model.bsdf().eval(&BSDFSampleRecord::new(wi, wo, 0.0));
        eval.value * light_intensity * cos_theta
    }

    fn set_subtype(&mut self, subtype: &str) -> Result<(), MaterialError> {
        self.model = Model::from_subtype(subtype)
            .ok_or_else(|| MaterialError::UnknownSubtype(subtype.to_string()))?;
        Ok(())
    }

    fn set_parameter(&mut self, param: &MaterialParam) -> Result<(), MaterialError> {
        let name = param.name.as_str();
        let subtype = self.model.subtype();
        let unknown = || MaterialError::UnknownParameter {
            subtype: subtype.to_string(),
            name: name.to_string(),
        };
        match &mut self.model {
            Model::Matte(bsdf) => match name {
                "color" => bsdf.color = expect_color(param)?,
                _ => return Err(unknown()),
            },
            Model::PhysicallyBased(bsdf) => match name {
                "baseColor" => bsdf.base_color = expect_color(param)?,
                "opacity" => bsdf.opacity = expect_float(param)?,
                "metallic" => bsdf.metallic = expect_float(param)?,
                "roughness" => bsdf.roughness = expect_float(param)?,
                "clearcoat" => bsdf.clearcoat = expect_float(param)?,
                "clearcoatRoughness" => bsdf.clearcoat_roughness = expect_float(param)?,
                "ior" => bsdf.ior = expect_float(param)?,
                _ => return Err(unknown()),
            },
        }
        Ok(())
    }

    fn get_parameter(&self, name: &str) -> Option<MaterialParam> {
        let value = match &self.model {
            Model::Matte(bsdf) => match name {
                "color" => ParamValue::Float3(bsdf.color.to_vector()),
                _ => return None,
            },
            Model::PhysicallyBased(bsdf) => match name {
                "baseColor" => ParamValue::Float3(bsdf.base_color.to_vector()),
                "opacity" => ParamValue::Float(bsdf.opacity),
                "metallic" => ParamValue::Float(bsdf.metallic),
                "roughness" => ParamValue::Float(bsdf.roughness),
                "clearcoat" => ParamValue::Float(bsdf.clearcoat),
                "clearcoatRoughness" => ParamValue::Float(bsdf.clearcoat_roughness),
                "ior" => ParamValue::Float(bsdf.ior),
                _ => return None,
            },
        };
        Some(MaterialParam::new(name, value))
    }

    fn sample(&self, ng: Vector3f, ns: Vector3f, wi: Vector3f, u: Vector3f) -> Option<MaterialSample> {
        let wi = wi.normalize();
        if ng.dot(&wi) <= 0.0 {
            return None;
        }
        let frame = Frame::from_normal(&ns);
        let record = self.model.bsdf().sample(Vector2f::new(u.y, u.z), u.x, frame.to_local(&wi));
        if !record.is_valid() {
            return None;
        }
        Some(MaterialSample {
            direction: frame.from_local(&record.wo),
            pdf: record.pdf,
        })
    }
}

/// Library over [`StandardMaterial`]; this is what the crate exports when
/// built as a plugin.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardLibrary;

impl MaterialLibrary for StandardLibrary {
    fn name(&self) -> String {
        String::from("builtin")
    }

    fn supported_subtypes(&self) -> Vec<String> {
        StandardMaterial::supported_subtypes()
    }

    fn supported_params(&self, subtype: &str) -> Vec<MaterialParam> {
        StandardMaterial::supported_params(subtype)
    }

    fn create_instance(&self, subtype: &str) -> Option<Box<dyn Material>> {
        match StandardMaterial::new(subtype) {
            Ok(material) => Some(Box::new(material)),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::INV_PI;

    fn up() -> Vector3f {
        Vector3f::new(0.0, 1.0, 0.0)
    }

    #[test]
    fn test_supported_params_defaults() {
        let matte = StandardMaterial::supported_params(MATTE);
        assert_eq!(matte, vec![MaterialParam::float3("color", Vector3f::new(1.0, 1.0, 1.0))]);

        let pbm = StandardMaterial::supported_params(PBM);
        let names: Vec<&str> = pbm.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["baseColor", "opacity", "metallic", "roughness",
                               "clearcoat", "clearcoatRoughness", "ior"]);
        assert_eq!(pbm[1], MaterialParam::float("opacity", 1.0));
        assert_eq!(pbm[6], MaterialParam::float("ior", 1.0));

        assert!(StandardMaterial::supported_params("Glass").is_empty());
    }

    #[test]
    fn test_set_subtype_resets_parameters() {
        let mut mat = StandardMaterial::new(PBM).unwrap();
        mat.set_parameter(&MaterialParam::float("roughness", 0.7)).unwrap();
        mat.set_subtype(MATTE).unwrap();
        mat.set_subtype(PBM).unwrap();
        assert_eq!(mat.get_parameter("roughness"), Some(MaterialParam::float("roughness", 0.0)));
    }

    #[test]
    fn test_unknown_subtype_keeps_state() {
        let mut mat = StandardMaterial::new(PBM).unwrap();
        let err = mat.set_subtype("Velvet").unwrap_err();
        assert_eq!(err, MaterialError::UnknownSubtype("Velvet".to_string()));
        assert_eq!(mat.subtype(), PBM);
    }

    #[test]
    fn test_parameter_errors() {
        let mut mat = StandardMaterial::new(MATTE).unwrap();
        assert!(matches!(mat.set_parameter(&MaterialParam::float("roughness", 0.5)),
                         Err(MaterialError::UnknownParameter { .. })));
        assert!(matches!(mat.set_parameter(&MaterialParam::float("color", 0.5)),
                         Err(MaterialError::TypeMismatch { expected: DataType::Float3, .. })));
        assert_eq!(mat.get_parameter("color").and_then(|p| p.value.as_float3()),
                   Some(Vector3f::new(1.0, 1.0, 1.0)));
        assert_eq!(mat.get_parameter("metallic"), None);
    }

    #[test]
    fn test_matte_eval_is_cosine_weighted() {
        let mat = StandardMaterial::new(MATTE).unwrap();
        let light = Vector3f::new(1.0, 1.0, 0.0);
        let view = Vector3f::new(0.0, 1.0, 0.0);
        let value = mat.eval(up(), up(), view, light, RGBSpectrum::splat(1.0));
        let expected = INV_PI * (0.5 as Float).sqrt();
        assert!((value.g() - expected).abs() < 1e-5, "{} vs {}", value.g(), expected);
    }

    #[test]
    fn test_eval_below_horizon_is_black() {
        let mat = StandardMaterial::new(MATTE).unwrap();
        let light = Vector3f::new(0.0, 1.0, 0.0);
        let below = Vector3f::new(0.3, -1.0, 0.0);
        assert!(mat.eval(up(), up(), below, light, RGBSpectrum::splat(1.0)).is_black());
        assert!(mat.eval(up(), up(), light, below, RGBSpectrum::splat(1.0)).is_black());
    }

    #[test]
    fn test_sample_returns_upper_hemisphere_direction() {
        let mat = StandardMaterial::new(PBM).unwrap();
        let sample = mat.sample(up(), up(), Vector3f::new(1.0, 1.0, 0.0), Vector3f::new(0.2, 0.4, 0.6))
            .expect("sample");
        assert!(sample.direction.y > 0.0);
        assert!(sample.pdf > 0.0);
    }

    #[test]
    fn test_library_creates_known_subtypes_only() {
        let library = StandardLibrary;
        assert!(library.supports(PBM));
        assert_eq!(library.create_instance(PBM).map(|m| m.subtype().to_string()),
                   Some(PBM.to_string()));
        assert!(library.create_instance("Velvet").is_none());
    }
}
