// Copyright @yucwang 2026

use std::fmt;

use crate::core::library::MaterialLibrary;
use crate::core::material::{ Material, MaterialError, MaterialParam, ParamValue };
use crate::core::settings_loader::ExplorerSettings;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{ Float, Vector3f, EPSILON };
use crate::math::spectrum::RGBSpectrum;
use crate::renderers::slice::{ render_slice, SliceSettings };
use crate::shapes::lobe_mesh::{ sample_lobe, LobeError, LobeMesh, LobeSettings };
use crate::shapes::sample_points::{ sample_points, SampleCloud, SampleSettings };

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub direction: Vector3f,
    pub intensity: Float,
}

impl Default for Light {
    fn default() -> Self {
        Self { direction: Vector3f::new(1.0, 1.0, 0.0), intensity: 1.0 }
    }
}

impl Light {
    pub fn radiance(&self) -> RGBSpectrum {
        RGBSpectrum::splat(self.intensity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerError {
    Material(MaterialError),
    Lobe(LobeError),
    EmptyLibrary(String),
}

impl From<MaterialError> for ExplorerError {
    fn from(err: MaterialError) -> Self {
        ExplorerError::Material(err)
    }
}

impl From<LobeError> for ExplorerError {
    fn from(err: LobeError) -> Self {
        ExplorerError::Lobe(err)
    }
}

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplorerError::Material(err) => write!(f, "{}", err),
            ExplorerError::Lobe(err) => write!(f, "{}", err),
            ExplorerError::EmptyLibrary(name) => write!(f, "library {} offers no material subtypes", name),
        }
    }
}

impl std::error::Error for ExplorerError {}

/// Editor range of a parameter.
pub fn parameter_range(name: &str) -> (Float, Float) {
    match name {
        "ior" => (0.0, 10.0),
        _ => (0.0, 1.0),
    }
}

fn clamp_param(param: &MaterialParam) -> MaterialParam {
    let (lo, hi) = parameter_range(&param.name);
    let arity = param.data_type().arity();
    let mut components = param.value.components();
    for c in components.iter_mut().take(arity) {
        *c = if c.is_nan() { lo } else { c.max(lo).min(hi) };
    }
    let value = ParamValue::from_components(&components[..arity]).unwrap_or(param.value);
    MaterialParam::new(param.name.clone(), value)
}

/// What changed since the lobe was last built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Updates {
    material: bool,
    light: bool,
    lobe: bool,
}

impl Updates {
    fn any(&self) -> bool {
        self.material || self.light || self.lobe
    }
}

/// The material being explored together with the light and the
/// visualization settings. The lobe mesh is rebuilt lazily.
pub struct Explorer {
    library: Box<dyn MaterialLibrary>,
    material: Box<dyn Material>,
    light: Light,
    lobe_settings: LobeSettings,
    sample_settings: SampleSettings,
    slice_settings: SliceSettings,
    updates: Updates,
    lobe: Option<LobeMesh>,
    rebuilds: usize,
}

impl Explorer {
    pub fn new(library: Box<dyn MaterialLibrary>, material: Box<dyn Material>) -> Self {
        log::info!("Exploring {} material from library {}.", material.subtype(), library.name());
        Self {
            library,
            material,
            light: Light::default(),
            lobe_settings: LobeSettings::default(),
            sample_settings: SampleSettings::default(),
            slice_settings: SliceSettings::default(),
            updates: Updates { material: true, light: true, lobe: true },
            lobe: None,
            rebuilds: 0,
        }
    }

    /// Creates a material of the library's first subtype, or of `subtype`
    /// when given.
    pub fn create_material(library: &dyn MaterialLibrary,
                           subtype: Option<&str>) -> Result<Box<dyn Material>, ExplorerError> {
        let subtype = match subtype {
            Some(subtype) => subtype.to_string(),
            None => library.supported_subtypes()
                .into_iter()
                .next()
                .ok_or_else(|| ExplorerError::EmptyLibrary(library.name()))?,
        };
        if !library.supports(&subtype) {
            return Err(ExplorerError::Material(MaterialError::UnknownSubtype(subtype)));
        }
        library.create_instance(&subtype)
            .ok_or(ExplorerError::Material(MaterialError::UnknownSubtype(subtype)))
    }

    pub fn library(&self) -> &dyn MaterialLibrary {
        self.library.as_ref()
    }

    pub fn material(&self) -> &dyn Material {
        self.material.as_ref()
    }

    pub fn subtype(&self) -> &str {
        self.material.subtype()
    }

    pub fn subtypes(&self) -> Vec<String> {
        self.library.supported_subtypes()
    }

    /// Current value of every parameter the selected subtype supports.
    pub fn parameters(&self) -> Vec<MaterialParam> {
        self.library
            .supported_params(self.material.subtype())
            .into_iter()
            .map(|default| self.material.get_parameter(&default.name).unwrap_or(default))
            .collect()
    }

    /// Returns whether the subtype actually changed.
    pub fn select_subtype(&mut self, subtype: &str) -> Result<bool, ExplorerError> {
        if subtype == self.material.subtype() {
            return Ok(false);
        }
        self.material.set_subtype(subtype)?;
        self.updates.material = true;
        log::info!("Selected subtype {}.", subtype);
        Ok(true)
    }

    /// Applies `param` clamped to its editor range and returns what was set.
    pub fn set_parameter(&mut self, param: &MaterialParam) -> Result<MaterialParam, ExplorerError> {
        let clamped = clamp_param(param);
        if clamped != *param {
            log::warn!("{} = [{}] is outside the editor range, using [{}].", param.name, param.value, clamped.value);
        }
        self.material.set_parameter(&clamped)?;
        self.updates.material = true;
        log::debug!("Set {} = [{}].", clamped.name, clamped.value);
        Ok(clamped)
    }

    pub fn light(&self) -> Light {
        self.light
    }

    pub fn set_light_dir(&mut self, direction: Vector3f) -> Result<(), ExplorerError> {
        let direction = direction.try_normalize(EPSILON).ok_or(LobeError::DegenerateLight)?;
        self.light.direction = direction;
        self.updates.light = true;
        self.updates.material = true;
        Ok(())
    }

    pub fn set_light_intensity(&mut self, intensity: Float) {
        self.light.intensity = intensity.max(0.0);
        self.updates.light = true;
    }

    pub fn lobe_settings(&self) -> LobeSettings {
        self.lobe_settings
    }

    pub fn set_lobe_settings(&mut self, settings: LobeSettings) {
        if settings != self.lobe_settings {
            self.lobe_settings = settings;
            self.updates.lobe = true;
        }
    }

    pub fn sample_settings(&self) -> SampleSettings {
        self.sample_settings
    }

    pub fn set_sample_settings(&mut self, settings: SampleSettings) {
        self.sample_settings = settings;
    }

    pub fn slice_settings(&self) -> SliceSettings {
        self.slice_settings
    }

    pub fn set_slice_settings(&mut self, settings: SliceSettings) {
        self.slice_settings = settings;
    }

    pub fn apply_settings(&mut self, settings: &ExplorerSettings) -> Result<(), ExplorerError> {
        if let Some(subtype) = &settings.subtype {
            self.select_subtype(subtype)?;
        }
        for param in &settings.params {
            self.set_parameter(param)?;
        }
        self.set_light_dir(settings.light.direction)?;
        self.set_light_intensity(settings.light.intensity);
        self.set_lobe_settings(settings.lobe);
        self.set_sample_settings(settings.samples);
        self.set_slice_settings(settings.slice);
        Ok(())
    }

    pub fn needs_rebuild(&self) -> bool {
        self.lobe.is_none() || self.updates.any()
    }

    /// Number of times the lobe mesh was built.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// The lobe for the current state, rebuilt only when something changed.
    pub fn lobe_mesh(&mut self) -> Result<&LobeMesh, ExplorerError> {
        if self.needs_rebuild() {
            let mesh = sample_lobe(self.material.as_ref(),
                                   self.light.direction,
                                   self.light.radiance(),
                                   &self.lobe_settings)?;
            self.rebuilds += 1;
            self.updates = Updates::default();
            self.lobe = Some(mesh);
        }
        match &self.lobe {
            Some(mesh) => Ok(mesh),
            None => Err(ExplorerError::Lobe(LobeError::TooFewSegments(self.lobe_settings.segments))),
        }
    }

    pub fn sample_points(&self) -> SampleCloud {
        sample_points(self.material.as_ref(), self.light.direction, &self.sample_settings)
    }

    pub fn render_slice(&self) -> Result<Bitmap, ExplorerError> {
        Ok(render_slice(self.material.as_ref(), self.light.direction, self.light.radiance(), &self.slice_settings)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::standard::{ StandardLibrary, MATTE, PBM };
    use crate::shapes::lobe_mesh::RadianceMetric;

    fn explorer() -> Explorer {
        let library = StandardLibrary;
        let material = Explorer::create_material(&library, None).unwrap();
        let mut explorer = Explorer::new(Box::new(library), material);
        explorer.set_lobe_settings(LobeSettings { segments: 12, metric: RadianceMetric::Green, show_progress: false });
        explorer
    }

    #[test]
    fn test_defaults() {
        let explorer = explorer();
        assert_eq!(explorer.subtype(), MATTE);
        assert_eq!(explorer.subtypes(), vec![MATTE.to_string(), PBM.to_string()]);
        assert_eq!(explorer.light(), Light::default());
        assert_eq!(explorer.parameters(), vec![MaterialParam::float3("color", Vector3f::new(1.0, 1.0, 1.0))]);
    }

    #[test]
    fn test_lobe_is_cached_until_state_changes() {
        let mut explorer = explorer();
        explorer.lobe_mesh().unwrap();
        explorer.lobe_mesh().unwrap();
        assert_eq!(explorer.rebuilds(), 1);

        assert_eq!(explorer.select_subtype(MATTE), Ok(false));
        explorer.lobe_mesh().unwrap();
        assert_eq!(explorer.rebuilds(), 1);

        assert_eq!(explorer.select_subtype(PBM), Ok(true));
        assert!(explorer.needs_rebuild());
        explorer.lobe_mesh().unwrap();
        assert_eq!(explorer.rebuilds(), 2);

        explorer.set_light_dir(Vector3f::new(0.0, 1.0, 0.0)).unwrap();
        let count = explorer.lobe_mesh().unwrap().vertex_count();
        assert_eq!(count, 11 * 12);
        assert_eq!(explorer.rebuilds(), 3);
    }

    #[test]
    fn test_parameters_are_clamped_to_editor_range() {
        let mut explorer = explorer();
        explorer.select_subtype(PBM).unwrap();
        let set = explorer.set_parameter(&MaterialParam::float("roughness", 1.5)).unwrap();
        assert_eq!(set, MaterialParam::float("roughness", 1.0));
        let set = explorer.set_parameter(&MaterialParam::float("ior", 12.0)).unwrap();
        assert_eq!(set, MaterialParam::float("ior", 10.0));
        let set = explorer.set_parameter(&MaterialParam::float3("baseColor", Vector3f::new(-1.0, 0.5, 2.0))).unwrap();
        assert_eq!(set.value.as_float3(), Some(Vector3f::new(0.0, 0.5, 1.0)));
        assert_eq!(explorer.material().get_parameter("ior"), Some(MaterialParam::float("ior", 10.0)));
    }

    #[test]
    fn test_errors_leave_state_unchanged() {
        let mut explorer = explorer();
        explorer.lobe_mesh().unwrap();
        assert!(explorer.select_subtype("Velvet").is_err());
        assert!(explorer.set_parameter(&MaterialParam::float("metallic", 0.5)).is_err());
        assert_eq!(explorer.set_light_dir(Vector3f::zeros()), Err(ExplorerError::Lobe(LobeError::DegenerateLight)));
        assert_eq!(explorer.subtype(), MATTE);
        assert!(!explorer.needs_rebuild());
    }

    #[test]
    fn test_unknown_initial_subtype() {
        let err = Explorer::create_material(&StandardLibrary, Some("Velvet")).err();
        assert_eq!(err, Some(ExplorerError::Material(MaterialError::UnknownSubtype("Velvet".to_string()))));
    }

    // Lists only Matte but builds whatever it is asked for.
    struct MatteOnly;

    impl MaterialLibrary for MatteOnly {
        fn name(&self) -> String {
            String::from("matte-only")
        }

        fn supported_subtypes(&self) -> Vec<String> {
            vec![MATTE.to_string()]
        }

        fn supported_params(&self, subtype: &str) -> Vec<MaterialParam> {
            StandardLibrary.supported_params(subtype)
        }

        fn create_instance(&self, subtype: &str) -> Option<Box<dyn Material>> {
            StandardLibrary.create_instance(subtype)
        }
    }

    #[test]
    fn test_initial_subtype_must_be_listed() {
        assert_eq!(Explorer::create_material(&MatteOnly, None).unwrap().subtype(), MATTE);
        let err = Explorer::create_material(&MatteOnly, Some(PBM)).err();
        assert_eq!(err, Some(ExplorerError::Material(MaterialError::UnknownSubtype(PBM.to_string()))));
    }
}
