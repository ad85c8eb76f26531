// Copyright @yucwang 2026

use std::ffi::CString;
use std::os::raw::c_void;
use std::rc::Rc;

use crate::core::library::MaterialLibrary;
use crate::core::material::{ Material, MaterialError, MaterialParam };
use crate::math::constants::Vector3f;
use crate::math::spectrum::RGBSpectrum;
use crate::plugin::abi::{
    self, AbiVersionFn, CreateInstanceFn, QueryParamsFn, QuerySubtypesFn, RawEvalInput,
    RawMaterial, RawParamValue, RawVec3, PLUGIN_ABI_VERSION,
};
use crate::plugin::loader::{ load_plugin, Plugin, PluginError };

/// Entry points resolved from a plugin. A missing entry point degrades the
/// matching query to an empty result.
#[derive(Clone, Copy, Default)]
pub struct PluginApi {
    create_instance: Option<CreateInstanceFn>,
    query_subtypes: Option<QuerySubtypesFn>,
    query_params: Option<QueryParamsFn>,
}

impl PluginApi {
    /// Resolves the entry points of a loaded library and checks its ABI
    /// version when it reports one.
    pub fn resolve(plugin: &Plugin) -> Result<Self, PluginError> {
        unsafe {
            let version = plugin.symbol::<AbiVersionFn>(abi::ABI_VERSION_SYMBOL).map(|version| version());
            check_abi_version(plugin.name(), version)?;

            Ok(Self {
                create_instance: plugin.symbol::<CreateInstanceFn>(abi::CREATE_INSTANCE_SYMBOL).map(|s| *s),
                query_subtypes: plugin.symbol::<QuerySubtypesFn>(abi::QUERY_SUBTYPES_SYMBOL).map(|s| *s),
                query_params: plugin.symbol::<QueryParamsFn>(abi::QUERY_PARAMS_SYMBOL).map(|s| *s),
            })
        }
    }

    /// The entry points this crate exports itself.
    pub fn in_process() -> Self {
        Self {
            create_instance: Some(crate::create_material_instance),
            query_subtypes: Some(crate::query_supported_subtypes),
            query_params: Some(crate::query_supported_params),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.create_instance.is_some() && self.query_subtypes.is_some() && self.query_params.is_some()
    }
}

/// A reported version must match ours; a library reporting none is assumed
/// to speak the current one.
pub fn check_abi_version(name: &str, found: Option<u32>) -> Result<(), PluginError> {
    match found {
        Some(found) if found != PLUGIN_ABI_VERSION => Err(PluginError::Abi {
            name: name.to_string(),
            expected: PLUGIN_ABI_VERSION,
            found: Some(found),
        }),
        Some(_) => Ok(()),
        None => {
            log::warn!("{} does not report a plugin ABI version, assuming {}.", name, PLUGIN_ABI_VERSION);
            Ok(())
        }
    }
}

/// A [`MaterialLibrary`] backed by the C ABI of a plugin.
pub struct PluginLibrary {
    name: String,
    api: PluginApi,
    plugin: Option<Rc<Plugin>>,
}

impl PluginLibrary {
    pub fn load(name: &str) -> Result<Self, PluginError> {
        let plugin = load_plugin(name)?;
        Self::from_plugin(plugin)
    }

    pub fn from_plugin(plugin: Plugin) -> Result<Self, PluginError> {
        let api = PluginApi::resolve(&plugin)?;
        if !api.is_complete() {
            log::warn!("{} is missing plugin entry points, some queries will be empty.", plugin.name());
        }
        Ok(Self {
            name: plugin.name().to_string(),
            api,
            plugin: Some(Rc::new(plugin)),
        })
    }

    pub fn in_process() -> Self {
        Self {
            name: String::from("in-process"),
            api: PluginApi::in_process(),
            plugin: None,
        }
    }

    /// Unloads the library. Fails softly when material instances still hold
    /// on to it; the library is then unloaded with the last instance.
    pub fn release(self) -> Result<(), PluginError> {
        match self.plugin {
            Some(plugin) => match Rc::try_unwrap(plugin) {
                Ok(plugin) => plugin.release(),
                Err(plugin) => {
                    log::warn!("{} is still referenced by {} material(s), deferring unload.",
                               self.name, Rc::strong_count(&plugin) - 1);
                    Ok(())
                }
            },
            None => Ok(()),
        }
    }
}

impl MaterialLibrary for PluginLibrary {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn supported_subtypes(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        if let Some(query) = self.api.query_subtypes {
            unsafe { query(abi::collect_names, &mut names as *mut Vec<String> as *mut c_void) };
        }
        names
    }

    fn supported_params(&self, subtype: &str) -> Vec<MaterialParam> {
        let mut params: Vec<MaterialParam> = Vec::new();
        let (query, subtype) = match (self.api.query_params, CString::new(subtype)) {
            (Some(query), Ok(subtype)) => (query, subtype),
            _ => return params,
        };
        unsafe {
            query(subtype.as_ptr(), abi::collect_params, &mut params as *mut Vec<MaterialParam> as *mut c_void)
        };
        params
    }

    fn create_instance(&self, subtype: &str) -> Option<Box<dyn Material>> {
        let create = self.api.create_instance?;
        let c_subtype = CString::new(subtype).ok()?;
        let mut raw = RawMaterial::default();
        let status = unsafe { create(c_subtype.as_ptr(), &mut raw) };
        if status != abi::STATUS_OK || raw.instance.is_null() || raw.vtable.is_null() {
            log::warn!("{} could not create a {} material (status {}).", self.name, subtype, status);
            return None;
        }

        let mut material = PluginMaterial { raw, subtype: String::new(), _plugin: self.plugin.clone() };
        material.refresh_subtype();
        Some(Box::new(material))
    }
}

/// A material instance living inside a plugin.
pub struct PluginMaterial {
    raw: RawMaterial,
    subtype: String,
    // Keeps the library mapped for as long as the instance exists.
    _plugin: Option<Rc<Plugin>>,
}

impl PluginMaterial {
    fn vtable(&self) -> &abi::RawMaterialVTable {
        unsafe { &*self.raw.vtable }
    }

    fn refresh_subtype(&mut self) {
        let mut names: Vec<String> = Vec::new();
        unsafe {
            (self.vtable().subtype)(self.raw.instance,
                                    abi::collect_names,
                                    &mut names as *mut Vec<String> as *mut c_void)
        };
        self.subtype = names.pop().unwrap_or_default();
    }

    fn error_from_status(&self, status: i32, name: &str, value: Option<&RawParamValue>) -> MaterialError {
        match status {
            abi::STATUS_UNKNOWN_SUBTYPE => MaterialError::UnknownSubtype(name.to_string()),
            abi::STATUS_UNKNOWN_PARAMETER => MaterialError::UnknownParameter {
                subtype: self.subtype.clone(),
                name: name.to_string(),
            },
            abi::STATUS_TYPE_MISMATCH => {
                let found = value.and_then(|v| v.to_value()).map(|v| v.data_type());
                let expected = self.get_parameter(name).map(|p| p.data_type());
                match (expected, found) {
                    (Some(expected), Some(found)) => MaterialError::TypeMismatch {
                        name: name.to_string(),
                        expected,
                        found,
                    },
                    _ => MaterialError::Backend(format!("type mismatch for {}", name)),
                }
            }
            abi::STATUS_PANIC => MaterialError::Backend(String::from("plugin panicked")),
            other => MaterialError::Backend(format!("plugin returned status {}", other)),
        }
    }
}

impl Material for PluginMaterial {
    fn name(&self) -> &'static str {
        "PluginMaterial"
    }

    fn subtype(&self) -> &str {
        &self.subtype
    }

    fn eval(&self,
            ng: Vector3f,
            ns: Vector3f,
            view_dir: Vector3f,
            light_dir: Vector3f,
            light_intensity: RGBSpectrum) -> RGBSpectrum {
        let input = RawEvalInput {
            ng: ng.into(),
            ns: ns.into(),
            view_dir: view_dir.into(),
            light_dir: light_dir.into(),
            light_intensity: light_intensity.to_vector().into(),
        };
        let mut out = RawVec3::default();
        let status = unsafe { (self.vtable().eval)(self.raw.instance, &input, &mut out) };
        if status != abi::STATUS_OK {
            log::warn!("plugin eval failed with status {}", status);
            return RGBSpectrum::default();
        }
        RGBSpectrum::from_vector(out.into())
    }

    fn set_subtype(&mut self, subtype: &str) -> Result<(), MaterialError> {
        let c_subtype = CString::new(subtype)
            .map_err(|_| MaterialError::UnknownSubtype(subtype.to_string()))?;
        let status = unsafe { (self.vtable().set_subtype)(self.raw.instance, c_subtype.as_ptr()) };
        if status != abi::STATUS_OK {
            return Err(self.error_from_status(status, subtype, None));
        }
        self.refresh_subtype();
        Ok(())
    }

    fn set_parameter(&mut self, param: &MaterialParam) -> Result<(), MaterialError> {
        let unknown = || MaterialError::UnknownParameter {
            subtype: self.subtype.clone(),
            name: param.name.clone(),
        };
        let c_name = CString::new(param.name.as_str()).map_err(|_| unknown())?;
        let value = RawParamValue::from(param.value);
        let status = unsafe { (self.vtable().set_parameter)(self.raw.instance, c_name.as_ptr(), &value) };
        if status != abi::STATUS_OK {
            return Err(self.error_from_status(status, &param.name, Some(&value)));
        }
        Ok(())
    }

    fn get_parameter(&self, name: &str) -> Option<MaterialParam> {
        let c_name = CString::new(name).ok()?;
        let mut out = RawParamValue::default();
        let status = unsafe { (self.vtable().get_parameter)(self.raw.instance, c_name.as_ptr(), &mut out) };
        if status != abi::STATUS_OK {
            return None;
        }
        out.to_value().map(|value| MaterialParam::new(name, value))
    }
}

impl Drop for PluginMaterial {
    fn drop(&mut self) {
        unsafe { (self.vtable().destroy)(self.raw.instance) };
        self.raw.instance = std::ptr::null_mut();
    }
}
