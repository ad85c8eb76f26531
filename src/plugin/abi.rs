// Copyright @yucwang 2026

//! C ABI shared by material plugins and the host.
//!
//! A plugin exports four symbols:
//!
//! * `brdf_plugin_abi_version() -> u32`
//! * `create_material_instance(subtype, out) -> status`
//! * `query_supported_subtypes(callback, user)`
//! * `query_supported_params(subtype, callback, user)`
//!
//! Material instances cross the boundary as a [`RawMaterial`]: an opaque
//! pointer plus a [`RawMaterialVTable`]. Strings are NUL-terminated UTF-8 and
//! are only borrowed for the duration of a call, which is why listings are
//! reported through callbacks instead of returned.
//!
//! Use [`export_material_plugin!`](crate::export_material_plugin) to generate
//! the entry points for a [`MaterialLibrary`].

use std::ffi::{ CStr, CString };
use std::os::raw::{ c_char, c_void };
use std::panic::{ self, AssertUnwindSafe };

use crate::core::library::MaterialLibrary;
use crate::core::material::{ DataType, Material, MaterialError, MaterialParam, ParamValue };
use crate::math::constants::Vector3f;
use crate::math::spectrum::RGBSpectrum;

pub const PLUGIN_ABI_VERSION: u32 = 1;

pub const ABI_VERSION_SYMBOL: &str = "brdf_plugin_abi_version";
pub const CREATE_INSTANCE_SYMBOL: &str = "create_material_instance";
pub const QUERY_SUBTYPES_SYMBOL: &str = "query_supported_subtypes";
pub const QUERY_PARAMS_SYMBOL: &str = "query_supported_params";

pub const STATUS_OK: i32 = 0;
pub const STATUS_UNKNOWN_SUBTYPE: i32 = 1;
pub const STATUS_UNKNOWN_PARAMETER: i32 = 2;
pub const STATUS_TYPE_MISMATCH: i32 = 3;
pub const STATUS_INVALID_ARGUMENT: i32 = 4;
pub const STATUS_PANIC: i32 = 5;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vector3f> for RawVec3 {
    fn from(v: Vector3f) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<RawVec3> for Vector3f {
    fn from(v: RawVec3) -> Self {
        Vector3f::new(v.x, v.y, v.z)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawEvalInput {
    pub ng: RawVec3,
    pub ns: RawVec3,
    pub view_dir: RawVec3,
    pub light_dir: RawVec3,
    pub light_intensity: RawVec3,
}

/// `data_type` is the component count (1 to 4).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawParamValue {
    pub data_type: u32,
    pub components: [f32; 4],
}

impl From<ParamValue> for RawParamValue {
    fn from(value: ParamValue) -> Self {
        Self {
            data_type: value.data_type().arity() as u32,
            components: value.components(),
        }
    }
}

impl RawParamValue {
    pub fn to_value(&self) -> Option<ParamValue> {
        let arity = DataType::from_arity(self.data_type as usize)?.arity();
        ParamValue::from_components(&self.components[..arity])
    }
}

pub type NameCallback = unsafe extern "C" fn(user: *mut c_void, name: *const c_char);
pub type ParamCallback =
    unsafe extern "C" fn(user: *mut c_void, name: *const c_char, value: *const RawParamValue);

#[repr(C)]
pub struct RawMaterialVTable {
    pub destroy: unsafe extern "C" fn(instance: *mut c_void),
    pub eval: unsafe extern "C" fn(instance: *const c_void, input: *const RawEvalInput, out: *mut RawVec3) -> i32,
    pub subtype: unsafe extern "C" fn(instance: *const c_void, callback: NameCallback, user: *mut c_void),
    pub set_subtype: unsafe extern "C" fn(instance: *mut c_void, subtype: *const c_char) -> i32,
    pub set_parameter: unsafe extern "C" fn(instance: *mut c_void, name: *const c_char, value: *const RawParamValue) -> i32,
    pub get_parameter: unsafe extern "C" fn(instance: *const c_void, name: *const c_char, out: *mut RawParamValue) -> i32,
}

#[repr(C)]
pub struct RawMaterial {
    pub instance: *mut c_void,
    pub vtable: *const RawMaterialVTable,
}

impl Default for RawMaterial {
    fn default() -> Self {
        Self { instance: std::ptr::null_mut(), vtable: std::ptr::null() }
    }
}

pub type AbiVersionFn = unsafe extern "C" fn() -> u32;
pub type CreateInstanceFn = unsafe extern "C" fn(subtype: *const c_char, out: *mut RawMaterial) -> i32;
pub type QuerySubtypesFn = unsafe extern "C" fn(callback: NameCallback, user: *mut c_void);
pub type QueryParamsFn = unsafe extern "C" fn(subtype: *const c_char, callback: ParamCallback, user: *mut c_void);

/// Borrowed view of a C string; `None` for null or non UTF-8 input.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub unsafe fn str_from_ptr<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

pub fn status_from_error(error: &MaterialError) -> i32 {
    match error {
        MaterialError::UnknownSubtype(_) => STATUS_UNKNOWN_SUBTYPE,
        MaterialError::UnknownParameter { .. } => STATUS_UNKNOWN_PARAMETER,
        MaterialError::TypeMismatch { .. } => STATUS_TYPE_MISMATCH,
        MaterialError::Backend(_) => STATUS_INVALID_ARGUMENT,
    }
}

fn ffi_guard<F: FnOnce() -> i32>(f: F) -> i32 {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or(STATUS_PANIC)
}

// Plugin side. An exported instance is a `Box<Box<dyn Material>>` turned
// into a thin pointer.

type ExportedInstance = Box<dyn Material>;

static EXPORTED_VTABLE: RawMaterialVTable = RawMaterialVTable {
    destroy: exported_destroy,
    eval: exported_eval,
    subtype: exported_subtype,
    set_subtype: exported_set_subtype,
    set_parameter: exported_set_parameter,
    get_parameter: exported_get_parameter,
};

unsafe extern "C" fn exported_destroy(instance: *mut c_void) {
    if instance.is_null() {
        return;
    }
    let boxed = Box::from_raw(instance as *mut ExportedInstance);
    let _ = panic::catch_unwind(AssertUnwindSafe(move || drop(boxed)));
}

unsafe extern "C" fn exported_eval(instance: *const c_void,
                                   input: *const RawEvalInput,
                                   out: *mut RawVec3) -> i32 {
    if instance.is_null() || input.is_null() || out.is_null() {
        return STATUS_INVALID_ARGUMENT;
    }
    ffi_guard(|| {
        let material = &*(instance as *const ExportedInstance);
        let input = &*input;
        let value = material.eval(input.ng.into(),
                                  input.ns.into(),
                                  input.view_dir.into(),
                                  input.light_dir.into(),
                                  RGBSpectrum::from_vector(input.light_intensity.into()));
        *out = value.to_vector().into();
        STATUS_OK
    })
}

unsafe extern "C" fn exported_subtype(instance: *const c_void, callback: NameCallback, user: *mut c_void) {
    if instance.is_null() {
        return;
    }
    ffi_guard(|| {
        let material = &*(instance as *const ExportedInstance);
        if let Ok(name) = CString::new(material.subtype()) {
            callback(user, name.as_ptr());
        }
        STATUS_OK
    });
}

unsafe extern "C" fn exported_set_subtype(instance: *mut c_void, subtype: *const c_char) -> i32 {
    if instance.is_null() {
        return STATUS_INVALID_ARGUMENT;
    }
    let subtype = match str_from_ptr(subtype) {
        Some(subtype) => subtype,
        None => return STATUS_INVALID_ARGUMENT,
    };
    ffi_guard(|| {
        let material = &mut *(instance as *mut ExportedInstance);
        match material.set_subtype(subtype) {
            Ok(()) => STATUS_OK,
            Err(e) => status_from_error(&e),
        }
    })
}

unsafe extern "C" fn exported_set_parameter(instance: *mut c_void,
                                            name: *const c_char,
                                            value: *const RawParamValue) -> i32 {
    if instance.is_null() || value.is_null() {
        return STATUS_INVALID_ARGUMENT;
    }
    let (name, value) = match (str_from_ptr(name), (*value).to_value()) {
        (Some(name), Some(value)) => (name, value),
        _ => return STATUS_INVALID_ARGUMENT,
    };
    ffi_guard(|| {
        let material = &mut *(instance as *mut ExportedInstance);
        match material.set_parameter(&MaterialParam::new(name, value)) {
            Ok(()) => STATUS_OK,
            Err(e) => status_from_error(&e),
        }
    })
}

unsafe extern "C" fn exported_get_parameter(instance: *const c_void,
                                            name: *const c_char,
                                            out: *mut RawParamValue) -> i32 {
    if instance.is_null() || out.is_null() {
        return STATUS_INVALID_ARGUMENT;
    }
    let name = match str_from_ptr(name) {
        Some(name) => name,
        None => return STATUS_INVALID_ARGUMENT,
    };
    ffi_guard(|| {
        let material = &*(instance as *const ExportedInstance);
        match material.get_parameter(name) {
            Some(param) => {
                *out = param.value.into();
                STATUS_OK
            }
            None => STATUS_UNKNOWN_PARAMETER,
        }
    })
}

/// Body of the exported `create_material_instance`.
///
/// # Safety
/// `subtype` must be a valid C string and `out` must point to writable memory.
pub unsafe fn export_create_instance<L: MaterialLibrary + Default>(subtype: *const c_char,
                                                                   out: *mut RawMaterial) -> i32 {
    if out.is_null() {
        return STATUS_INVALID_ARGUMENT;
    }
    let subtype = match str_from_ptr(subtype) {
        Some(subtype) => subtype,
        None => return STATUS_INVALID_ARGUMENT,
    };
    ffi_guard(|| {
        match L::default().create_instance(subtype) {
            Some(material) => {
                let instance: Box<ExportedInstance> = Box::new(material);
                *out = RawMaterial {
                    instance: Box::into_raw(instance) as *mut c_void,
                    vtable: &EXPORTED_VTABLE,
                };
                STATUS_OK
            }
            None => STATUS_UNKNOWN_SUBTYPE,
        }
    })
}

/// Body of the exported `query_supported_subtypes`.
///
/// # Safety
/// `callback` must be safe to call with `user`.
pub unsafe fn export_supported_subtypes<L: MaterialLibrary + Default>(callback: NameCallback,
                                                                      user: *mut c_void) {
    ffi_guard(|| {
        for subtype in L::default().supported_subtypes() {
            if let Ok(name) = CString::new(subtype) {
                callback(user, name.as_ptr());
            }
        }
        STATUS_OK
    });
}

/// Body of the exported `query_supported_params`.
///
/// # Safety
/// `subtype` must be a valid C string and `callback` must be safe to call
/// with `user`.
pub unsafe fn export_supported_params<L: MaterialLibrary + Default>(subtype: *const c_char,
                                                                    callback: ParamCallback,
                                                                    user: *mut c_void) {
    let subtype = match str_from_ptr(subtype) {
        Some(subtype) => subtype,
        None => return,
    };
    ffi_guard(|| {
        for param in L::default().supported_params(subtype) {
            if let Ok(name) = CString::new(param.name) {
                let value = RawParamValue::from(param.value);
                callback(user, name.as_ptr(), &value);
            }
        }
        STATUS_OK
    });
}

/// Generates the plugin entry points for a `MaterialLibrary + Default`.
#[macro_export]
macro_rules! export_material_plugin {
    ($library:ty) => {
        #[no_mangle]
        pub extern "C" fn brdf_plugin_abi_version() -> u32 {
            $crate::plugin::abi::PLUGIN_ABI_VERSION
        }

        #[no_mangle]
        pub unsafe extern "C" fn create_material_instance(
            subtype: *const ::std::os::raw::c_char,
            out: *mut $crate::plugin::abi::RawMaterial,
        ) -> i32 {
            $crate::plugin::abi::export_create_instance::<$library>(subtype, out)
        }

        #[no_mangle]
        pub unsafe extern "C" fn query_supported_subtypes(
            callback: $crate::plugin::abi::NameCallback,
            user: *mut ::std::os::raw::c_void,
        ) {
            $crate::plugin::abi::export_supported_subtypes::<$library>(callback, user)
        }

        #[no_mangle]
        pub unsafe extern "C" fn query_supported_params(
            subtype: *const ::std::os::raw::c_char,
            callback: $crate::plugin::abi::ParamCallback,
            user: *mut ::std::os::raw::c_void,
        ) {
            $crate::plugin::abi::export_supported_params::<$library>(subtype, callback, user)
        }
    };
}

// Host side callbacks.

/// Appends each reported name to the `Vec<String>` behind `user`.
pub unsafe extern "C" fn collect_names(user: *mut c_void, name: *const c_char) {
    if user.is_null() {
        return;
    }
    let names = &mut *(user as *mut Vec<String>);
    if let Some(name) = str_from_ptr(name) {
        names.push(name.to_string());
    }
}

/// Appends each reported parameter to the `Vec<MaterialParam>` behind `user`.
pub unsafe extern "C" fn collect_params(user: *mut c_void, name: *const c_char, value: *const RawParamValue) {
    if user.is_null() || value.is_null() {
        return;
    }
    let params = &mut *(user as *mut Vec<MaterialParam>);
    match (str_from_ptr(name), (*value).to_value()) {
        (Some(name), Some(value)) => params.push(MaterialParam::new(name, value)),
        _ => log::warn!("plugin reported a malformed parameter"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_param_value_conversion() {
        let value = ParamValue::Float3(Vector3f::new(0.5, 0.25, 1.0));
        let raw = RawParamValue::from(value);
        assert_eq!(raw.data_type, 3);
        assert_eq!(raw.to_value(), Some(value));

        let bogus = RawParamValue { data_type: 7, components: [0.0; 4] };
        assert_eq!(bogus.to_value(), None);
    }

    #[test]
    fn test_str_from_ptr_rejects_null() {
        assert_eq!(unsafe { str_from_ptr(std::ptr::null()) }, None);
        let s = CString::new("PBM").unwrap();
        assert_eq!(unsafe { str_from_ptr(s.as_ptr()) }, Some("PBM"));
    }

    #[test]
    fn test_status_codes_for_errors() {
        assert_eq!(status_from_error(&MaterialError::UnknownSubtype("x".into())), STATUS_UNKNOWN_SUBTYPE);
        assert_eq!(status_from_error(&MaterialError::TypeMismatch {
            name: "color".into(), expected: DataType::Float3, found: DataType::Float,
        }), STATUS_TYPE_MISMATCH);
    }
}
