// Copyright @yucwang 2026

use std::fmt;

use crate::math::constants::{ Float, Vector2f, Vector3f, Vector4f };
use crate::math::spectrum::RGBSpectrum;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Float,
    Float2,
    Float3,
    Float4,
}

impl DataType {
    pub fn arity(&self) -> usize {
        match self {
            DataType::Float => 1,
            DataType::Float2 => 2,
            DataType::Float3 => 3,
            DataType::Float4 => 4,
        }
    }

    pub fn from_arity(arity: usize) -> Option<Self> {
        match arity {
            1 => Some(DataType::Float),
            2 => Some(DataType::Float2),
            3 => Some(DataType::Float3),
            4 => Some(DataType::Float4),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Float => "float",
            DataType::Float2 => "float2",
            DataType::Float3 => "float3",
            DataType::Float4 => "float4",
        };
        write!(f, "{}", name)
    }
}

/// Parameter payload. The variant is the parameter's type, so a value can
/// never disagree with its tag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Float(Float),
    Float2(Vector2f),
    Float3(Vector3f),
    Float4(Vector4f),
}

impl ParamValue {
    pub fn data_type(&self) -> DataType {
        match self {
            ParamValue::Float(_) => DataType::Float,
            ParamValue::Float2(_) => DataType::Float2,
            ParamValue::Float3(_) => DataType::Float3,
            ParamValue::Float4(_) => DataType::Float4,
        }
    }

    /// Builds a value from its components; the component count picks the type.
    pub fn from_components(values: &[Float]) -> Option<Self> {
        match values {
            [x] => Some(ParamValue::Float(*x)),
            [x, y] => Some(ParamValue::Float2(Vector2f::new(*x, *y))),
            [x, y, z] => Some(ParamValue::Float3(Vector3f::new(*x, *y, *z))),
            [x, y, z, w] => Some(ParamValue::Float4(Vector4f::new(*x, *y, *z, *w))),
            _ => None,
        }
    }

    pub fn components(&self) -> [Float; 4] {
        match self {
            ParamValue::Float(v) => [*v, 0.0, 0.0, 0.0],
            ParamValue::Float2(v) => [v.x, v.y, 0.0, 0.0],
            ParamValue::Float3(v) => [v.x, v.y, v.z, 0.0],
            ParamValue::Float4(v) => [v.x, v.y, v.z, v.w],
        }
    }

    pub fn as_float(&self) -> Option<Float> {
        match self {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float3(&self) -> Option<Vector3f> {
        match self {
            ParamValue::Float3(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let components = self.components();
        let used = &components[..self.data_type().arity()];
        let parts: Vec<String> = used.iter().map(|c| format!("{}", c)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialParam {
    pub name: String,
    pub value: ParamValue,
}

impl MaterialParam {
    pub fn new<S: Into<String>>(name: S, value: ParamValue) -> Self {
        Self { name: name.into(), value }
    }

    pub fn float<S: Into<String>>(name: S, value: Float) -> Self {
        Self::new(name, ParamValue::Float(value))
    }

    pub fn float3<S: Into<String>>(name: S, value: Vector3f) -> Self {
        Self::new(name, ParamValue::Float3(value))
    }

    pub fn data_type(&self) -> DataType {
        self.value.data_type()
    }
}

/// Importance-sampled incident direction, in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialSample {
    pub direction: Vector3f,
    pub pdf: Float,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialError {
    UnknownSubtype(String),
    UnknownParameter { subtype: String, name: String },
    TypeMismatch { name: String, expected: DataType, found: DataType },
    Backend(String),
}

impl fmt::Display for MaterialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialError::UnknownSubtype(name) => write!(f, "unknown material subtype: {}", name),
            MaterialError::UnknownParameter { subtype, name } =>
                write!(f, "subtype {} has no parameter named {}", subtype, name),
            MaterialError::TypeMismatch { name, expected, found } =>
                write!(f, "parameter {} expects {}, got {}", name, expected, found),
            MaterialError::Backend(msg) => write!(f, "material backend error: {}", msg),
        }
    }
}

impl std::error::Error for MaterialError {}

pub trait Material {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn subtype(&self) -> &str;

    /// Reflected radiance toward `view_dir` for a light arriving from
    /// `light_dir` with the given intensity.
    fn eval(&self,
            ng: Vector3f,
            ns: Vector3f,
            view_dir: Vector3f,
            light_dir: Vector3f,
            light_intensity: RGBSpectrum) -> RGBSpectrum;

    /// Switches the shading model; every parameter is reset to the new
    /// subtype's default.
    fn set_subtype(&mut self, subtype: &str) -> Result<(), MaterialError>;

    fn set_parameter(&mut self, param: &MaterialParam) -> Result<(), MaterialError>;

    fn get_parameter(&self, name: &str) -> Option<MaterialParam>;

    /// Draws a scattered direction for light arriving from `wi`. `u` must lie
    /// in `[0, 1)^3`; the first component picks a lobe.
    fn sample(&self,
              _ng: Vector3f,
              _ns: Vector3f,
              _wi: Vector3f,
              _u: Vector3f) -> Option<MaterialSample> {
        None
    }
}

impl<M: Material + ?Sized> Material for Box<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn subtype(&self) -> &str {
        (**self).subtype()
    }

    fn eval(&self,
            ng: Vector3f,
            ns: Vector3f,
            view_dir: Vector3f,
            light_dir: Vector3f,
            light_intensity: RGBSpectrum) -> RGBSpectrum {
        (**self).eval(ng, ns, view_dir, light_dir, light_intensity)
    }

    fn set_subtype(&mut self, subtype: &str) -> Result<(), MaterialError> {
        (**self).set_subtype(subtype)
    }

    fn set_parameter(&mut self, param: &MaterialParam) -> Result<(), MaterialError> {
        (**self).set_parameter(param)
    }

    fn get_parameter(&self, name: &str) -> Option<MaterialParam> {
        (**self).get_parameter(name)
    }

    fn sample(&self, ng: Vector3f, ns: Vector3f, wi: Vector3f, u: Vector3f) -> Option<MaterialSample> {
        (**self).sample(ng, ns, wi, u)
    }
}
