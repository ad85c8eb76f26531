// Copyright @yucwang 2026

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use quick_xml::events::{ BytesStart, Event };
use quick_xml::Reader;

use crate::core::explorer::Light;
use crate::core::material::{ MaterialParam, ParamValue };
use crate::math::constants::{ Float, Vector3f };
use crate::renderers::slice::SliceSettings;
use crate::shapes::lobe_mesh::{ LobeSettings, RadianceMetric };
use crate::shapes::sample_points::SampleSettings;

pub const DEFAULT_LAYOUT_FILE: &str = "brdf_explorer.xml";

/// Settings written next to the working directory on first start.
pub const DEFAULT_LAYOUT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<explorer>
    <light direction="1, 1, 0" intensity="1"/>
    <lobe segments="400" metric="green"/>
    <samples count="1560" seed="0"/>
    <slice width="256" height="64"/>
</explorer>
"#;

#[derive(Debug)]
pub enum SettingsLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
}

impl From<std::io::Error> for SettingsLoadError {
    fn from(err: std::io::Error) -> Self {
        SettingsLoadError::Io(err)
    }
}

impl fmt::Display for SettingsLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsLoadError::Io(err) => write!(f, "io error: {}", err),
            SettingsLoadError::Parse(msg) => write!(f, "parse error: {}", msg),
            SettingsLoadError::MissingField(field) => write!(f, "missing field: {}", field),
        }
    }
}

impl std::error::Error for SettingsLoadError {}

#[derive(Clone, Debug, PartialEq)]
pub struct ExplorerSettings {
    pub subtype: Option<String>,
    pub params: Vec<MaterialParam>,
    pub light: Light,
    pub lobe: LobeSettings,
    pub samples: SampleSettings,
    pub slice: SliceSettings,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            subtype: None,
            params: Vec::new(),
            light: Light::default(),
            lobe: LobeSettings::default(),
            samples: SampleSettings::default(),
            slice: SliceSettings::default(),
        }
    }
}

/// Writes [`DEFAULT_LAYOUT`] into `dir` unless a layout file already
/// exists. Returns whether a file was written.
pub fn write_default_layout<P: AsRef<Path>>(dir: P) -> io::Result<bool> {
    let path = dir.as_ref().join(DEFAULT_LAYOUT_FILE);
    if path.exists() {
        return Ok(false);
    }
    fs::write(&path, DEFAULT_LAYOUT)?;
    log::info!("Wrote default layout to: {}.", path.display());
    Ok(true)
}

pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<ExplorerSettings, SettingsLoadError> {
    let path = path.as_ref();
    log::info!("Loading settings from: {}.", path.display());
    let xml = fs::read_to_string(path)?;
    parse_settings(&xml)
}

/// Settings from an explicit file, or else from the default layout in
/// `dir`, which is created first when missing. The default layout is not
/// touched when a file is given or `use_default_layout` is off.
pub fn load_base_settings<P: AsRef<Path>>(dir: P,
                                          use_default_layout: bool,
                                          config: Option<&Path>) -> Result<ExplorerSettings, SettingsLoadError> {
    if let Some(config) = config {
        return load_settings(config);
    }
    if !use_default_layout {
        return Ok(ExplorerSettings::default());
    }

    let dir = dir.as_ref();
    if let Err(e) = write_default_layout(dir) {
        log::warn!("Could not write {}: {}.", DEFAULT_LAYOUT_FILE, e);
    }
    let layout = dir.join(DEFAULT_LAYOUT_FILE);
    if layout.exists() {
        load_settings(layout)
    } else {
        Ok(ExplorerSettings::default())
    }
}

pub fn parse_settings(xml: &str) -> Result<ExplorerSettings, SettingsLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut state = ParseState::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => state.start_element(&e, true)?,
            Ok(Event::Empty(e)) => state.start_element(&e, false)?,
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"material" => state.in_material = false,
                    b"explorer" => state.in_explorer = false,
                    _ => {}
                }
            }
            Err(e) => {
                return Err(SettingsLoadError::Parse(e.to_string()));
            }
            _ => {}
        }

        buf.clear();
    }

    Ok(state.settings)
}

#[derive(Default)]
struct ParseState {
    settings: ExplorerSettings,
    in_explorer: bool,
    in_material: bool,
}

impl ParseState {
    fn start_element(&mut self, e: &BytesStart<'_>, has_body: bool) -> Result<(), SettingsLoadError> {
        let settings = &mut self.settings;
        match e.name().as_ref() {
            b"explorer" => self.in_explorer = has_body,
            b"material" if self.in_explorer => {
                let subtype = attribute(e, b"type").ok_or(SettingsLoadError::MissingField("material.type"))?;
                settings.subtype = Some(subtype);
                self.in_material = has_body;
            }
            b"float" | b"rgb" | b"vector" if self.in_material => {
                settings.params.push(parse_param(e)?);
            }
            b"light" if self.in_explorer => {
                if let Some(v) = attribute(e, b"direction") {
                    settings.light.direction = parse_vec3(&v)?;
                }
                if let Some(v) = attribute(e, b"intensity") {
                    settings.light.intensity = parse_float(&v)?;
                }
            }
            b"lobe" if self.in_explorer => {
                if let Some(v) = attribute(e, b"segments") {
                    settings.lobe.segments = parse_usize(&v)?;
                }
                if let Some(v) = attribute(e, b"metric") {
                    settings.lobe.metric = v.parse::<RadianceMetric>()
                        .map_err(|e| SettingsLoadError::Parse(e.to_string()))?;
                }
            }
            b"samples" if self.in_explorer => {
                if let Some(v) = attribute(e, b"count") {
                    settings.samples.count = parse_usize(&v)?;
                }
                if let Some(v) = attribute(e, b"seed") {
                    settings.samples.seed = parse_u64(&v)?;
                }
            }
            b"slice" if self.in_explorer => {
                if let Some(v) = attribute(e, b"width") {
                    settings.slice.width = parse_usize(&v)?;
                }
                if let Some(v) = attribute(e, b"height") {
                    settings.slice.height = parse_usize(&v)?;
                }
            }
            other => log::warn!("Ignoring settings element <{}>.", String::from_utf8_lossy(other)),
        }
        Ok(())
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| attr.unescape_value().unwrap_or_default().to_string())
}

fn parse_param(e: &BytesStart<'_>) -> Result<MaterialParam, SettingsLoadError> {
    let name = attribute(e, b"name").ok_or(SettingsLoadError::MissingField("param.name"))?;
    let raw = attribute(e, b"value").ok_or(SettingsLoadError::MissingField("param.value"))?;
    let components = parse_floats(&raw)?;
    let expected = match e.name().as_ref() {
        b"float" => Some(1),
        b"rgb" => Some(3),
        _ => None,
    };
    if let Some(expected) = expected {
        if components.len() != expected {
            return Err(SettingsLoadError::Parse(
                format!("{} expects {} value(s), got {}", name, expected, components.len())));
        }
    }
    let value = ParamValue::from_components(&components)
        .ok_or_else(|| SettingsLoadError::Parse(format!("{} has {} components", name, components.len())))?;
    Ok(MaterialParam::new(name, value))
}

pub fn parse_float(value: &str) -> Result<Float, SettingsLoadError> {
    value.trim().parse::<Float>().map_err(|_| SettingsLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_usize(value: &str) -> Result<usize, SettingsLoadError> {
    value.trim().parse::<usize>().map_err(|_| SettingsLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_u64(value: &str) -> Result<u64, SettingsLoadError> {
    value.trim().parse::<u64>().map_err(|_| SettingsLoadError::Parse(format!("invalid integer: {}", value)))
}

/// Comma separated list of floats, e.g. `1, 0.5, 0`.
pub fn parse_floats(value: &str) -> Result<Vec<Float>, SettingsLoadError> {
    value.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(parse_float)
        .collect()
}

pub fn parse_vec3(value: &str) -> Result<Vector3f, SettingsLoadError> {
    match parse_floats(value)?.as_slice() {
        [x, y, z] => Ok(Vector3f::new(*x, *y, *z)),
        _ => Err(SettingsLoadError::Parse(format!("invalid vec3: {}", value))),
    }
}
