// Copyright @yucwang 2021

pub mod cli;
pub mod commands;
pub mod core;
pub mod io;
pub mod materials;
pub mod math;
pub mod plugin;
pub mod renderers;
pub mod shapes;

export_material_plugin!(crate::materials::standard::StandardLibrary);
