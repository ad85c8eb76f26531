// Copyright @yucwang 2021

pub mod bsdf;
pub mod explorer;
pub mod library;
pub mod material;
pub mod progress;
pub mod rng;
pub mod settings_loader;
