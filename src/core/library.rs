// Copyright @yucwang 2026

use crate::core::material::{ Material, MaterialParam };

/// Factory and discovery queries for a family of materials.
pub trait MaterialLibrary {
    fn name(&self) -> String;

    fn supported_subtypes(&self) -> Vec<String>;

    /// Parameters of `subtype` with their default values. Unknown subtypes
    /// have none.
    fn supported_params(&self, subtype: &str) -> Vec<MaterialParam>;

    fn create_instance(&self, subtype: &str) -> Option<Box<dyn Material>>;

    fn supports(&self, subtype: &str) -> bool {
        self.supported_subtypes().iter().any(|s| s == subtype)
    }
}
