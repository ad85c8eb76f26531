// Copyright @yucwang 2026

pub mod debug;
pub mod matte;
pub mod microfacet;
pub mod pbm;
pub mod standard;
