// Copyright @yucwang 2021

pub mod lobe_mesh;
pub mod sample_points;
