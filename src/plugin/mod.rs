// Copyright @yucwang 2026

pub mod abi;
pub mod library;
pub mod loader;
