// Copyright @yucwang 2026

pub mod anisotropic;
pub mod diffuse;
pub mod microfacet;
pub mod normalmap;
pub mod roughconductor;
pub mod roughdielectric;
pub mod roughsubstrate;
