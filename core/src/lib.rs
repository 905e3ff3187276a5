//! Core

#[macro_use]
extern crate hexf;

// Re-export.
pub mod bsdf;
pub mod common;
pub mod geometry;
pub mod light;
pub mod properties;
pub mod rng;
pub mod sampling;
pub mod scene;
pub mod spectrum;
