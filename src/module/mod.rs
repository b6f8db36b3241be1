// src/module/mod.rs
//! Source file loading and import resolution.

pub mod loader;

pub use loader::{Module, Project};
