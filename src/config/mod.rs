// src/config/mod.rs

//! Configuration loading and validation for buildpipe.
//!
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, resolve_config};
pub use model::{
    BuildSection, ConfigSection, EnvSection, PackageSpec, PipelineConfig, RawPipelineConfig,
    ToolSection,
};
