// src/config/mod.rs

//! Configuration loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load the file and layer env / command-line overrides on top (`loader.rs`).
//! - Validate required keys and parse durations (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{LoadedConfig, Overrides, env_key, load, load_from_path, load_with_env};
pub use model::{
    Config, LogConfig, RawConfigFile, SecretsOperatorConfig, TerragruntConfig,
    TerragruntLogConfig,
};
pub use validate::parse_duration;
