// src/config/mod.rs

//! Manifest loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a manifest from disk or fall back to the built-in one (`loader.rs`).
//! - Validate step references, name clashes and task cycles (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{builtin_config, load_and_validate, load_from_path, load_or_builtin, parse_and_validate};
pub use model::{
    ConfigFile, ConfigSection, RawConfigFile, TaskConfig, ToolsSection, WatchConfig,
};
