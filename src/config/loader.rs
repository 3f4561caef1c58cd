// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// The manifest shipped with the crate, describing the standard
/// `src/` → `build/` front-end layout.
const BUILTIN_MANIFEST: &str = include_str!("../../Assetpipe.toml");

/// Load a manifest from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** check step
/// references or cycles. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a manifest from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Parse and validate a manifest held in memory.
pub fn parse_and_validate(contents: &str) -> Result<ConfigFile> {
    let raw: RawConfigFile = toml::from_str(contents)?;
    ConfigFile::try_from(raw)
}

/// The built-in manifest, validated.
pub fn builtin_config() -> Result<ConfigFile> {
    parse_and_validate(BUILTIN_MANIFEST)
}

/// Load `path` if it exists. When it does not and the path was not asked for
/// explicitly, fall back to the built-in manifest.
pub fn load_or_builtin(path: &Path, explicit: bool) -> Result<ConfigFile> {
    if explicit || path.exists() {
        return load_and_validate(path);
    }
    info!(path = ?path, "no manifest found; using built-in manifest");
    builtin_config()
}

/// Default manifest location, relative to the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Assetpipe.toml")
}
