//! Directory path management for registrar
//!
//! User-level paths live under the platform config directory; project-level
//! files live at the project root.

use std::path::{Path, PathBuf};

use crate::error::{RegistryError, Result};

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "registrar.toml";

/// Get the base registrar directory (~/.config/registrar/)
pub fn get_registrar_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("registrar"))
        .ok_or_else(|| RegistryError::Config(vec!["failed to get config directory".to_string()]))
}

/// Get the default remote sync cache directory (~/.config/registrar/cache/)
pub fn get_cache_dir() -> Result<PathBuf> {
    Ok(get_registrar_dir()?.join("cache"))
}

/// Get the project config file path (<root>/registrar.toml)
pub fn get_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}
