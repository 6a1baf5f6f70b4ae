//! Configuration file I/O operations
//!
//! Reads and writes `registrar.toml`. Every load and save validates.

use std::fs;
use std::path::Path;
use tracing::warn;

use super::paths::get_config_path;
use super::schema::ProjectConfig;
use crate::error::{RegistryError, Result};

/// Load the project configuration from `root`
///
/// Returns a default config if the file doesn't exist.
pub fn load_project_config(root: &Path) -> Result<ProjectConfig> {
    let path = get_config_path(root);

    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = fs::read_to_string(&path).map_err(|e| RegistryError::io(&path, e))?;

    let config: ProjectConfig = toml::from_str(&content).map_err(|e| {
        RegistryError::Config(vec![format!("failed to parse {}: {}", path.display(), e)])
    })?;

    if let Err(errors) = config.validate() {
        return Err(RegistryError::Config(
            errors
                .into_iter()
                .map(|e| format!("{}: {}", path.display(), e))
                .collect(),
        ));
    }
    for warning in config.warnings() {
        warn!("{}: {}", path.display(), warning);
    }

    Ok(config)
}

/// Save the project configuration to `root`
///
/// Refuses to write an invalid config.
pub fn save_project_config(root: &Path, config: &ProjectConfig) -> Result<()> {
    config.validate().map_err(RegistryError::Config)?;

    let path = get_config_path(root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| RegistryError::io(parent, e))?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| RegistryError::Config(vec![format!("failed to serialize config: {}", e)]))?;

    fs::write(&path, content).map_err(|e| RegistryError::io(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RegistrySource;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_project_config(temp.path()).unwrap();
        assert!(config.typescript);
        assert!(config.registries.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let mut config = ProjectConfig {
            src_dir: true,
            ..Default::default()
        };
        config.aliases.tools = "~/mytools".to_string();
        config.registries.insert(
            "@acme".to_string(),
            RegistrySource::Template("https://acme.dev/{type}/{name}.json".to_string()),
        );

        save_project_config(temp.path(), &config).unwrap();
        let loaded = load_project_config(temp.path()).unwrap();

        assert!(loaded.src_dir);
        assert_eq!(loaded.aliases.tools, "~/mytools");
        assert_eq!(loaded.registries, config.registries);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("registrar.toml"),
            "[registries]\n\"@acme\" = \"https://acme.dev/items.json\"\n",
        )
        .unwrap();

        let err = load_project_config(temp.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("registrar.toml"));
        assert!(message.contains("{name}"));
    }

    #[test]
    fn test_save_rejects_invalid_config() {
        let temp = TempDir::new().unwrap();
        let mut config = ProjectConfig::default();
        config.registries.insert(
            "acme".to_string(),
            RegistrySource::Template("https://acme.dev/{name}".to_string()),
        );

        assert!(save_project_config(temp.path(), &config).is_err());
        assert!(!temp.path().join("registrar.toml").exists());
    }
}
