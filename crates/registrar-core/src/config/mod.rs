//! Configuration management for registrar
//!
//! ## Architecture
//!
//! - `schema` - `registrar.toml` data structures and validation
//! - `io` - Reading and writing the project config file
//! - `paths` - Directory path management
//!
//! [`Config`] is the resolved, immutable view used by a single invocation:
//! the project file merged with built-in defaults, with output directories
//! and the cache root made absolute.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use registrar_core::config::Config;
//!
//! # fn example() -> registrar_core::Result<()> {
//! let config = Config::load(std::path::Path::new("."))?;
//! let tools_dir = config.resolved_paths.get(registrar_core::Category::Tools);
//! # Ok(())
//! # }
//! ```

pub mod io;
pub mod paths;
pub mod schema;

pub use io::{load_project_config, save_project_config};
pub use paths::{CONFIG_FILE_NAME, get_cache_dir, get_config_path, get_registrar_dir};
pub use schema::{Aliases, OutputPaths, ProjectConfig, RegistrySource};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::item::Category;

/// Registry used for bare item names. Not configurable per project.
pub const DEFAULT_REGISTRY_URL: &str = "https://registrar.dev/r/{type}/{name}.json";

/// Absolute output directory for each category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub agents: PathBuf,
    pub tools: PathBuf,
    pub prompts: PathBuf,
}

impl ResolvedPaths {
    pub fn get(&self, category: Category) -> &Path {
        match category {
            Category::Agents => &self.agents,
            Category::Tools => &self.tools,
            Category::Prompts => &self.prompts,
        }
    }
}

/// Resolved configuration for one invocation
#[derive(Debug, Clone)]
pub struct Config {
    /// Project root all relative paths are resolved against
    pub root: PathBuf,
    pub aliases: Aliases,
    /// Namespaced registries keyed by `@name`
    pub registries: BTreeMap<String, RegistrySource>,
    pub resolved_paths: ResolvedPaths,
    pub typescript: bool,
    pub src_dir: bool,
    pub cache_dir: PathBuf,
}

impl Config {
    /// Load `registrar.toml` from `root` and resolve it
    pub fn load(root: &Path) -> Result<Self> {
        let project = load_project_config(root)?;
        Ok(Self::resolve(project, root))
    }

    /// Merge a project config with built-in defaults
    pub fn resolve(project: ProjectConfig, root: &Path) -> Self {
        let output_dir = |category: Category| match project.paths.get(category) {
            Some(path) => root.join(path),
            None => root.join(alias_dir(project.aliases.get(category))),
        };

        let resolved_paths = ResolvedPaths {
            agents: output_dir(Category::Agents),
            tools: output_dir(Category::Tools),
            prompts: output_dir(Category::Prompts),
        };

        let cache_dir = match &project.cache_dir {
            Some(dir) => root.join(dir),
            None => get_cache_dir().unwrap_or_else(|_| root.join(".registrar").join("cache")),
        };

        Self {
            root: root.to_path_buf(),
            aliases: project.aliases,
            registries: project.registries,
            resolved_paths,
            typescript: project.typescript,
            src_dir: project.src_dir,
            cache_dir,
        }
    }

    /// Look up a namespaced registry by bare name (`acme` for `@acme`)
    pub fn registry(&self, name: &str) -> Option<&RegistrySource> {
        self.registries.get(&format!("@{}", name))
    }
}

/// Directory an import alias points at, relative to the project root.
///
/// `@/tools` → `tools`, `~/lib/agents` → `lib/agents`, `tools` → `tools`.
fn alias_dir(alias: &str) -> PathBuf {
    let trimmed = alias.trim_end_matches('/');
    let relative = match trimmed.split_once('/') {
        Some((prefix, rest))
            if prefix.is_empty()
                || prefix == "."
                || prefix.chars().all(|c| matches!(c, '@' | '~' | '#' | '$')) =>
        {
            rest
        }
        _ => trimmed,
    };
    PathBuf::from(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_dir() {
        assert_eq!(alias_dir("@/tools"), PathBuf::from("tools"));
        assert_eq!(alias_dir("~/lib/agents/"), PathBuf::from("lib/agents"));
        assert_eq!(alias_dir("./prompts"), PathBuf::from("prompts"));
        assert_eq!(alias_dir("prompts"), PathBuf::from("prompts"));
        assert_eq!(alias_dir("#/shared/tools"), PathBuf::from("shared/tools"));
    }

    #[test]
    fn test_resolve_defaults() {
        let config = Config::resolve(ProjectConfig::default(), Path::new("/project"));
        assert_eq!(config.resolved_paths.tools, PathBuf::from("/project/tools"));
        assert_eq!(config.resolved_paths.agents, PathBuf::from("/project/agents"));
        assert!(config.typescript);
        assert!(config.registry("acme").is_none());
    }

    #[test]
    fn test_resolve_overrides() {
        let mut project = ProjectConfig::default();
        project.aliases.tools = "~/mytools".to_string();
        project.paths.prompts = Some(PathBuf::from("content/prompts"));
        project.cache_dir = Some(PathBuf::from(".cache/registrar"));
        project.registries.insert(
            "@acme".to_string(),
            RegistrySource::Template("https://acme.dev/{name}".to_string()),
        );

        let config = Config::resolve(project, Path::new("/project"));
        assert_eq!(config.resolved_paths.tools, PathBuf::from("/project/mytools"));
        assert_eq!(
            config.resolved_paths.prompts,
            PathBuf::from("/project/content/prompts")
        );
        assert_eq!(config.cache_dir, PathBuf::from("/project/.cache/registrar"));
        assert!(config.registry("acme").is_some());
    }
}
