//! Configuration schema for registrar projects
//!
//! This module defines the data structures stored in `registrar.toml`.
//! Every field has a default so partial files (or no file at all) load cleanly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::item::Category;

/// Project configuration as written in `registrar.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project is written in the typed dialect (`.ts`). When false, `.ts`
    /// files are installed with a `.js` extension.
    #[serde(default = "default_true")]
    pub typescript: bool,

    /// Project keeps its sources under `src/`
    #[serde(default)]
    pub src_dir: bool,

    /// Import prefixes that installed code should use for each category
    #[serde(default)]
    pub aliases: Aliases,

    /// Explicit output directories, relative to the project root
    #[serde(default)]
    #[serde(skip_serializing_if = "OutputPaths::is_empty")]
    pub paths: OutputPaths,

    /// Namespaced registries: `"@name"` → source
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub registries: BTreeMap<String, RegistrySource>,

    /// Remote sync cache root
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            typescript: true,
            src_dir: false,
            aliases: Aliases::default(),
            paths: OutputPaths::default(),
            registries: BTreeMap::new(),
            cache_dir: None,
        }
    }
}

/// Per-category import aliases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aliases {
    #[serde(default = "default_agents_alias")]
    pub agents: String,
    #[serde(default = "default_tools_alias")]
    pub tools: String,
    #[serde(default = "default_prompts_alias")]
    pub prompts: String,
}

fn default_agents_alias() -> String {
    "@/agents".to_string()
}

fn default_tools_alias() -> String {
    "@/tools".to_string()
}

fn default_prompts_alias() -> String {
    "@/prompts".to_string()
}

impl Default for Aliases {
    fn default() -> Self {
        Self {
            agents: default_agents_alias(),
            tools: default_tools_alias(),
            prompts: default_prompts_alias(),
        }
    }
}

impl Aliases {
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Agents => &self.agents,
            Category::Tools => &self.tools,
            Category::Prompts => &self.prompts,
        }
    }
}

/// Optional per-category output directory overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PathBuf>,
}

impl OutputPaths {
    pub fn get(&self, category: Category) -> Option<&PathBuf> {
        match category {
            Category::Agents => self.agents.as_ref(),
            Category::Tools => self.tools.as_ref(),
            Category::Prompts => self.prompts.as_ref(),
        }
    }

    fn is_empty(&self) -> bool {
        self.agents.is_none() && self.tools.is_none() && self.prompts.is_none()
    }
}

/// A namespaced registry source
///
/// Either a bare URL template or a table with extra query params and headers.
/// Templates use `{name}` for the item and `{type}` (or `{kind}`) for the
/// requested category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistrySource {
    Template(String),
    Detailed {
        url: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        params: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
}

impl RegistrySource {
    pub fn template(&self) -> &str {
        match self {
            RegistrySource::Template(url) => url,
            RegistrySource::Detailed { url, .. } => url,
        }
    }

    /// Whether the template varies by category
    pub fn has_kind_placeholder(&self) -> bool {
        let template = self.template();
        template.contains("{type}") || template.contains("{kind}")
    }
}

impl ProjectConfig {
    /// Validate the configuration for common errors
    ///
    /// Returns Ok(()) if valid, or Err with every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (key, source) in &self.registries {
            if let Err(e) = validate_registry_key(key) {
                errors.push(e);
            }
            if !source.template().contains("{name}") {
                errors.push(format!(
                    "registry '{}' must contain the {{name}} placeholder in its url: '{}'",
                    key,
                    source.template()
                ));
            }
        }

        for category in Category::ALL {
            if self.aliases.get(category).trim().is_empty() {
                errors.push(format!("alias for '{}' cannot be empty", category));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Problems that don't make the config unusable
    pub fn warnings(&self) -> Vec<String> {
        self.registries
            .iter()
            .filter(|(_, source)| !source.has_kind_placeholder())
            .map(|(key, source)| {
                format!(
                    "registry '{}' has no {{type}} or {{kind}} placeholder, every category will fetch from '{}'",
                    key,
                    source.template()
                )
            })
            .collect()
    }
}

/// Registry keys look like `@name`: one leading `@`, no `/`.
fn validate_registry_key(key: &str) -> Result<(), String> {
    let Some(name) = key.strip_prefix('@') else {
        return Err(format!("registry key '{}' must start with '@'", key));
    };
    if name.is_empty() || name.contains('/') || name.contains('@') {
        return Err(format!(
            "registry key '{}' must be '@' followed by a name without '/'",
            key
        ));
    }
    Ok(())
}
