//! Registry item documents
//!
//! An item is a named bundle of source files (an agent, tool, prompt or shared
//! library unit) served by a registry as a JSON document. This module holds the
//! wire types and the validation applied to every fetched document.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use std::str::FromStr;

use crate::error::{RegistryError, Result};

/// The three item categories a project consumes and a cache is laid out by.
///
/// Used as the `{type}` placeholder value in registry templates and as the
/// first path segment of canonical file paths (`tools/search.ts`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Agents,
    Tools,
    Prompts,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Agents, Category::Tools, Category::Prompts];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Agents => "agents",
            Category::Tools => "tools",
            Category::Prompts => "prompts",
        }
    }

    /// Map a leading path segment (`tools` in `tools/lib/x.ts`) to a category.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "agents" => Some(Category::Agents),
            "tools" => Some(Category::Tools),
            "prompts" => Some(Category::Prompts),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "agents" | "agent" => Ok(Category::Agents),
            "tools" | "tool" => Ok(Category::Tools),
            "prompts" | "prompt" => Ok(Category::Prompts),
            other => Err(format!(
                "unknown item kind '{}', expected one of: agents, tools, prompts",
                other
            )),
        }
    }
}

/// Item and file `type` as it appears on the wire (`registry:tool`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    #[serde(rename = "registry:agent")]
    Agent,
    #[serde(rename = "registry:tool")]
    Tool,
    #[serde(rename = "registry:prompt")]
    Prompt,
    #[serde(rename = "registry:lib")]
    Lib,
}

impl ItemKind {
    /// Category this kind installs into. Libraries have none of their own.
    pub fn category(self) -> Option<Category> {
        match self {
            ItemKind::Agent => Some(Category::Agents),
            ItemKind::Tool => Some(Category::Tools),
            ItemKind::Prompt => Some(Category::Prompts),
            ItemKind::Lib => None,
        }
    }
}

/// One file shipped by an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryItemFile {
    /// Canonical `kind/name.ext` path
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(rename = "type")]
    pub kind: ItemKind,

    /// Explicit install location, overriding `path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl RegistryItemFile {
    /// The path that identifies this file in a merged set: `target ?? path`.
    pub fn effective_path(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.path)
    }

    /// Effective path below its category directory: a leading `agents/`,
    /// `tools/`, `prompts/` or `lib/` segment is dropped.
    pub fn relative_path(&self) -> &str {
        let path = self.effective_path();
        match path.split_once('/') {
            Some((head, rest)) if head == "lib" || Category::from_segment(head).is_some() => rest,
            _ => path,
        }
    }

    /// [`relative_path`](Self::relative_path), rejected with `UnsafePath` if
    /// it could land outside the directory it is joined onto
    pub fn contained_relative_path(&self) -> Result<&str> {
        let relative = self.relative_path();
        if is_contained(relative) {
            Ok(relative)
        } else {
            Err(RegistryError::UnsafePath(self.effective_path().to_string()))
        }
    }

    /// Category this file installs into.
    ///
    /// Library files are redirected by their path prefix (`tools/lib/x.ts`
    /// lands with tools) and otherwise fall back to `requested`.
    pub fn category(&self, requested: Category) -> Category {
        self.kind.category().unwrap_or_else(|| {
            self.effective_path()
                .split('/')
                .next()
                .and_then(Category::from_segment)
                .unwrap_or(requested)
        })
    }
}

/// True if `relative` is non-empty and made only of plain segments (no `..`,
/// root or drive prefix)
pub fn is_contained(relative: &str) -> bool {
    !relative.is_empty()
        && Path::new(relative)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// A registry item document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryItem {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    pub name: String,

    #[serde(rename = "type")]
    pub kind: ItemKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Package-manager dependencies, passed through untouched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dev_dependencies: Vec<String>,

    /// References to other registry items, resolved transitively
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registry_dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<RegistryItemFile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

impl RegistryItem {
    /// Parse and validate a raw document fetched from `reference`.
    pub fn parse(reference: &str, raw: &str) -> Result<Self> {
        let item: RegistryItem =
            serde_json::from_str(raw).map_err(|e| RegistryError::Parse {
                reference: reference.to_string(),
                message: e.to_string(),
            })?;

        if let Err(problems) = item.validate() {
            return Err(RegistryError::Parse {
                reference: reference.to_string(),
                message: problems.join("; "),
            });
        }

        Ok(item)
    }

    /// Checks serde cannot express.
    fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.name.trim().is_empty() {
            problems.push("name: must not be empty".to_string());
        }

        for (index, file) in self.files.iter().enumerate() {
            if file.path.trim().is_empty() {
                problems.push(format!("files[{}].path: must not be empty", index));
            }
            if let Some(target) = &file.target
                && target.trim().is_empty()
            {
                problems.push(format!("files[{}].target: must not be empty", index));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}
