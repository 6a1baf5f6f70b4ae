//! Item reference classification and fetch target computation
//!
//! Every item reference string takes one of four forms:
//!
//! 1. **Local files** (`./items/search.json`, `/abs/item.json`, `~/x.json`,
//!    `search.json`) - read from disk, never fetched over the network
//! 2. **URLs** (`https://example.com/r/search.json`) - fetched as-is
//! 3. **Namespaced items** (`@acme/search`) - expanded through the `@acme`
//!    registry template in `registrar.toml`
//! 4. **Bare names** (`search`) - looked up in the built-in default registry
//!
//! ```text
//!  reference ──► local-file prefix or .json? ──yes──► LocalFile
//!                      │ no
//!                      ▼
//!               http(s):// prefix? ──yes──► Url
//!                      │ no
//!                      ▼
//!               starts with '@'? ──yes──► Namespaced { registry, item }
//!                      │ no
//!                      ▼
//!                    Bare
//! ```
//!
//! [`ItemReference::parse`] is the only place these prefix checks happen.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use crate::config::{Config, DEFAULT_REGISTRY_URL, RegistrySource};
use crate::error::{RegistryError, Result};
use crate::item::Category;

/// Request headers for one URL
pub type Headers = BTreeMap<String, String>;

static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex")
});

/// A classified item reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemReference {
    Url(String),
    LocalFile(String),
    Namespaced { registry: String, item: String },
    Bare(String),
}

impl ItemReference {
    pub fn parse(reference: &str) -> Result<Self> {
        if is_local_file(reference) {
            return Ok(ItemReference::LocalFile(reference.to_string()));
        }

        if is_url(reference) {
            return Ok(ItemReference::Url(reference.to_string()));
        }

        if let Some(rest) = reference.strip_prefix('@') {
            return match rest.split_once('/') {
                Some((registry, item))
                    if !registry.is_empty() && !item.is_empty() && !registry.contains('@') =>
                {
                    Ok(ItemReference::Namespaced {
                        registry: registry.to_string(),
                        item: item.to_string(),
                    })
                }
                _ => Err(RegistryError::InvalidNamespace(reference.to_string())),
            };
        }

        Ok(ItemReference::Bare(reference.to_string()))
    }

    /// Item name this reference most likely resolves to.
    ///
    /// Used to match dependency references against already-resolved items:
    /// the file stem for URLs and local paths, the item part for namespaced
    /// references, the last segment for bare names.
    pub fn derived_name(&self) -> &str {
        let tail = match self {
            ItemReference::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                path.rsplit('/').next().unwrap_or(path)
            }
            ItemReference::LocalFile(path) => path.rsplit(['/', '\\']).next().unwrap_or(path),
            ItemReference::Namespaced { item, .. } => item.rsplit('/').next().unwrap_or(item),
            ItemReference::Bare(name) => name.rsplit('/').next().unwrap_or(name),
        };
        tail.strip_suffix(".json").unwrap_or(tail)
    }

    pub fn is_bare(&self) -> bool {
        matches!(self, ItemReference::Bare(_))
    }
}

fn is_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Local-file references: explicit path prefixes, or a `.json` document that
/// isn't a URL or namespaced reference.
fn is_local_file(reference: &str) -> bool {
    if reference.starts_with("./")
        || reference.starts_with("../")
        || reference.starts_with("~/")
        || reference.starts_with('/')
        || reference.starts_with('\\')
        || reference.starts_with("file://")
    {
        return true;
    }

    reference.ends_with(".json") && !is_url(reference) && !reference.starts_with('@')
}

/// Where to fetch one item from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    Remote { url: String, headers: Headers },
    Local(PathBuf),
}

/// Compute the fetch target for `reference`.
///
/// Pure: no I/O beyond reading environment variables referenced by
/// `${VAR}` placeholders in registry headers and params.
pub fn locate(reference: &str, category: Category, config: &Config) -> Result<FetchTarget> {
    locate_with_env(reference, category, config, &|name: &str| std::env::var(name).ok())
}

pub(crate) fn locate_with_env(
    reference: &str,
    category: Category,
    config: &Config,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<FetchTarget> {
    match ItemReference::parse(reference)? {
        ItemReference::LocalFile(path) => Ok(FetchTarget::Local(local_path(&path, config))),

        ItemReference::Url(url) => Ok(FetchTarget::Remote {
            url,
            headers: Headers::new(),
        }),

        ItemReference::Namespaced { registry, item } => {
            let source =
                config
                    .registry(&registry)
                    .ok_or_else(|| RegistryError::RegistryNotConfigured {
                        registry: registry.clone(),
                        reference: reference.to_string(),
                    })?;
            expand_source(reference, source, &item, category, config, env)
        }

        ItemReference::Bare(name) => {
            let url = fill_template(DEFAULT_REGISTRY_URL, &name, category);
            if url.is_empty() {
                return Err(RegistryError::NotFound(reference.to_string()));
            }
            Ok(FetchTarget::Remote {
                url,
                headers: Headers::new(),
            })
        }
    }
}

fn expand_source(
    reference: &str,
    source: &RegistrySource,
    item: &str,
    category: Category,
    config: &Config,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<FetchTarget> {
    let filled = fill_template(source.template(), item, category);
    if filled.trim().is_empty() {
        return Err(RegistryError::NotFound(reference.to_string()));
    }

    let (params, headers) = match source {
        RegistrySource::Template(_) => (BTreeMap::new(), BTreeMap::new()),
        RegistrySource::Detailed {
            params, headers, ..
        } => (params.clone(), headers.clone()),
    };

    // Registries hosted on disk
    if !is_url(&filled) {
        return Ok(FetchTarget::Local(local_path(&filled, config)));
    }

    let url = if params.is_empty() {
        filled
    } else {
        let mut parsed = url::Url::parse(&filled).map_err(|e| RegistryError::Network {
            url: filled.clone(),
            message: format!("invalid registry URL: {}", e),
        })?;
        {
            let mut query = parsed.query_pairs_mut();
            for (key, value) in &params {
                query.append_pair(key, &expand_env(value, env));
            }
        }
        parsed.to_string()
    };

    let headers = headers
        .into_iter()
        .map(|(key, value)| {
            let value = expand_env(&value, env);
            (key, value)
        })
        .collect();

    Ok(FetchTarget::Remote { url, headers })
}

fn fill_template(template: &str, name: &str, category: Category) -> String {
    template
        .replace("{name}", name)
        .replace("{type}", category.as_str())
        .replace("{kind}", category.as_str())
}

/// Replace `${VAR}` with the variable's value; unset variables become empty.
fn expand_env(value: &str, env: &dyn Fn(&str) -> Option<String>) -> String {
    ENV_VAR_RE
        .replace_all(value, |caps: &regex::Captures<'_>| {
            env(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

fn local_path(reference: &str, config: &Config) -> PathBuf {
    let reference = reference.strip_prefix("file://").unwrap_or(reference);
    if let Some(stripped) = reference.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    config.root.join(reference)
}
