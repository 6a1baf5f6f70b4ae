//! On-disk registry cache
//!
//! ```text
//! <cache root>/
//!   agents/**
//!   tools/**
//!   prompts/**
//!   manifest.json    {"dependencies": {...}, "devDependencies": {...}}
//! ```
//!
//! Change detection compares content hashes only.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{RegistryError, Result};
use crate::item::{Category, is_contained};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

const CONTENT_HASH_LEN: usize = 16;

/// Truncated SHA-256 of `content`, lower-case hex
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(CONTENT_HASH_LEN);
    hex
}

/// Aggregated package dependencies of everything synced into a cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
}

impl Manifest {
    /// Merge `name@version` strings in. Later entries replace earlier ones.
    pub fn merge(&mut self, dependencies: &[String], dev_dependencies: &[String]) {
        for entry in dependencies {
            let (name, version) = parse_dependency(entry);
            self.dependencies
                .insert(name.to_string(), version.to_string());
        }
        for entry in dev_dependencies {
            let (name, version) = parse_dependency(entry);
            self.dev_dependencies
                .insert(name.to_string(), version.to_string());
        }
    }
}

/// Split `name@version`. A leading `@` belongs to the (scoped) name, and a
/// missing version is `latest`.
pub fn parse_dependency(entry: &str) -> (&str, &str) {
    match entry.rfind('@') {
        Some(index) if index > 0 => (&entry[..index], &entry[index + 1..]),
        _ => (entry, "latest"),
    }
}

#[derive(Debug, Clone)]
pub struct RemoteCache {
    root: PathBuf,
}

impl RemoteCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE_NAME)
    }

    /// Read a cached file; `None` if it isn't cached
    pub async fn read(&self, relative: &str) -> Result<Option<String>> {
        let path = self.path_for(relative);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegistryError::io(path, e)),
        }
    }

    pub async fn cached_hash(&self, relative: &str) -> Result<Option<String>> {
        Ok(self
            .read(relative)
            .await?
            .map(|content| content_hash(&content)))
    }

    /// Create the per-category directories
    pub async fn ensure_layout(&self) -> Result<()> {
        for category in Category::ALL {
            let dir = self.root.join(category.as_str());
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| RegistryError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Write a cache-relative file. Paths that would leave the cache root are
    /// rejected.
    pub async fn write(&self, relative: &str, content: &str) -> Result<()> {
        if !is_contained(relative) {
            return Err(RegistryError::UnsafePath(relative.to_string()));
        }
        let path = self.path_for(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RegistryError::io(parent, e))?;
        }
        debug!("Caching {}", path.display());
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| RegistryError::io(path, e))
    }

    /// Load the manifest, or an empty one if none has been written yet
    pub async fn load_manifest(&self) -> Result<Manifest> {
        let path = self.manifest_path();
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Manifest::default()),
            Err(e) => return Err(RegistryError::io(path, e)),
        };

        serde_json::from_str(&raw).map_err(|e| RegistryError::Parse {
            reference: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub async fn save_manifest(&self, manifest: &Manifest) -> Result<()> {
        let raw = serde_json::to_string_pretty(manifest).map_err(|e| RegistryError::Parse {
            reference: MANIFEST_FILE_NAME.to_string(),
            message: e.to_string(),
        })?;
        self.write(MANIFEST_FILE_NAME, &format!("{}\n", raw)).await
    }
}
