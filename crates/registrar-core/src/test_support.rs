//! Shared test doubles for resolver, graph and sync tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::config::{Config, DEFAULT_REGISTRY_URL, ProjectConfig};
use crate::error::{RegistryError, Result};
use crate::fetch::RegistryTransport;
use crate::locator::Headers;

/// In-memory registry keyed by URL. Records every remote request.
#[derive(Default)]
pub struct MemoryTransport {
    documents: Mutex<HashMap<String, String>>,
    required_headers: HashMap<String, (String, String)>,
    requests: Mutex<Vec<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(self, url: &str, document: impl Into<String>) -> Self {
        self.set(url, document);
        self
    }

    /// Serve `document` for a bare name in the default registry
    pub fn with_default(self, kind: &str, name: &str, document: impl Into<String>) -> Self {
        let url = default_url(kind, name);
        self.with_url(&url, document)
    }

    pub fn require_header(mut self, url: &str, name: &str, value: &str) -> Self {
        self.required_headers
            .insert(url.to_string(), (name.to_string(), value.to_string()));
        self
    }

    /// Replace a served document, as a registry publishing a new version would
    pub fn set(&self, url: &str, document: impl Into<String>) {
        self.documents
            .lock()
            .unwrap()
            .insert(url.to_string(), document.into());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn default_url(kind: &str, name: &str) -> String {
    DEFAULT_REGISTRY_URL
        .replace("{type}", kind)
        .replace("{name}", name)
}

#[async_trait]
impl RegistryTransport for MemoryTransport {
    async fn fetch_remote(&self, url: &str, headers: &Headers) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());

        if let Some((name, value)) = self.required_headers.get(url)
            && headers.get(name) != Some(value)
        {
            return Err(RegistryError::Network {
                url: url.to_string(),
                message: "HTTP 401 Unauthorized".to_string(),
            });
        }

        self.documents
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| RegistryError::Network {
                url: url.to_string(),
                message: "HTTP 404 Not Found".to_string(),
            })
    }
}

/// Item document without files
pub fn item_json(name: &str, kind: &str, registry_dependencies: &[&str]) -> String {
    item_with_files(name, kind, registry_dependencies, &[])
}

/// Item document with `(path, content)` files typed like the item
pub fn item_with_files(
    name: &str,
    kind: &str,
    registry_dependencies: &[&str],
    files: &[(&str, &str)],
) -> String {
    let files: Vec<_> = files
        .iter()
        .map(|(path, content)| {
            serde_json::json!({ "path": path, "content": content, "type": kind })
        })
        .collect();

    serde_json::json!({
        "name": name,
        "type": kind,
        "registryDependencies": registry_dependencies,
        "files": files,
    })
    .to_string()
}

pub fn test_config() -> Config {
    Config::resolve(ProjectConfig::default(), Path::new("/project"))
}
