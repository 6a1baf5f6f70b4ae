//! Registry item fetching
//!
//! Retrieves raw item documents from the network or the local filesystem and
//! validates them. Transport is abstracted behind [`RegistryTransport`] so the
//! resolver can run against an in-memory registry in tests.

use async_trait::async_trait;
use futures_util::future;
use std::path::Path;
use tracing::debug;

use crate::config::Config;
use crate::error::{RegistryError, Result};
use crate::item::{Category, RegistryItem};
use crate::locator::{FetchTarget, Headers, locate};

/// Raw document transport
///
/// Headers are passed with every remote call; transports keep no per-URL state.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// GET `url` with `headers` and return the response body
    async fn fetch_remote(&self, url: &str, headers: &Headers) -> Result<String>;

    /// Read a document from disk
    async fn read_local(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RegistryError::io(path, e))
    }
}

/// HTTP transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("registrar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::Network {
                url: String::new(),
                message: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RegistryTransport for HttpTransport {
    async fn fetch_remote(&self, url: &str, headers: &Headers) -> Result<String> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| RegistryError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let hint = match status.as_u16() {
                401 | 403 => " (check the registry headers in registrar.toml)",
                404 => " (item not found)",
                _ => "",
            };
            return Err(RegistryError::Network {
                url: url.to_string(),
                message: format!("HTTP {}{}", status, hint),
            });
        }

        response.text().await.map_err(|e| RegistryError::Network {
            url: url.to_string(),
            message: format!("failed to read response body: {}", e),
        })
    }
}

/// Fetch and validate a single item
pub async fn fetch_item(
    reference: &str,
    category: Category,
    config: &Config,
    transport: &dyn RegistryTransport,
) -> Result<RegistryItem> {
    let raw = match locate(reference, category, config)? {
        FetchTarget::Local(path) => {
            debug!("Reading {} from {}", reference, path.display());
            transport.read_local(&path).await?
        }
        FetchTarget::Remote { url, headers } => {
            debug!("Fetching {} from {}", reference, url);
            transport.fetch_remote(&url, &headers).await?
        }
    };

    RegistryItem::parse(reference, &raw)
}

/// Fetch a batch of items concurrently
///
/// Results are in input order. The batch fails as a whole if any single
/// fetch fails.
pub async fn fetch_items(
    references: &[String],
    category: Category,
    config: &Config,
    transport: &dyn RegistryTransport,
) -> Result<Vec<RegistryItem>> {
    let fetches = references
        .iter()
        .map(|reference| fetch_item(reference, category, config, transport));

    future::try_join_all(fetches).await
}
