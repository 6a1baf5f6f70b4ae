use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid registry namespace in '{0}', expected '@registry/item'")]
    InvalidNamespace(String),

    #[error("no registry URL could be computed for '{0}'")]
    NotFound(String),

    #[error(
        "unknown registry '@{registry}' referenced by '{reference}', add it to [registries] in registrar.toml"
    )]
    RegistryNotConfigured { registry: String, reference: String },

    #[error("failed to parse registry item '{reference}': {message}")]
    Parse { reference: String, message: String },

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: a directory exists at that path", .0.display())]
    DirectoryCollision(PathBuf),

    #[error("refusing to write '{0}': path escapes the output directory")]
    UnsafePath(String),

    #[error("invalid configuration:\n  {}", .0.join("\n  "))]
    Config(Vec<String>),

    #[error("prompt failed: {0}")]
    Prompt(String),
}

impl RegistryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RegistryError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
