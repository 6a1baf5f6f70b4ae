//! Command implementations
//!
//! Each command loads the project config from `--cwd`, drives the core
//! pipeline and prints a human-readable summary to stdout.

pub mod add;
pub mod init;
pub mod registry;
pub mod sync;
pub mod view;

use anyhow::{Context, Result};
use registrar_core::{Config, HttpTransport};
use std::path::{Path, PathBuf};

/// Canonical project root for `--cwd`
pub fn project_root(cwd: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(cwd)
        .with_context(|| format!("Project directory not found: {}", cwd.display()))
}

/// Load `registrar.toml` (or defaults) for the project at `cwd`
pub fn load_config(cwd: &Path) -> Result<Config> {
    let root = project_root(cwd)?;
    Config::load(&root).context("Failed to load registrar.toml")
}

pub fn transport() -> Result<HttpTransport> {
    HttpTransport::new().context("Failed to create HTTP client")
}

/// Print a titled list, skipping empty ones
fn print_list(title: &str, entries: &[String]) {
    if entries.is_empty() {
        return;
    }
    println!("{}:", title);
    for entry in entries {
        println!("  {}", entry);
    }
}
