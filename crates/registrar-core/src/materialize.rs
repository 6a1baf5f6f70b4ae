//! Writing resolved files into a project
//!
//! Each file is placed under the output directory of its own category, with
//! imports rewritten to the project's aliases. Existing files with identical
//! content are left alone; differing ones are overwritten only when the caller
//! allows it or the user confirms after seeing a diff.

use similar::TextDiff;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{RegistryError, Result};
use crate::item::{Category, RegistryItemFile};
use crate::transform::rewrite_imports;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Replace differing files without asking
    pub overwrite: bool,
    /// Don't log per-file progress
    pub silent: bool,
    /// Answer yes to every prompt
    pub yes: bool,
}

/// Project-relative paths, `/`-separated
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MaterializeReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
}

/// Asks whether an existing, different file may be replaced
pub trait OverwritePrompt {
    fn confirm_overwrite(&self, path: &str, diff: &str) -> Result<bool>;
}

/// Unified line diff of `old` → `new`
pub fn line_diff(path: &str, old: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{}", path), &format!("b/{}", path))
        .to_string()
}

/// Write `files` into the project described by `config`.
///
/// Files are processed in order and writes are not rolled back: if a later
/// file fails, earlier ones stay on disk.
pub async fn materialize<'a>(
    files: impl IntoIterator<Item = &'a RegistryItemFile>,
    category: Category,
    config: &Config,
    options: MaterializeOptions,
    prompt: &dyn OverwritePrompt,
) -> Result<MaterializeReport> {
    let mut report = MaterializeReport::default();

    for file in files {
        let Some(raw) = &file.content else {
            warn!("{} has no content, skipping", file.effective_path());
            continue;
        };

        let target = target_path(file, category, config)?;
        let shown = display_path(&target, &config.root);
        let content = rewrite_imports(&shown, raw, config);

        let existing = match tokio::fs::metadata(&target).await {
            Ok(meta) if meta.is_dir() => return Err(RegistryError::DirectoryCollision(target)),
            Ok(_) => Some(
                tokio::fs::read_to_string(&target)
                    .await
                    .map_err(|e| RegistryError::io(&target, e))?,
            ),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(RegistryError::io(&target, e)),
        };

        match existing {
            Some(current) if current == content => {
                debug!("{} is up to date", shown);
                report.skipped.push(shown);
            }
            Some(current) => {
                let replace = options.overwrite
                    || options.yes
                    || prompt.confirm_overwrite(&shown, &line_diff(&shown, &current, &content))?;
                if replace {
                    write_file(&target, &content).await?;
                    if !options.silent {
                        info!("Updated {}", shown);
                    }
                    report.updated.push(shown);
                } else {
                    report.skipped.push(shown);
                }
            }
            None => {
                write_file(&target, &content).await?;
                if !options.silent {
                    info!("Created {}", shown);
                }
                report.created.push(shown);
            }
        }
    }

    Ok(report)
}

/// Absolute install location of `file`
pub fn target_path(file: &RegistryItemFile, requested: Category, config: &Config) -> Result<PathBuf> {
    let relative = file.contained_relative_path()?;

    let mut base = config.resolved_paths.get(file.category(requested)).to_path_buf();
    let src = config.root.join("src");
    if config.src_dir
        && !base.starts_with(&src)
        && let Ok(inner) = base.strip_prefix(&config.root)
    {
        base = src.join(inner);
    }

    let mut target = base.join(relative);
    if !config.typescript {
        let coerced = match target.extension().and_then(|e| e.to_str()) {
            Some("ts") => Some("js"),
            Some("tsx") => Some("jsx"),
            _ => None,
        };
        if let Some(extension) = coerced {
            target.set_extension(extension);
        }
    }

    Ok(target)
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RegistryError::io(parent, e))?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| RegistryError::io(path, e))
}
