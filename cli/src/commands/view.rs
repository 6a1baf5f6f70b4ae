use anyhow::{Context, Result};
use registrar_core::{Category, resolve_tree};
use std::path::Path;

use super::{load_config, transport};

/// Print the resolved, ordered tree for `items` as JSON
pub async fn run(items: &[String], kind: Category, cwd: &Path) -> Result<()> {
    let config = load_config(cwd)?;
    let transport = transport()?;

    let tree = resolve_tree(items, kind, &config, &transport)
        .await
        .context("Failed to resolve items")?;

    let json = serde_json::to_string_pretty(&tree).context("Failed to serialize tree")?;
    println!("{}", json);
    Ok(())
}
