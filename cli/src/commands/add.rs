use anyhow::{Context, Result};
use registrar_core::{Category, MaterializeOptions, materialize, resolve_tree};
use std::path::Path;

use super::{load_config, print_list, transport};
use crate::prompt::TerminalPrompt;

/// Resolve `items` with their dependencies and write their files into the project
pub async fn run(
    items: &[String],
    kind: Category,
    cwd: &Path,
    options: MaterializeOptions,
) -> Result<()> {
    let config = load_config(cwd)?;
    let transport = transport()?;

    let tree = resolve_tree(items, kind, &config, &transport)
        .await
        .context("Failed to resolve items")?;

    let report = materialize(
        tree.files.iter().map(|f| &f.file),
        kind,
        &config,
        options,
        &TerminalPrompt,
    )
    .await
    .context("Failed to write files")?;

    if !options.silent {
        print_list("Created", &report.created);
        print_list("Updated", &report.updated);
        print_list("Skipped", &report.skipped);

        if !tree.dependencies.is_empty() || !tree.dev_dependencies.is_empty() {
            println!("\nInstall the required packages:");
            if !tree.dependencies.is_empty() {
                println!("  npm install {}", dedupe(&tree.dependencies).join(" "));
            }
            if !tree.dev_dependencies.is_empty() {
                println!(
                    "  npm install -D {}",
                    dedupe(&tree.dev_dependencies).join(" ")
                );
            }
        }

        if let Some(docs) = &tree.docs {
            println!("\n{}", docs);
        }
    }

    Ok(())
}

fn dedupe(values: &[String]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    values
        .iter()
        .map(String::as_str)
        .filter(|v| seen.insert(*v))
        .collect()
}
