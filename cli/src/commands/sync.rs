use anyhow::{Context, Result};
use registrar_core::sync::SyncPlan;
use registrar_core::{Category, RemoteCache, SyncRequest, prepare_sync};
use std::path::{Path, PathBuf};

use super::{load_config, print_list, transport};
use crate::prompt::confirm;

pub struct SyncOptions {
    pub cache_dir: Option<PathBuf>,
    pub yes: bool,
    pub dry_run: bool,
}

/// Compare `items` against the cache and update it after confirmation
pub async fn run(items: &[String], kind: Category, cwd: &Path, options: SyncOptions) -> Result<()> {
    let mut config = load_config(cwd)?;
    if let Some(dir) = options.cache_dir {
        config.cache_dir = config.root.join(dir);
    }

    let requests: Vec<SyncRequest> = items
        .iter()
        .map(|item| parse_request(item, kind))
        .collect();
    let cache = RemoteCache::new(&config.cache_dir);
    let transport = transport()?;

    let prepared = prepare_sync(&requests, &config, &transport, &cache)
        .await
        .context("Failed to prepare sync")?;

    print_plan(&prepared.plan);

    if !prepared.plan.needs_sync {
        println!("Cache is up to date: {}", cache.root().display());
        return Ok(());
    }

    if options.dry_run {
        print_list(
            "Would write",
            &prepared
                .pending_files()
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>(),
        );
        println!("Dry run, nothing written.");
        return Ok(());
    }

    if !options.yes && !confirm("Sync these items?")? {
        println!("Sync cancelled.");
        return Ok(());
    }

    let report = prepared.sync().await.context("Failed to sync cache")?;
    println!(
        "✅ Wrote {} file(s) to {}",
        report.written.len(),
        cache.root().display()
    );

    Ok(())
}

/// `tools/search` → (search, tools); `search` → (search, `kind`).
/// Namespaced references keep their `@registry/` prefix.
fn parse_request(item: &str, kind: Category) -> SyncRequest {
    if let Some((head, name)) = item.split_once('/')
        && let Ok(category) = head.parse::<Category>()
    {
        return SyncRequest::new(name, category);
    }
    SyncRequest::new(item, kind)
}

fn print_plan(plan: &SyncPlan) {
    if plan.to_sync.is_empty() {
        return;
    }
    println!("Items to sync:");
    for item in &plan.to_sync {
        let status = if item.is_new { "new" } else { "changed" };
        println!("  {}/{} ({})", item.kind, item.name, status);
    }
    print_list("Dependencies", &plan.dependencies);
    print_list("Dev dependencies", &plan.dev_dependencies);
}
