//! Sync planning
//!
//! [`prepare_sync`] compares what the registries currently serve against the
//! local cache and returns a [`PreparedSync`]: a side-effect-free
//! [`SyncPlan`] to show the user, and a [`PreparedSync::sync`] step that
//! commits it.
//!
//! Each requested item is checked independently and concurrently. One item
//! failing to resolve is logged and left out of the plan; it does not sink the
//! others.

use futures_util::future;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::cache::{RemoteCache, content_hash};
use crate::config::Config;
use crate::error::Result;
use crate::fetch::RegistryTransport;
use crate::graph::{ResolvedFile, ResolvedTree, resolve_tree};
use crate::item::Category;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub name: String,
    pub category: Category,
}

impl SyncRequest {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncItem {
    pub name: String,
    pub kind: Category,
    pub is_new: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPlan {
    pub to_sync: Vec<SyncItem>,
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
    pub needs_sync: bool,
}

/// A plan plus the writes needed to commit it
#[derive(Debug)]
pub struct PreparedSync {
    pub plan: SyncPlan,
    cache: RemoteCache,
    writes: Vec<PendingWrite>,
}

#[derive(Debug, Clone)]
struct PendingWrite {
    path: String,
    content: String,
}

/// What [`PreparedSync::sync`] changed on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Cache-relative paths that were written
    pub written: Vec<String>,
}

/// Outcome of checking one requested item against the cache
struct ItemCheck {
    tree: ResolvedTree,
    status: Option<SyncItem>,
    writes: Vec<PendingWrite>,
}

/// Compute what syncing `requests` into `cache` would change
pub async fn prepare_sync(
    requests: &[SyncRequest],
    config: &Config,
    transport: &dyn RegistryTransport,
    cache: &RemoteCache,
) -> Result<PreparedSync> {
    let checks = future::join_all(
        requests
            .iter()
            .map(|request| check_item(request, config, transport, cache)),
    )
    .await;

    let mut plan = SyncPlan::default();
    let mut writes = Vec::new();
    let mut seen_dependencies = HashSet::new();
    let mut seen_dev_dependencies = HashSet::new();
    let mut seen_writes = HashSet::new();

    for (request, check) in requests.iter().zip(checks) {
        let check = match check {
            Ok(check) => check,
            Err(e) => {
                warn!("Skipping {}/{}: {}", request.category, request.name, e);
                continue;
            }
        };

        for dependency in check.tree.dependencies {
            if seen_dependencies.insert(dependency.clone()) {
                plan.dependencies.push(dependency);
            }
        }
        for dependency in check.tree.dev_dependencies {
            if seen_dev_dependencies.insert(dependency.clone()) {
                plan.dev_dependencies.push(dependency);
            }
        }

        if let Some(status) = check.status {
            plan.to_sync.push(status);
            for write in check.writes {
                if seen_writes.insert(write.path.clone()) {
                    writes.push(write);
                }
            }
        }
    }

    plan.needs_sync = !plan.to_sync.is_empty();
    debug!(
        "Sync plan: {} item(s) to sync, {} file(s) to write",
        plan.to_sync.len(),
        writes.len()
    );

    Ok(PreparedSync {
        plan,
        cache: cache.clone(),
        writes,
    })
}

async fn check_item(
    request: &SyncRequest,
    config: &Config,
    transport: &dyn RegistryTransport,
    cache: &RemoteCache,
) -> Result<ItemCheck> {
    let tree = resolve_tree(
        std::slice::from_ref(&request.name),
        request.category,
        config,
        transport,
    )
    .await?;

    let mut check = ItemCheck {
        tree,
        status: None,
        writes: Vec::new(),
    };

    if check.tree.files.is_empty() {
        debug!("{} has no files, nothing to sync", request.name);
        return Ok(check);
    }

    let Some(root_name) = check
        .tree
        .order
        .iter()
        .find(|o| o.source == request.name)
        .map(|o| o.name.clone())
    else {
        return Ok(check);
    };
    let main_paths = ["ts", "tsx"].map(|ext| format!("{}/{}.{}", request.category, root_name, ext));
    let Some(main_file) = check
        .tree
        .files
        .iter()
        .find(|f| main_paths.contains(&f.file.path))
    else {
        warn!(
            "{} has no {} or {}, leaving it out of the sync plan",
            request.name, main_paths[0], main_paths[1]
        );
        return Ok(check);
    };

    let main_cache_path = cache_path(main_file, request.category)?;
    let is_new = cache.read(&main_cache_path).await?.is_none();

    for resolved in &check.tree.files {
        let Some(content) = &resolved.file.content else {
            continue;
        };
        let path = cache_path(resolved, request.category)?;
        if cache.cached_hash(&path).await? != Some(content_hash(content)) {
            check.writes.push(PendingWrite {
                path,
                content: content.clone(),
            });
        }
    }

    if is_new || !check.writes.is_empty() {
        check.status = Some(SyncItem {
            name: request.name.clone(),
            kind: request.category,
            is_new,
        });
    }

    Ok(check)
}

/// Cache-relative location of a resolved file: `{category}/{relative path}`
fn cache_path(resolved: &ResolvedFile, requested: Category) -> Result<String> {
    Ok(format!(
        "{}/{}",
        resolved.file.category(requested),
        resolved.file.contained_relative_path()?
    ))
}

impl PreparedSync {
    /// Files that [`sync`](Self::sync) would write, cache-relative
    pub fn pending_files(&self) -> Vec<&str> {
        self.writes.iter().map(|w| w.path.as_str()).collect()
    }

    /// Commit the plan: write changed files and merge the manifest
    pub async fn sync(self) -> Result<SyncReport> {
        self.cache.ensure_layout().await?;

        let mut report = SyncReport::default();
        for write in &self.writes {
            self.cache.write(&write.path, &write.content).await?;
            report.written.push(write.path.clone());
        }

        let mut manifest = self.cache.load_manifest().await?;
        manifest.merge(&self.plan.dependencies, &self.plan.dev_dependencies);
        self.cache.save_manifest(&manifest).await?;

        info!(
            "Synced {} item(s), wrote {} file(s) to {}",
            self.plan.to_sync.len(),
            report.written.len(),
            self.cache.root().display()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryTransport, default_url, item_with_files, test_config};
    use tempfile::TempDir;

    fn foo_registry() -> MemoryTransport {
        MemoryTransport::new()
            .with_default(
                "tools",
                "foo",
                item_with_files(
                    "foo",
                    "registry:tool",
                    &["bar"],
                    &[("tools/foo.ts", "export const foo = 1;\n")],
                ),
            )
            .with_default(
                "tools",
                "bar",
                item_with_files(
                    "bar",
                    "registry:lib",
                    &[],
                    &[("tools/lib/bar.ts", "export const bar = 1;\n")],
                ),
            )
    }

    fn requests() -> Vec<SyncRequest> {
        vec![SyncRequest::new("foo", Category::Tools)]
    }

    #[tokio::test]
    async fn test_clean_cache_then_resync() {
        let temp = TempDir::new().unwrap();
        let cache = RemoteCache::new(temp.path());
        let transport = foo_registry();
        let config = test_config();

        let prepared = prepare_sync(&requests(), &config, &transport, &cache)
            .await
            .unwrap();
        assert_eq!(
            prepared.plan.to_sync,
            vec![SyncItem {
                name: "foo".to_string(),
                kind: Category::Tools,
                is_new: true,
            }]
        );
        assert!(prepared.plan.needs_sync);
        assert_eq!(prepared.pending_files(), vec!["tools/lib/bar.ts", "tools/foo.ts"]);

        prepared.sync().await.unwrap();
        assert!(temp.path().join("tools/foo.ts").is_file());
        assert!(temp.path().join("agents").is_dir());

        let again = prepare_sync(&requests(), &config, &transport, &cache)
            .await
            .unwrap();
        assert!(again.plan.to_sync.is_empty());
        assert!(!again.plan.needs_sync);
    }

    #[tokio::test]
    async fn test_changed_remote_file_is_detected() {
        let temp = TempDir::new().unwrap();
        let cache = RemoteCache::new(temp.path());
        let transport = foo_registry();
        let config = test_config();

        prepare_sync(&requests(), &config, &transport, &cache)
            .await
            .unwrap()
            .sync()
            .await
            .unwrap();

        transport.set(
            &default_url("tools", "bar"),
            item_with_files(
                "bar",
                "registry:lib",
                &[],
                &[("tools/lib/bar.ts", "export const bar = 2;\n")],
            ),
        );

        let prepared = prepare_sync(&requests(), &config, &transport, &cache)
            .await
            .unwrap();
        assert_eq!(prepared.plan.to_sync.len(), 1);
        assert!(!prepared.plan.to_sync[0].is_new);
        assert_eq!(prepared.pending_files(), vec!["tools/lib/bar.ts"]);
    }

    #[tokio::test]
    async fn test_deleted_main_file_reports_new() {
        let temp = TempDir::new().unwrap();
        let cache = RemoteCache::new(temp.path());
        let transport = foo_registry();
        let config = test_config();

        prepare_sync(&requests(), &config, &transport, &cache)
            .await
            .unwrap()
            .sync()
            .await
            .unwrap();
        std::fs::remove_file(temp.path().join("tools/foo.ts")).unwrap();

        let prepared = prepare_sync(&requests(), &config, &transport, &cache)
            .await
            .unwrap();
        assert!(prepared.plan.to_sync[0].is_new);
        assert_eq!(prepared.pending_files(), vec!["tools/foo.ts"]);
    }

    #[tokio::test]
    async fn test_failing_item_is_isolated() {
        let temp = TempDir::new().unwrap();
        let cache = RemoteCache::new(temp.path());
        let transport = foo_registry();

        let prepared = prepare_sync(
            &[
                SyncRequest::new("missing", Category::Tools),
                SyncRequest::new("foo", Category::Tools),
            ],
            &test_config(),
            &transport,
            &cache,
        )
        .await
        .unwrap();

        let names: Vec<_> = prepared.plan.to_sync.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["foo"]);
    }

    #[tokio::test]
    async fn test_item_without_main_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let cache = RemoteCache::new(temp.path());
        let transport = MemoryTransport::new().with_default(
            "prompts",
            "odd",
            item_with_files("odd", "registry:prompt", &[], &[("prompts/other.md", "hi")]),
        );

        let prepared = prepare_sync(
            &[SyncRequest::new("odd", Category::Prompts)],
            &test_config(),
            &transport,
            &cache,
        )
        .await
        .unwrap();
        assert!(!prepared.plan.needs_sync);
        assert!(prepared.pending_files().is_empty());
    }

    #[tokio::test]
    async fn test_tsx_main_file_is_planned() {
        let temp = TempDir::new().unwrap();
        let cache = RemoteCache::new(temp.path());
        let transport = MemoryTransport::new().with_default(
            "agents",
            "chat",
            item_with_files(
                "chat",
                "registry:agent",
                &[],
                &[("agents/chat.tsx", "export const Chat = () => null;\n")],
            ),
        );

        let prepared = prepare_sync(
            &[SyncRequest::new("chat", Category::Agents)],
            &test_config(),
            &transport,
            &cache,
        )
        .await
        .unwrap();
        assert!(prepared.plan.to_sync[0].is_new);
        assert_eq!(prepared.pending_files(), vec!["agents/chat.tsx"]);
    }

    #[tokio::test]
    async fn test_escaping_file_path_is_never_written() {
        let temp = TempDir::new().unwrap();
        let cache = RemoteCache::new(temp.path().join("cache"));
        let transport = MemoryTransport::new()
            .with_default(
                "tools",
                "evil",
                item_with_files(
                    "evil",
                    "registry:tool",
                    &[],
                    &[
                        ("tools/evil.ts", "export const evil = 1;\n"),
                        ("tools/../../escaped.ts", "pwned\n"),
                    ],
                ),
            )
            .with_default(
                "tools",
                "foo",
                item_with_files("foo", "registry:tool", &[], &[("tools/foo.ts", "foo\n")]),
            );

        let prepared = prepare_sync(
            &[
                SyncRequest::new("evil", Category::Tools),
                SyncRequest::new("foo", Category::Tools),
            ],
            &test_config(),
            &transport,
            &cache,
        )
        .await
        .unwrap();
        let names: Vec<_> = prepared.plan.to_sync.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["foo"]);
        assert_eq!(prepared.pending_files(), vec!["tools/foo.ts"]);

        prepared.sync().await.unwrap();
        assert!(temp.path().join("cache/tools/foo.ts").is_file());
        assert!(!temp.path().join("escaped.ts").exists());
        assert!(!temp.path().join("cache/tools/evil.ts").exists());
    }

    #[tokio::test]
    async fn test_dependencies_aggregate_and_reach_manifest() {
        let temp = TempDir::new().unwrap();
        let cache = RemoteCache::new(temp.path());
        let mut foo: serde_json::Value = serde_json::from_str(&item_with_files(
            "foo",
            "registry:tool",
            &[],
            &[("tools/foo.ts", "foo")],
        ))
        .unwrap();
        foo["dependencies"] = serde_json::json!(["zod@^3", "@scope/pkg"]);
        foo["devDependencies"] = serde_json::json!(["vitest@1"]);
        let mut baz = foo.clone();
        baz["name"] = "baz".into();
        baz["files"][0]["path"] = "tools/baz.ts".into();

        let transport = MemoryTransport::new()
            .with_default("tools", "foo", foo.to_string())
            .with_default("tools", "baz", baz.to_string());

        let prepared = prepare_sync(
            &[
                SyncRequest::new("foo", Category::Tools),
                SyncRequest::new("baz", Category::Tools),
            ],
            &test_config(),
            &transport,
            &cache,
        )
        .await
        .unwrap();
        assert_eq!(prepared.plan.dependencies, vec!["zod@^3", "@scope/pkg"]);
        assert_eq!(prepared.plan.dev_dependencies, vec!["vitest@1"]);

        prepared.sync().await.unwrap();
        let manifest = cache.load_manifest().await.unwrap();
        assert_eq!(manifest.dependencies["zod"], "^3");
        assert_eq!(manifest.dependencies["@scope/pkg"], "latest");
        assert_eq!(manifest.dev_dependencies["vitest"], "1");
    }
}
