//! Dependency resolution
//!
//! Walks `registryDependencies` from a set of requested root references and
//! returns every reachable item exactly once, tagged with the reference string
//! it was fetched by.
//!
//! One seen-set of reference strings is shared across the whole walk, so each
//! reference is fetched at most once and both cycles and diamonds
//! (A→B→D, A→C→D) terminate. Once the walk is done, a depth-first pass over
//! the fetched items with a path stack tells the two apart: reaching a
//! reference that is still on the stack is a cycle and is reported, reaching
//! one that is finished is a diamond and is silently fine.
//!
//! Root fetch failures are fatal. Failures fetching a bare-name dependency are
//! logged and the dependency is dropped; namespaced, URL and local-file
//! dependencies must resolve.

use futures_util::future::{self, BoxFuture};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{RegistryError, Result};
use crate::fetch::{RegistryTransport, fetch_item, fetch_items};
use crate::item::{Category, RegistryItem};
use crate::locator::ItemReference;

/// An item together with the reference it was fetched by
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedItem {
    pub item: RegistryItem,
    pub source: String,
}

/// Output of [`resolve_items`], in resolution order
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Roots first, then dependencies in discovery order
    pub items: Vec<ResolvedItem>,
    /// Reference chains that loop back onto themselves, e.g. `[a, b, a]`
    pub cycles: Vec<Vec<String>>,
}

struct Walk<'a> {
    category: Category,
    config: &'a Config,
    transport: &'a dyn RegistryTransport,
    seen: HashSet<String>,
    items: Vec<ResolvedItem>,
}

/// Resolve `names` and everything they transitively depend on
pub async fn resolve_items(
    names: &[String],
    category: Category,
    config: &Config,
    transport: &dyn RegistryTransport,
) -> Result<Resolution> {
    let mut seen = HashSet::new();
    let roots: Vec<String> = names
        .iter()
        .filter(|name| seen.insert(name.to_string()))
        .cloned()
        .collect();

    let fetched = fetch_items(&roots, category, config, transport).await?;

    let mut walk = Walk {
        category,
        config,
        transport,
        seen,
        items: roots
            .into_iter()
            .zip(fetched)
            .map(|(source, item)| ResolvedItem { item, source })
            .collect(),
    };

    for index in 0..walk.items.len() {
        let dependencies = walk.items[index].item.registry_dependencies.clone();
        walk.expand(dependencies).await?;
    }

    debug!(
        "Resolved {} item(s) from {} root(s)",
        walk.items.len(),
        names.len()
    );

    let cycles = find_cycles(&walk.items);
    Ok(Resolution {
        items: walk.items,
        cycles,
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Every reference chain among `items` that loops back onto itself, found by
/// following `registryDependencies` that name another item's source.
fn find_cycles(items: &[ResolvedItem]) -> Vec<Vec<String>> {
    let index: HashMap<&str, usize> = items
        .iter()
        .enumerate()
        .map(|(i, r)| (r.source.as_str(), i))
        .collect();
    let edges: Vec<Vec<usize>> = items
        .iter()
        .map(|r| {
            r.item
                .registry_dependencies
                .iter()
                .filter_map(|reference| index.get(reference.as_str()).copied())
                .collect()
        })
        .collect();

    let mut marks = vec![Mark::Unvisited; items.len()];
    let mut stack = Vec::new();
    let mut cycles = Vec::new();
    for start in 0..items.len() {
        if marks[start] == Mark::Unvisited {
            visit(start, &edges, &mut marks, &mut stack, &mut cycles);
        }
    }

    cycles
        .into_iter()
        .map(|chain: Vec<usize>| {
            let chain: Vec<String> = chain.iter().map(|&i| items[i].source.clone()).collect();
            warn!("Dependency cycle: {}", chain.join(" → "));
            chain
        })
        .collect()
}

fn visit(
    node: usize,
    edges: &[Vec<usize>],
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
    cycles: &mut Vec<Vec<usize>>,
) {
    marks[node] = Mark::OnStack;
    stack.push(node);

    for &next in &edges[node] {
        match marks[next] {
            Mark::Unvisited => visit(next, edges, marks, stack, cycles),
            Mark::OnStack => {
                if let Some(start) = stack.iter().position(|&n| n == next) {
                    let mut chain = stack[start..].to_vec();
                    chain.push(next);
                    cycles.push(chain);
                }
            }
            Mark::Done => {}
        }
    }

    stack.pop();
    marks[node] = Mark::Done;
}

impl Walk<'_> {
    /// Fetch the unseen `dependencies` of an item, append them, then expand
    /// each of them in turn.
    fn expand(&mut self, dependencies: Vec<String>) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut fresh = Vec::new();
            for reference in dependencies {
                let parsed = ItemReference::parse(&reference)?;

                if let ItemReference::Namespaced { registry, .. } = &parsed
                    && self.config.registry(registry).is_none()
                {
                    return Err(RegistryError::RegistryNotConfigured {
                        registry: registry.clone(),
                        reference,
                    });
                }

                if !self.seen.insert(reference.clone()) {
                    debug!("Already resolved {}", reference);
                    continue;
                }

                fresh.push((reference, parsed));
            }

            let (category, config, transport) = (self.category, self.config, self.transport);
            let results = future::join_all(
                fresh
                    .iter()
                    .map(|(reference, _)| fetch_item(reference, category, config, transport)),
            )
            .await;

            let start = self.items.len();
            for ((reference, parsed), result) in fresh.into_iter().zip(results) {
                match result {
                    Ok(item) => self.items.push(ResolvedItem {
                        item,
                        source: reference,
                    }),
                    Err(e) if parsed.is_bare() => {
                        warn!("Skipping dependency '{}': {}", reference, e);
                    }
                    Err(e) => return Err(e),
                }
            }

            for index in start..self.items.len() {
                let dependencies = self.items[index].item.registry_dependencies.clone();
                self.expand(dependencies).await?;
            }

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistrySource;
    use crate::test_support::{MemoryTransport, default_url, item_json, test_config};

    fn sources(resolution: &Resolution) -> Vec<&str> {
        resolution.items.iter().map(|r| r.source.as_str()).collect()
    }

    #[tokio::test]
    async fn test_resolves_transitive_dependencies() {
        let transport = MemoryTransport::new()
            .with_default("tools", "b", item_json("b", "registry:tool", &["a"]))
            .with_default("tools", "a", item_json("a", "registry:tool", &[]));

        let resolution = resolve_items(
            &["b".to_string()],
            Category::Tools,
            &test_config(),
            &transport,
        )
        .await
        .unwrap();

        assert_eq!(sources(&resolution), vec!["b", "a"]);
        assert!(resolution.cycles.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_roots_are_fetched_once() {
        let transport = MemoryTransport::new()
            .with_default("tools", "a", item_json("a", "registry:tool", &[]));

        let resolution = resolve_items(
            &["a".to_string(), "a".to_string()],
            Category::Tools,
            &test_config(),
            &transport,
        )
        .await
        .unwrap();

        assert_eq!(sources(&resolution), vec!["a"]);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_diamond_is_fetched_once_and_not_a_cycle() {
        let transport = MemoryTransport::new()
            .with_default("agents", "top", item_json("top", "registry:agent", &["left", "right"]))
            .with_default("agents", "left", item_json("left", "registry:lib", &["base"]))
            .with_default("agents", "right", item_json("right", "registry:lib", &["base"]))
            .with_default("agents", "base", item_json("base", "registry:lib", &[]));

        let resolution = resolve_items(
            &["top".to_string()],
            Category::Agents,
            &test_config(),
            &transport,
        )
        .await
        .unwrap();

        assert_eq!(sources(&resolution), vec!["top", "left", "right", "base"]);
        assert!(resolution.cycles.is_empty());
        assert_eq!(
            transport
                .requests()
                .iter()
                .filter(|url| **url == default_url("agents", "base"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_cycle_terminates_and_is_reported() {
        let transport = MemoryTransport::new()
            .with_default("tools", "a", item_json("a", "registry:tool", &["b"]))
            .with_default("tools", "b", item_json("b", "registry:tool", &["a"]));

        let resolution = resolve_items(
            &["a".to_string()],
            Category::Tools,
            &test_config(),
            &transport,
        )
        .await
        .unwrap();

        assert_eq!(sources(&resolution), vec!["a", "b"]);
        assert_eq!(resolution.cycles, vec![vec!["a", "b", "a"]]);
    }

    #[tokio::test]
    async fn test_cycle_between_siblings_is_reported() {
        let transport = MemoryTransport::new()
            .with_default("tools", "a", item_json("a", "registry:tool", &["b", "c"]))
            .with_default("tools", "b", item_json("b", "registry:lib", &["c"]))
            .with_default("tools", "c", item_json("c", "registry:lib", &["b"]));

        let resolution = resolve_items(
            &["a".to_string()],
            Category::Tools,
            &test_config(),
            &transport,
        )
        .await
        .unwrap();

        assert_eq!(sources(&resolution), vec!["a", "b", "c"]);
        assert_eq!(resolution.cycles, vec![vec!["b", "c", "b"]]);
    }

    #[tokio::test]
    async fn test_cycle_between_roots_is_reported() {
        let transport = MemoryTransport::new()
            .with_default("tools", "a", item_json("a", "registry:tool", &["b"]))
            .with_default("tools", "b", item_json("b", "registry:tool", &["a"]));

        let resolution = resolve_items(
            &["a".to_string(), "b".to_string()],
            Category::Tools,
            &test_config(),
            &transport,
        )
        .await
        .unwrap();

        assert_eq!(sources(&resolution), vec!["a", "b"]);
        assert_eq!(resolution.cycles, vec![vec!["a", "b", "a"]]);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_bare_dependency_is_skipped() {
        let transport = MemoryTransport::new().with_default(
            "tools",
            "a",
            item_json("a", "registry:tool", &["zod", "helper"]),
        )
        .with_default("tools", "helper", item_json("helper", "registry:lib", &[]));

        let resolution = resolve_items(
            &["a".to_string()],
            Category::Tools,
            &test_config(),
            &transport,
        )
        .await
        .unwrap();

        assert_eq!(sources(&resolution), vec!["a", "helper"]);
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let transport = MemoryTransport::new();

        let result = resolve_items(
            &["ghost".to_string()],
            Category::Tools,
            &test_config(),
            &transport,
        )
        .await;

        assert!(matches!(result, Err(RegistryError::Network { .. })));
    }

    #[tokio::test]
    async fn test_unconfigured_namespaced_dependency_fails_fast() {
        let transport = MemoryTransport::new().with_default(
            "tools",
            "a",
            item_json("a", "registry:tool", &["@nowhere/b"]),
        );

        let err = resolve_items(
            &["a".to_string()],
            Category::Tools,
            &test_config(),
            &transport,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::RegistryNotConfigured { ref registry, .. } if registry == "nowhere"
        ));
    }

    #[tokio::test]
    async fn test_missing_namespaced_dependency_is_fatal() {
        let transport = MemoryTransport::new().with_default(
            "tools",
            "a",
            item_json("a", "registry:tool", &["@acme/b"]),
        );
        let mut config = test_config();
        config.registries.insert(
            "@acme".to_string(),
            RegistrySource::Template("https://acme.dev/{name}.json".to_string()),
        );

        let result = resolve_items(&["a".to_string()], Category::Tools, &config, &transport).await;
        assert!(matches!(result, Err(RegistryError::Network { .. })));
    }

    #[tokio::test]
    async fn test_same_name_from_two_registries() {
        let transport = MemoryTransport::new()
            .with_url("https://x.dev/shared.json", item_json("shared", "registry:lib", &[]))
            .with_url("https://y.dev/shared.json", item_json("shared", "registry:lib", &[]));
        let mut config = test_config();
        for key in ["x", "y"] {
            config.registries.insert(
                format!("@{}", key),
                RegistrySource::Template(format!("https://{}.dev/{{name}}.json", key)),
            );
        }

        let resolution = resolve_items(
            &["@x/shared".to_string(), "@y/shared".to_string()],
            Category::Tools,
            &config,
            &transport,
        )
        .await
        .unwrap();

        assert_eq!(sources(&resolution), vec!["@x/shared", "@y/shared"]);
    }
}
