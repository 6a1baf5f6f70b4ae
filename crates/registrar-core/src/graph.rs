//! Dependency graph ordering and merge
//!
//! Turns the flat, tagged output of the resolver into a [`ResolvedTree`]:
//! items sorted so every dependency precedes its dependents, package
//! dependencies concatenated, files deduplicated by install path, and docs
//! joined.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::warn;

use crate::config::Config;
use crate::error::Result;
use crate::fetch::RegistryTransport;
use crate::item::{Category, RegistryItemFile};
use crate::locator::ItemReference;
use crate::resolve::{ResolvedItem, resolve_items};

const NODE_ID_LEN: usize = 12;

/// Short stable identity for an item within one resolution
pub fn node_id(name: &str, source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    hasher.update(source.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(NODE_ID_LEN);
    hex
}

/// One entry of the linearized item order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderedItem {
    pub name: String,
    pub source: String,
    pub id: String,
}

/// A surviving file, tagged with the item that contributed it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFile {
    #[serde(flatten)]
    pub file: RegistryItemFile,
    pub item: String,
    pub source: String,
}

/// Merged result of resolving a set of requested items
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTree {
    pub order: Vec<OrderedItem>,
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
    pub files: Vec<ResolvedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    /// Sources of items that could not be linearized
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stuck: Vec<String>,
    /// Dependency chains the resolver found looping back onto themselves
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cycles: Vec<Vec<String>>,
}

/// Resolve `names`, order the result and merge it
pub async fn resolve_tree(
    names: &[String],
    category: Category,
    config: &Config,
    transport: &dyn RegistryTransport,
) -> Result<ResolvedTree> {
    let resolution = resolve_items(names, category, config, transport).await?;
    let mut tree = merge(&resolution.items);
    tree.cycles = resolution.cycles;
    Ok(tree)
}

/// Topologically sort `items` by their registry dependencies.
///
/// Returns indices into `items`: the linearized prefix, then any nodes left
/// stuck in a cycle, in resolution order. The second value holds the stuck
/// indices on their own.
pub fn topological_order(items: &[ResolvedItem]) -> (Vec<usize>, Vec<usize>) {
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut in_degree = vec![0usize; items.len()];
    let mut edges = HashSet::new();

    for (dependent, resolved) in items.iter().enumerate() {
        for reference in &resolved.item.registry_dependencies {
            let Some(dependency) = match_reference(items, reference, dependent) else {
                continue;
            };
            if edges.insert((dependency, dependent)) {
                dependents[dependency].push(dependent);
                in_degree[dependent] += 1;
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..items.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(items.len());

    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &next in &dependents[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    let stuck: Vec<usize> = (0..items.len()).filter(|&i| in_degree[i] > 0).collect();
    if !stuck.is_empty() {
        let names: Vec<&str> = stuck.iter().map(|&i| items[i].source.as_str()).collect();
        warn!(
            "Circular registry dependencies among: {}; installing them in resolution order",
            names.join(", ")
        );
        order.extend(&stuck);
    }

    (order, stuck)
}

/// Find the node a dependency reference of `dependent` points at: an exact
/// source match first, then the first node whose name equals the reference's
/// derived name. `dependent` itself is never a candidate.
fn match_reference(items: &[ResolvedItem], reference: &str, dependent: usize) -> Option<usize> {
    let others = || {
        items
            .iter()
            .enumerate()
            .filter(move |&(index, _)| index != dependent)
    };

    if let Some((index, _)) = others().find(|(_, r)| r.source == reference) {
        return Some(index);
    }

    let parsed = ItemReference::parse(reference).ok()?;
    let name = parsed.derived_name();
    others()
        .find(|(_, r)| r.item.name == name)
        .map(|(index, _)| index)
}

/// Order and merge resolved items into a single tree
pub fn merge(items: &[ResolvedItem]) -> ResolvedTree {
    let (order, stuck) = topological_order(items);

    // Earliest-resolved item owns each install path
    let mut owners: HashMap<&str, usize> = HashMap::new();
    for (index, resolved) in items.iter().enumerate() {
        for file in &resolved.item.files {
            owners.entry(file.effective_path()).or_insert(index);
        }
    }

    let mut tree = ResolvedTree::default();
    let mut emitted = HashSet::new();
    let mut docs = Vec::new();

    for &index in &order {
        let resolved = &items[index];
        let item = &resolved.item;

        tree.order.push(OrderedItem {
            name: item.name.clone(),
            source: resolved.source.clone(),
            id: node_id(&item.name, &resolved.source),
        });
        tree.dependencies.extend(item.dependencies.iter().cloned());
        tree.dev_dependencies
            .extend(item.dev_dependencies.iter().cloned());

        for file in &item.files {
            let path = file.effective_path();
            if owners.get(path) == Some(&index) && emitted.insert(path) {
                tree.files.push(ResolvedFile {
                    file: file.clone(),
                    item: item.name.clone(),
                    source: resolved.source.clone(),
                });
            }
        }

        if let Some(text) = item.docs.as_deref().filter(|d| !d.trim().is_empty()) {
            docs.push(text);
        }
    }

    tree.docs = (!docs.is_empty()).then(|| docs.join("\n\n"));
    tree.stuck = stuck.iter().map(|&i| items[i].source.clone()).collect();
    tree
}
