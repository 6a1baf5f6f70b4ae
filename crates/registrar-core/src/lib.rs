//! registrar-core
//!
//! Resolves registry items (agents, tools, prompts and shared libraries)
//! together with their transitive registry dependencies, orders them, keeps a
//! content-hashed local cache in sync and writes their files into a project.
//!
//! The pipeline for installing items:
//!
//! 1. [`locator`] classifies each reference and computes where to fetch it
//! 2. [`fetch`] retrieves and validates item documents
//! 3. [`resolve`] walks `registryDependencies`
//! 4. [`graph`] sorts dependencies first and merges files
//! 5. [`transform`] rewrites import prefixes to project aliases
//! 6. [`materialize`] writes files, asking before replacing changed ones
//!
//! [`sync`] reuses steps 1-4 to compare registries against [`cache`].

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod item;
pub mod locator;
pub mod materialize;
pub mod resolve;
pub mod sync;
pub mod transform;

#[cfg(test)]
mod test_support;

pub use cache::{Manifest, RemoteCache};
pub use config::Config;
pub use error::{RegistryError, Result};
pub use fetch::{HttpTransport, RegistryTransport};
pub use graph::{ResolvedTree, resolve_tree};
pub use item::{Category, ItemKind, RegistryItem, RegistryItemFile};
pub use materialize::{MaterializeOptions, MaterializeReport, OverwritePrompt, materialize};
pub use sync::{PreparedSync, SyncPlan, SyncRequest, prepare_sync};
pub use transform::rewrite_imports;
