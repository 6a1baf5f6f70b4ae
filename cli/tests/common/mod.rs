//! Common test utilities and fixtures
//!
//! Every test runs against local-file registry items in a temporary
//! directory, so nothing touches the network.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project with an `items/` directory for registry documents
pub struct Fixture {
    pub temp: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        std::fs::create_dir_all(temp.path().join("project")).expect("Failed to create project");
        std::fs::create_dir_all(temp.path().join("items")).expect("Failed to create items dir");
        Self { temp }
    }

    pub fn project(&self) -> PathBuf {
        self.temp.path().join("project")
    }

    pub fn home(&self) -> PathBuf {
        self.temp.path().join("home")
    }

    /// `registrar` with HOME and XDG dirs pointed into the fixture
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("registrar").expect("Binary should build");
        cmd.env("HOME", self.home())
            .env("XDG_CONFIG_HOME", self.home().join(".config"))
            .env("XDG_DATA_HOME", self.home().join(".local/share"))
            .env_remove("RUST_LOG");
        cmd
    }

    /// Write an item document and return its absolute path as a reference
    pub fn write_item(&self, file_name: &str, document: &str) -> String {
        let path = self.temp.path().join("items").join(file_name);
        std::fs::write(&path, document).expect("Failed to write item");
        path.to_string_lossy().into_owned()
    }

    pub fn write_config(&self, content: &str) {
        std::fs::write(self.project().join("registrar.toml"), content)
            .expect("Failed to write registrar.toml");
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.project().join(relative))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative, e))
    }
}

/// Build an item document
pub fn item_json(
    name: &str,
    kind: &str,
    registry_dependencies: &[&str],
    dependencies: &[&str],
    files: &[(&str, &str)],
) -> String {
    let files: Vec<_> = files
        .iter()
        .map(|(path, content)| serde_json::json!({ "path": path, "content": content, "type": kind }))
        .collect();

    serde_json::json!({
        "name": name,
        "type": kind,
        "dependencies": dependencies,
        "registryDependencies": registry_dependencies,
        "files": files,
    })
    .to_string()
}

pub fn exists(root: &Path, relative: &str) -> bool {
    root.join(relative).exists()
}
