use anyhow::{Context, Result};
use registrar_core::config::{ProjectConfig, get_config_path, save_project_config};
use std::path::Path;

use super::project_root;

/// Write a default `registrar.toml` into the project at `cwd`
pub fn run(cwd: &Path, force: bool) -> Result<()> {
    let root = project_root(cwd)?;
    let path = get_config_path(&root);

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists, use --force to overwrite",
            path.display()
        );
    }

    // A project with tsconfig.json or a src/ directory gets matching defaults
    let config = ProjectConfig {
        typescript: root.join("tsconfig.json").exists() || !root.join("package.json").exists(),
        src_dir: root.join("src").is_dir(),
        ..Default::default()
    };

    save_project_config(&root, &config).context("Failed to write registrar.toml")?;

    println!("✅ Created {}", path.display());
    Ok(())
}
