use anyhow::Result;
use registrar_core::config::{DEFAULT_REGISTRY_URL, RegistrySource};
use std::path::Path;

use super::load_config;

/// Print the built-in default registry and every configured namespace
pub fn list(cwd: &Path) -> Result<()> {
    let config = load_config(cwd)?;

    println!("Default registry (bare names):");
    println!("  {}", DEFAULT_REGISTRY_URL);
    println!();

    if config.registries.is_empty() {
        println!("No namespaced registries configured.");
        println!("\nTo add one, edit registrar.toml:");
        println!("  [registries]");
        println!("  \"@acme\" = \"https://registry.acme.dev/{{type}}/{{name}}.json\"");
        return Ok(());
    }

    println!("Registries:");
    for (name, source) in &config.registries {
        match source {
            RegistrySource::Template(template) => println!("  {} → {}", name, template),
            RegistrySource::Detailed {
                url,
                params,
                headers,
            } => {
                println!("  {} → {}", name, url);
                if !params.is_empty() {
                    let keys: Vec<&str> = params.keys().map(String::as_str).collect();
                    println!("      params: {}", keys.join(", "));
                }
                if !headers.is_empty() {
                    let keys: Vec<&str> = headers.keys().map(String::as_str).collect();
                    println!("      headers: {}", keys.join(", "));
                }
            }
        }
    }

    Ok(())
}
