//! Terminal confirmation prompts

use registrar_core::{OverwritePrompt, RegistryError};

/// Shows the diff on stderr and asks on the terminal
pub struct TerminalPrompt;

impl OverwritePrompt for TerminalPrompt {
    fn confirm_overwrite(&self, path: &str, diff: &str) -> registrar_core::Result<bool> {
        eprintln!("\n{}", diff);
        dialoguer::Confirm::new()
            .with_prompt(format!("{} has local changes. Overwrite?", path))
            .default(false)
            .interact()
            .map_err(|e| RegistryError::Prompt(e.to_string()))
    }
}

/// Ask a yes/no question, defaulting to yes
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()?;
    Ok(confirmed)
}
