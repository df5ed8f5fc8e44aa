use std::path::Path;

use anyhow::{bail, Result};
use diagramlens_config::{apply_all_defaults, collect_redacted_paths, write_config, DiagramLensConfig};

use crate::terminal_output::{note_info, note_success};

/// Print the effective config (file, environment and defaults merged),
/// with secrets masked.
pub fn show(config: &DiagramLensConfig, path: &Path) -> Result<()> {
    note_info(&format!("Config file: {}", path.display()));
    let raw = serde_json::to_value(config)?;
    let masked = collect_redacted_paths(&raw);
    if !masked.is_empty() {
        note_info(&format!("Masked: {}", masked.join(", ")));
    }
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}

pub async fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    write_config(&default_config(), path).await?;
    note_success(&format!("Wrote default config to {}", path.display()));
    Ok(())
}

fn default_config() -> DiagramLensConfig {
    apply_all_defaults(DiagramLensConfig::default())
}
