//! Config file read/write with backup rotation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::schema::DiagramLensConfig;

const CONFIG_FILE_NAME: &str = "config.yaml";
const MAX_BACKUPS: usize = 3;

/// Resolve the config directory.
/// Priority: `DIAGRAMLENS_CONFIG_DIR` env > `~/.diagramlens/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DIAGRAMLENS_CONFIG_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    match dirs::home_dir() {
        Some(home) => home.join(".diagramlens"),
        None => PathBuf::from(".diagramlens"),
    }
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config. A missing file is an empty config.
pub async fn load_config(path: &Path) -> Result<DiagramLensConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(DiagramLensConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(DiagramLensConfig::default());
    }

    let config: DiagramLensConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Write the config atomically, keeping rolling backups of the old file.
pub async fn write_config(config: &DiagramLensConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    if path.exists() {
        rotate_backups(path).await;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

/// config.yaml.bak.1 → .bak.2 → ... → .bak.N, then copy the current file to .bak.1
async fn rotate_backups(path: &Path) {
    for i in (1..MAX_BACKUPS).rev() {
        let old = path.with_extension(format!("yaml.bak.{i}"));
        let new = path.with_extension(format!("yaml.bak.{}", i + 1));
        if old.exists() {
            if let Err(e) = fs::rename(&old, &new).await {
                warn!(backup = %old.display(), error = %e, "Failed to rotate config backup");
            }
        }
    }

    let bak = path.with_extension("yaml.bak.1");
    if let Err(e) = fs::copy(path, &bak).await {
        warn!(backup = %bak.display(), error = %e, "Failed to back up config");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{QuizConfig, ServerConfig};

    #[tokio::test]
    async fn missing_file_loads_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("nope.yaml")).await.unwrap();
        assert_eq!(cfg, DiagramLensConfig::default());
    }

    #[tokio::test]
    async fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        let cfg = DiagramLensConfig {
            server: Some(ServerConfig {
                port: Some(7000),
                ..Default::default()
            }),
            quiz: Some(QuizConfig {
                question_count: Some(4),
            }),
            ..Default::default()
        };
        write_config(&cfg, &path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("questionCount: 4"));
        assert_eq!(load_config(&path).await.unwrap(), cfg);
        assert!(!path.with_extension("yaml.tmp").exists());
    }

    #[tokio::test]
    async fn overwrite_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        write_config(&DiagramLensConfig::default(), &path).await.unwrap();
        write_config(&DiagramLensConfig::default(), &path).await.unwrap();
        assert!(path.with_extension("yaml.bak.1").exists());
    }

    #[tokio::test]
    async fn invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(&path, "server: [not, a, map").unwrap();
        let err = load_config(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config YAML"));
    }
}
