//! `diagramlens-config`: runtime configuration.
//!
//! Provides:
//! - Typed config schema with defaults
//! - YAML read/write with backup rotation
//! - `${ENV_VAR}` substitution and environment overrides
//! - Redaction for display
//! - Validation with a report of errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod overrides;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use overrides::{apply_env_overrides, apply_env_overrides_with};
pub use redact::{collect_redacted_paths, redact};
pub use schema::DiagramLensConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use diagramlens_core::LensResult;
use diagramlens_providers::{ProviderKind, ProviderSettings};

/// Load a config file, substitute `${VAR}` references, apply environment
/// overrides and defaults, then validate. Validation errors abort.
pub async fn load_and_prepare(path: &Path) -> Result<DiagramLensConfig> {
    let raw = load_config(path).await?;
    let config = prepare(raw)?;

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        bail!(first);
    }
    Ok(config)
}

/// The in-memory part of `load_and_prepare`, without validation.
pub fn prepare(raw: DiagramLensConfig) -> Result<DiagramLensConfig> {
    let value = serde_json::to_value(&raw).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: DiagramLensConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    Ok(apply_all_defaults(apply_env_overrides(config)))
}

impl DiagramLensConfig {
    /// Provider construction settings derived from the `model` section.
    pub fn provider_settings(&self) -> LensResult<ProviderSettings> {
        let kind = ProviderKind::from_str(self.provider())?;
        let model = self.model.as_ref();
        Ok(ProviderSettings {
            kind,
            api_key: model.and_then(|m| m.api_key.clone()).filter(|k| !k.trim().is_empty()),
            base_url: model.and_then(|m| m.base_url.clone()),
            model: self.model_name().map(str::to_string),
            timeout: Duration::from_secs(self.timeout_secs()),
        })
    }

    /// A printable copy with secrets masked.
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::to_value(self)
            .map(|v| redact(&v))
            .unwrap_or(serde_json::Value::Null)
    }
}
