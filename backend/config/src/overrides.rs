//! Environment variable overrides, applied after the file is loaded.

use std::collections::HashMap;
use std::str::FromStr;

use diagramlens_providers::ProviderKind;
use tracing::{debug, warn};

use crate::schema::{DiagramLensConfig, ModelConfig, ServerConfig};

pub const ENV_PORT: &str = "DIAGRAMLENS_PORT";
pub const ENV_BIND: &str = "DIAGRAMLENS_BIND";
pub const ENV_PROVIDER: &str = "DIAGRAMLENS_PROVIDER";
pub const ENV_MODEL: &str = "DIAGRAMLENS_MODEL";

/// API key variables consulted per provider, in priority order.
pub fn api_key_vars(kind: ProviderKind) -> &'static [&'static str] {
    match kind {
        ProviderKind::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        ProviderKind::OpenAi => &["OPENAI_API_KEY"],
        ProviderKind::OpenRouter => &["OPENROUTER_API_KEY"],
        ProviderKind::Ollama | ProviderKind::Mock => &[],
    }
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: DiagramLensConfig) -> DiagramLensConfig {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from the given map. Explicit settings in the map win
/// over the file; a key in the file wins over the provider key variables.
pub fn apply_env_overrides_with(
    mut config: DiagramLensConfig,
    env: &HashMap<String, String>,
) -> DiagramLensConfig {
    let get = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(port) = get(ENV_PORT) {
        match port.parse::<u16>() {
            Ok(port) => {
                config.server.get_or_insert_with(ServerConfig::default).port = Some(port);
                debug!(port, "Port overridden from environment");
            }
            Err(_) => warn!(value = %port, "Ignoring invalid DIAGRAMLENS_PORT"),
        }
    }
    if let Some(bind) = get(ENV_BIND) {
        config.server.get_or_insert_with(ServerConfig::default).bind = Some(bind.to_string());
    }
    if let Some(provider) = get(ENV_PROVIDER) {
        config.model.get_or_insert_with(ModelConfig::default).provider = Some(provider.to_string());
    }
    if let Some(model) = get(ENV_MODEL) {
        config.model.get_or_insert_with(ModelConfig::default).model = Some(model.to_string());
    }

    let has_key = config
        .model
        .as_ref()
        .and_then(|m| m.api_key.as_deref())
        .is_some_and(|k| !k.trim().is_empty());
    if !has_key {
        if let Ok(kind) = ProviderKind::from_str(config.provider()) {
            if let Some((var, key)) = api_key_vars(kind)
                .iter()
                .find_map(|&var| get(var).map(|key| (var, key)))
            {
                config.model.get_or_insert_with(ModelConfig::default).api_key = Some(key.to_string());
                debug!(provider = kind.as_str(), var, "API key taken from environment");
            }
        }
    }

    config
}
