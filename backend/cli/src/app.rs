//! Wiring shared by the subcommands: config, logging, provider, images.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use diagramlens_config::{config_dir, config_file_path, load_and_prepare, DiagramLensConfig};
use diagramlens_gateway::{shutdown_signal, start_server, GatewayOptions, GatewayState};
use diagramlens_providers::build_provider;
use diagramlens_session::SessionStore;
use diagramlens_understanding::{DiagramTutor, GenerationSettings};
use media::ImagePayload;
use tracing::info;

pub fn default_config_path() -> PathBuf {
    config_file_path(&config_dir())
}

/// Load the config and start logging according to it.
pub async fn load(path: &Path) -> Result<DiagramLensConfig> {
    let config = load_and_prepare(path).await?;
    logging::init_logger(
        config.log_dir().map(Path::new),
        config.log_level(),
        config.log_json(),
    );
    Ok(config)
}

pub fn generation_settings(config: &DiagramLensConfig) -> GenerationSettings {
    GenerationSettings {
        model: config.model_name().unwrap_or_default().to_string(),
        temperature: config.temperature(),
        max_output_tokens: config.max_output_tokens(),
        max_history_turns: config.max_history_turns(),
    }
}

pub fn build_tutor(config: &DiagramLensConfig) -> Result<DiagramTutor> {
    let provider = build_provider(&config.provider_settings()?)?;
    Ok(DiagramTutor::new(provider, generation_settings(config)))
}

/// Read an image from disk and validate it as an upload would be.
pub async fn load_image(path: &Path, max_bytes: usize) -> Result<ImagePayload> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image: {}", path.display()))?;
    let filename = path.file_name().and_then(|n| n.to_str());
    Ok(ImagePayload::from_upload(
        filename,
        None,
        Bytes::from(data),
        max_bytes,
    )?)
}

pub fn gateway_options(config: &DiagramLensConfig) -> GatewayOptions {
    GatewayOptions {
        max_upload_bytes: config.max_upload_bytes(),
        question_count: config.question_count(),
        session_ttl: Duration::from_secs(config.session_ttl_secs()),
        rate_limit_per_minute: config.rate_limit_per_minute(),
    }
}

pub async fn serve(config: DiagramLensConfig, port: Option<u16>, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.bind().to_string());
    let port = port.unwrap_or_else(|| config.port());
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("Invalid bind address {bind}:{port}"))?;

    let tutor = build_tutor(&config)?;
    info!(
        provider = tutor.provider_name(),
        model = tutor.model_name(),
        %addr,
        "Starting DiagramLens"
    );
    let state = GatewayState::new(
        tutor,
        SessionStore::new(config.max_sessions()),
        gateway_options(&config),
    );
    start_server(addr, state, shutdown_signal()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagramlens_config::schema::{ChatConfig, ModelConfig};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn settings_follow_config() {
        let config = DiagramLensConfig {
            model: Some(ModelConfig {
                provider: Some("mock".into()),
                temperature: Some(0.1),
                ..Default::default()
            }),
            chat: Some(ChatConfig {
                max_history_turns: Some(4),
            }),
            ..Default::default()
        };
        let settings = generation_settings(&config);
        assert_eq!(settings.model, "");
        assert_eq!(settings.temperature, 0.1);
        assert_eq!(settings.max_history_turns, 4);

        let tutor = build_tutor(&config).unwrap();
        assert_eq!(tutor.provider_name(), "mock");
    }

    #[test]
    fn missing_api_key_fails_to_build() {
        let config = DiagramLensConfig {
            model: Some(ModelConfig {
                provider: Some("openai".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(build_tutor(&config).is_err());
    }

    #[tokio::test]
    async fn loads_image_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.png");
        std::fs::write(&path, PNG).unwrap();

        let image = load_image(&path, 1024).await.unwrap();
        assert_eq!(image.filename, "flow.png");
        assert_eq!(image.mime_type, "image/png");

        assert!(load_image(&path, 4).await.is_err());
        assert!(load_image(&dir.path().join("missing.png"), 1024).await.is_err());
    }
}
