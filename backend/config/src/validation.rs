//! Config validation with field paths and readable messages.

use std::str::FromStr;

use diagramlens_providers::ProviderKind;
use thiserror::Error;

use crate::defaults::DEFAULT_MAX_UPLOAD_BYTES;
use crate::schema::DiagramLensConfig;

/// Upper bound on quiz length.
pub const MAX_QUESTION_COUNT: u32 = 20;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return every error and warning found.
pub fn validate(config: &DiagramLensConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_model(config, &mut report);
    validate_study(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_server(config: &DiagramLensConfig, report: &mut ValidationReport) {
    let Some(server) = &config.server else { return };
    match server.port {
        Some(0) => report.error("server.port", "port must be between 1 and 65535"),
        Some(port) if port < 1024 => report.warn(
            "server.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        ),
        _ => {}
    }
    if let Some(bind) = &server.bind {
        if bind.parse::<std::net::IpAddr>().is_err() {
            report.error("server.bind", format!("'{bind}' is not an IP address"));
        }
    }
    if server.rate_limit_per_minute == Some(0) {
        report.warn("server.rateLimitPerMinute", "0 disables per-client rate limiting");
    }
    if server.session_ttl_secs == Some(0) {
        report.error("server.sessionTtlSecs", "sessionTtlSecs must be >= 1");
    }
    if server.max_sessions == Some(0) {
        report.error("server.maxSessions", "maxSessions must be >= 1");
    }
}

fn validate_model(config: &DiagramLensConfig, report: &mut ValidationReport) {
    let Some(model) = &config.model else { return };
    match ProviderKind::from_str(config.provider()) {
        Ok(kind) => {
            let has_key = model.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
            if kind.needs_api_key() && !has_key {
                report.warn(
                    "model.apiKey",
                    format!("provider '{}' needs an API key; model calls will fail", kind.as_str()),
                );
            }
        }
        Err(_) => report.error(
            "model.provider",
            format!(
                "Unknown provider '{}'. Use gemini, openai, openrouter, ollama or mock",
                config.provider()
            ),
        ),
    }
    if let Some(t) = model.temperature {
        if !(0.0..=2.0).contains(&t) {
            report.error("model.temperature", "temperature must be between 0 and 2");
        }
    }
    if model.max_output_tokens == Some(0) {
        report.error("model.maxOutputTokens", "maxOutputTokens must be >= 1");
    }
    if model.timeout_secs == Some(0) {
        report.error("model.timeoutSecs", "timeoutSecs must be >= 1");
    }
    if let Some(url) = &model.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("model.baseUrl", "baseUrl must start with http:// or https://");
        }
    }
}

fn validate_study(config: &DiagramLensConfig, report: &mut ValidationReport) {
    match config.upload.as_ref().and_then(|u| u.max_bytes) {
        Some(0) => report.error("upload.maxBytes", "maxBytes must be >= 1"),
        Some(n) if n > DEFAULT_MAX_UPLOAD_BYTES => report.warn(
            "upload.maxBytes",
            "images larger than 20 MiB are usually rejected by inline model APIs",
        ),
        _ => {}
    }
    if let Some(count) = config.quiz.as_ref().and_then(|q| q.question_count) {
        if count == 0 || count > MAX_QUESTION_COUNT {
            report.error(
                "quiz.questionCount",
                format!("questionCount must be between 1 and {MAX_QUESTION_COUNT}"),
            );
        }
    }
    if config.chat.as_ref().and_then(|c| c.max_history_turns) == Some(0) {
        report.warn("chat.maxHistoryTurns", "0 sends no chat history to the model");
    }
}

fn validate_logging(config: &DiagramLensConfig, report: &mut ValidationReport) {
    let Some(level) = config.logging.as_ref().and_then(|l| l.level.as_deref()) else {
        return;
    };
    if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        report.error(
            "logging.level",
            format!("Unknown log level '{level}'. Use trace, debug, info, warn or error"),
        );
    }
}
