//! Config defaults: fills unset values after load.

use crate::schema::{
    ChatConfig, DiagramLensConfig, LoggingConfig, ModelConfig, QuizConfig, ServerConfig,
    UploadConfig,
};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 30;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;
pub const DEFAULT_MAX_SESSIONS: usize = 100;

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_TEMPERATURE: f32 = 0.4;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Gemini's inline-data request ceiling.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_QUESTION_COUNT: u32 = 5;
pub const DEFAULT_MAX_HISTORY_TURNS: usize = 20;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: DiagramLensConfig) -> DiagramLensConfig {
    let config = apply_server_defaults(config);
    let config = apply_model_defaults(config);
    let config = apply_study_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: DiagramLensConfig) -> DiagramLensConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    server
        .rate_limit_per_minute
        .get_or_insert(DEFAULT_RATE_LIMIT_PER_MINUTE);
    server.session_ttl_secs.get_or_insert(DEFAULT_SESSION_TTL_SECS);
    server.max_sessions.get_or_insert(DEFAULT_MAX_SESSIONS);
    config
}

/// The model name stays unset so each provider picks its own default.
fn apply_model_defaults(mut config: DiagramLensConfig) -> DiagramLensConfig {
    let model = config.model.get_or_insert_with(ModelConfig::default);
    model.provider.get_or_insert_with(|| DEFAULT_PROVIDER.to_string());
    model.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    model.max_output_tokens.get_or_insert(DEFAULT_MAX_OUTPUT_TOKENS);
    model.timeout_secs.get_or_insert(DEFAULT_TIMEOUT_SECS);
    config
}

fn apply_study_defaults(mut config: DiagramLensConfig) -> DiagramLensConfig {
    config
        .upload
        .get_or_insert_with(UploadConfig::default)
        .max_bytes
        .get_or_insert(DEFAULT_MAX_UPLOAD_BYTES);
    config
        .quiz
        .get_or_insert_with(QuizConfig::default)
        .question_count
        .get_or_insert(DEFAULT_QUESTION_COUNT);
    config
        .chat
        .get_or_insert_with(ChatConfig::default)
        .max_history_turns
        .get_or_insert(DEFAULT_MAX_HISTORY_TURNS);
    config
}

fn apply_logging_defaults(mut config: DiagramLensConfig) -> DiagramLensConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    config
}
