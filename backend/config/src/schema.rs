//! DiagramLens runtime configuration schema.
//!
//! Every field is optional in the file; `defaults::apply_all_defaults`
//! fills the gaps and the accessors below fall back to the same constants.

use serde::{Deserialize, Serialize};

use crate::defaults::*;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramLensConfig {
    /// HTTP server and session limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Which model to call and how
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Model-backed requests allowed per client IP per minute. 0 disables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_minute: Option<u32>,
    /// Idle time after which a study session is dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_ttl_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sessions: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// gemini | openai | openrouter | ollama | mock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Empty or absent uses the provider's default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_history_turns: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for rolling log files. Console only when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

impl DiagramLensConfig {
    pub fn bind(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.bind.as_deref())
            .unwrap_or(DEFAULT_BIND)
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(DEFAULT_PORT)
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.server
            .as_ref()
            .and_then(|s| s.rate_limit_per_minute)
            .unwrap_or(DEFAULT_RATE_LIMIT_PER_MINUTE)
    }

    pub fn session_ttl_secs(&self) -> u64 {
        self.server
            .as_ref()
            .and_then(|s| s.session_ttl_secs)
            .unwrap_or(DEFAULT_SESSION_TTL_SECS)
    }

    pub fn max_sessions(&self) -> usize {
        self.server
            .as_ref()
            .and_then(|s| s.max_sessions)
            .unwrap_or(DEFAULT_MAX_SESSIONS)
    }

    pub fn provider(&self) -> &str {
        self.model
            .as_ref()
            .and_then(|m| m.provider.as_deref())
            .unwrap_or(DEFAULT_PROVIDER)
    }

    /// Configured model name, `None` for the provider default.
    pub fn model_name(&self) -> Option<&str> {
        self.model
            .as_ref()
            .and_then(|m| m.model.as_deref())
            .filter(|m| !m.trim().is_empty())
    }

    pub fn temperature(&self) -> f32 {
        self.model
            .as_ref()
            .and_then(|m| m.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.model
            .as_ref()
            .and_then(|m| m.max_output_tokens)
            .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.model
            .as_ref()
            .and_then(|m| m.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.upload
            .as_ref()
            .and_then(|u| u.max_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn question_count(&self) -> u32 {
        self.quiz
            .as_ref()
            .and_then(|q| q.question_count)
            .unwrap_or(DEFAULT_QUESTION_COUNT)
    }

    pub fn max_history_turns(&self) -> usize {
        self.chat
            .as_ref()
            .and_then(|c| c.max_history_turns)
            .unwrap_or(DEFAULT_MAX_HISTORY_TURNS)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.dir.as_deref())
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
server:
  port: 9000
  rateLimitPerMinute: 5
model:
  provider: openai
  maxOutputTokens: 2048
quiz:
  questionCount: 3
"#;
        let cfg: DiagramLensConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.port(), 9000);
        assert_eq!(cfg.rate_limit_per_minute(), 5);
        assert_eq!(cfg.provider(), "openai");
        assert_eq!(cfg.max_output_tokens(), 2048);
        assert_eq!(cfg.question_count(), 3);
        assert_eq!(cfg.bind(), DEFAULT_BIND);
    }

    #[test]
    fn blank_model_name_means_provider_default() {
        let cfg = DiagramLensConfig {
            model: Some(ModelConfig {
                model: Some("  ".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(cfg.model_name(), None);
    }

    #[test]
    fn empty_sections_are_not_serialized() {
        let yaml = serde_yaml::to_string(&DiagramLensConfig::default()).unwrap();
        assert_eq!(yaml.trim(), "{}");
    }
}
