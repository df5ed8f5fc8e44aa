use thiserror::Error;

/// Top-level error type for DiagramLens.
#[derive(Debug, Error)]
pub enum LensError {
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("upload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("uploaded file is empty")]
    EmptyUpload,

    #[error("model provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("model provider {0} is rate limiting requests")]
    RateLimited(String),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("quiz error: {0}")]
    Quiz(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LensError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Errors the user can fix by retrying the same action later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. } | Self::RateLimited(_) | Self::MalformedResponse(_)
        )
    }
}

pub type LensResult<T> = Result<T, LensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_are_retryable() {
        assert!(LensError::provider("gemini", "boom").is_retryable());
        assert!(LensError::RateLimited("gemini".into()).is_retryable());
        assert!(!LensError::EmptyUpload.is_retryable());
    }

    #[test]
    fn payload_message_names_both_sizes() {
        let err = LensError::PayloadTooLarge { size: 30, limit: 20 };
        assert_eq!(err.to_string(), "upload of 30 bytes exceeds the 20 byte limit");
    }
}
