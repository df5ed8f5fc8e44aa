//! JSON error responses.

use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diagramlens_core::LensError;
use logging::redact_sensitive_data;
use serde_json::json;
use tracing::{error, warn};

/// An error rendered as `{ "error": message }` with a matching status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn too_many_requests() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "too many requests; wait a minute and try again",
        )
    }
}

pub fn status_for(err: &LensError) -> StatusCode {
    match err {
        LensError::InvalidInput(_) | LensError::EmptyUpload | LensError::Quiz(_) => {
            StatusCode::BAD_REQUEST
        }
        LensError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        LensError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        LensError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        LensError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        LensError::Provider { .. } | LensError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        LensError::Config(_) | LensError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Body extraction failures are the client's fault; only an oversized
/// body keeps its own status.
fn rejection_status(status: StatusCode) -> StatusCode {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        status
    } else {
        StatusCode::BAD_REQUEST
    }
}

impl From<LensError> for ApiError {
    fn from(err: LensError) -> Self {
        Self::new(status_for(&err), redact_sensitive_data(&err.to_string()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection_status(rejection.status()), rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::new(rejection_status(rejection.status()), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "Request failed");
        } else {
            warn!(status = %self.status, message = %self.message, "Request rejected");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_statuses() {
        let cases = [
            (LensError::InvalidInput("x".into()), 400),
            (LensError::Quiz("x".into()), 400),
            (LensError::SessionNotFound("x".into()), 404),
            (LensError::PayloadTooLarge { size: 2, limit: 1 }, 413),
            (LensError::UnsupportedMedia("text/plain".into()), 415),
            (LensError::RateLimited("gemini".into()), 429),
            (LensError::provider("gemini", "500"), 502),
            (LensError::MalformedResponse("x".into()), 502),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err).as_u16(), status, "{err}");
        }
    }

    #[test]
    fn provider_messages_are_redacted() {
        let err = LensError::provider(
            "gemini",
            "request to https://example.test/v1?key=AIzaSyA1234567890abcdefghijklmnopqrstu failed",
        );
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert!(!api.message.contains("AIzaSy"), "{}", api.message);
        assert!(api.message.contains("[REDACTED_TOKEN]"));
    }

    #[test]
    fn oversized_body_keeps_its_status() {
        assert_eq!(
            rejection_status(StatusCode::PAYLOAD_TOO_LARGE),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            rejection_status(StatusCode::UNPROCESSABLE_ENTITY),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            rejection_status(StatusCode::UNSUPPORTED_MEDIA_TYPE),
            StatusCode::BAD_REQUEST
        );
    }
}
