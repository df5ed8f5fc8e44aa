//! Session lifecycle: upload an image, fetch the session, end it.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::MultipartRejection},
    http::StatusCode,
};
use diagramlens_core::LensError;
use diagramlens_session::{SessionView, StudySession};
use logging::{StudyEvent, StudyEventLogger, redact_sensitive_data};
use media::ImagePayload;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::parse_session_id;
use crate::error::ApiResult;
use crate::server::GatewayState;

/// Multipart field names accepted for the image.
const IMAGE_FIELDS: &[&str] = &["image", "file"];

struct Upload {
    filename: Option<String>,
    content_type: Option<String>,
    data: axum::body::Bytes,
}

async fn read_image_field(mut multipart: Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart.next_field().await? {
        if !field.name().is_some_and(|n| IMAGE_FIELDS.contains(&n)) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;
        return Ok(Upload {
            filename,
            content_type,
            data,
        });
    }
    Err(LensError::InvalidInput("multipart field 'image' is missing".into()).into())
}

/// Handler for `POST /api/sessions`
///
/// Explains the image, then tries to build a quiz. A quiz failure still
/// creates the session, with `quiz_error` set so the UI can offer a retry.
pub async fn create_session(
    State(state): State<GatewayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let upload = read_image_field(multipart?).await?;
    let image = ImagePayload::from_upload(
        upload.filename.as_deref(),
        upload.content_type.as_deref(),
        upload.data,
        state.options.max_upload_bytes,
    )?;

    let explanation = state.tutor.explain(&image).await?;
    let mut session = StudySession::new(image, explanation);
    let session_id = session.id.to_string();
    StudyEventLogger::log_event(
        &session_id,
        StudyEvent::SessionCreated {
            filename: session.image.filename.clone(),
            mime_type: session.image.mime_type.clone(),
            size_bytes: session.image.size_bytes(),
        },
    );
    StudyEventLogger::log_event(
        &session_id,
        StudyEvent::ExplanationReady {
            provider: state.tutor.provider_name().to_string(),
            model: state.tutor.model_name().to_string(),
        },
    );

    match state
        .tutor
        .generate_quiz(&session.image, &session.explanation, state.options.question_count)
        .await
    {
        Ok(questions) => {
            StudyEventLogger::log_event(
                &session_id,
                StudyEvent::QuizGenerated {
                    questions: questions.len(),
                },
            );
            session.set_quiz(questions);
        }
        Err(e) => {
            let message = redact_sensitive_data(&e.to_string());
            warn!(session = %session_id, error = %message, "Quiz generation failed; session created without quiz");
            StudyEventLogger::log_event(
                &session_id,
                StudyEvent::Error {
                    error_msg: message.clone(),
                },
            );
            session.set_quiz_error(message);
        }
    }

    let view = session.view(true);
    state.sessions.insert(session).await;
    info!(session = %session_id, "Study session created");
    Ok((StatusCode::CREATED, Json(view)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    /// Include the image preview as a data URL.
    #[serde(default)]
    pub image: bool,
}

/// Handler for `GET /api/sessions/:id`
pub async fn get_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<Json<SessionView>> {
    let id = parse_session_id(&id)?;
    Ok(Json(state.sessions.view(&id, query.image).await?))
}

/// Handler for `DELETE /api/sessions/:id`
pub async fn delete_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_session_id(&id)?;
    if !state.sessions.remove(&id).await {
        return Err(LensError::SessionNotFound(id.to_string()).into());
    }
    StudyEventLogger::log_event(&id.to_string(), StudyEvent::SessionClosed);
    Ok(Json(json!({ "deleted": true, "id": id })))
}
