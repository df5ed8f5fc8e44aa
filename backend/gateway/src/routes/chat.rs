//! Free-form questions about the session's image.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use diagramlens_core::{LensError, LensResult};
use logging::{StudyEvent, StudyEventLogger};
use markdown::Block;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::parse_session_id;
use crate::error::ApiResult;
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub blocks: Vec<Block>,
    /// Transcript length after the exchange.
    pub turns: usize,
}

/// Handler for `POST /api/sessions/:id/chat`
///
/// The question is recorded before the model call and removed again if
/// the call fails, so a retry never leaves a duplicate behind. A second
/// question on the same session is refused while one is in flight. The
/// model call runs on its own task so the exchange is closed even when
/// the client goes away.
pub async fn ask(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let id = parse_session_id(&id)?;
    let Json(body) = body?;
    let question = body.question.trim().to_string();
    if question.is_empty() {
        return Err(LensError::InvalidInput("question is empty".into()).into());
    }

    let (image, explanation, history) = state
        .sessions
        .with_session_mut(&id, |s| -> LensResult<_> {
            let history = s.begin_chat(question.clone())?;
            Ok((s.image.clone(), s.explanation.clone(), history))
        })
        .await??;

    let exchange = {
        let state = state.clone();
        let question = question.clone();
        tokio::spawn(async move {
            let result = state
                .tutor
                .answer(&image, Some(&explanation), &history, &question)
                .await;
            let answer = result.as_ref().ok().cloned();
            let turns = state
                .sessions
                .with_session_mut(&id, |s| {
                    s.finish_chat(answer);
                    s.chat.len()
                })
                .await;
            (result, turns)
        })
    };
    let (result, turns) = exchange
        .await
        .map_err(|e| LensError::Other(anyhow::anyhow!("chat task failed: {e}")))?;

    let answer = match result {
        Ok(answer) => answer,
        Err(e) => {
            StudyEventLogger::log_event(
                &id.to_string(),
                StudyEvent::Error {
                    error_msg: e.to_string(),
                },
            );
            return Err(e.into());
        }
    };
    let turns = match turns {
        Ok(turns) => turns,
        Err(e) => {
            warn!(session = %id, error = %e, "Session ended while answering");
            return Err(e.into());
        }
    };

    StudyEventLogger::log_event(
        &id.to_string(),
        StudyEvent::ChatAnswered {
            question,
            answer_chars: answer.chars().count(),
        },
    );
    Ok(Json(ChatResponse {
        blocks: markdown::parse(&answer),
        answer,
        turns,
    }))
}
