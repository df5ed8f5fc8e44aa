//! Quiz actions on a session.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use diagramlens_core::LensResult;
use diagramlens_session::{AnswerFeedback, QuizStatus, QuizView};
use logging::{StudyEvent, StudyEventLogger};
use serde::{Deserialize, Serialize};

use super::parse_session_id;
use crate::error::ApiResult;
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub option: usize,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub feedback: AnswerFeedback,
    pub quiz: QuizView,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub quiz: QuizView,
    pub quiz_error: Option<String>,
}

/// Handler for `POST /api/sessions/:id/quiz/answer`
pub async fn answer(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    body: Result<Json<AnswerRequest>, JsonRejection>,
) -> ApiResult<Json<AnswerResponse>> {
    let id = parse_session_id(&id)?;
    let Json(body) = body?;
    let (feedback, quiz) = state
        .sessions
        .with_session_mut(&id, |s| -> LensResult<_> {
            let feedback = s.quiz.select(body.option)?;
            Ok((feedback, s.quiz.view()))
        })
        .await??;

    StudyEventLogger::log_event(
        &id.to_string(),
        StudyEvent::QuizAnswered {
            question: quiz.position,
            correct: feedback.correct,
        },
    );
    Ok(Json(AnswerResponse { feedback, quiz }))
}

/// Handler for `POST /api/sessions/:id/quiz/next`
pub async fn next(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<QuizResponse>> {
    let id = parse_session_id(&id)?;
    let response = state
        .sessions
        .with_session_mut(&id, |s| -> LensResult<_> {
            s.quiz.advance()?;
            Ok(QuizResponse {
                quiz: s.quiz.view(),
                quiz_error: s.quiz_error.clone(),
            })
        })
        .await??;

    if response.quiz.status == QuizStatus::Finished {
        let score = response.quiz.score;
        StudyEventLogger::log_event(
            &id.to_string(),
            StudyEvent::QuizFinished {
                correct: score.correct,
                total: score.total,
            },
        );
    }
    Ok(Json(response))
}

/// Handler for `POST /api/sessions/:id/quiz/restart`
pub async fn restart(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<QuizResponse>> {
    let id = parse_session_id(&id)?;
    let response = state
        .sessions
        .with_session_mut(&id, |s| {
            s.quiz.restart();
            QuizResponse {
                quiz: s.quiz.view(),
                quiz_error: s.quiz_error.clone(),
            }
        })
        .await?;
    StudyEventLogger::log_event(&id.to_string(), StudyEvent::QuizRestarted);
    Ok(Json(response))
}

/// Handler for `POST /api/sessions/:id/quiz/regenerate`
///
/// Asks the model for a fresh set of questions. On failure the previous
/// quiz is left untouched.
pub async fn regenerate(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<QuizResponse>> {
    let id = parse_session_id(&id)?;
    let session = state.sessions.get(&id).await?;
    let questions = state
        .tutor
        .generate_quiz(
            &session.image,
            &session.explanation,
            state.options.question_count,
        )
        .await?;

    let count = questions.len();
    let response = state
        .sessions
        .with_session_mut(&id, |s| {
            s.set_quiz(questions);
            QuizResponse {
                quiz: s.quiz.view(),
                quiz_error: None,
            }
        })
        .await?;
    StudyEventLogger::log_event(&id.to_string(), StudyEvent::QuizGenerated { questions: count });
    Ok(Json(response))
}
