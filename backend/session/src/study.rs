//! Study session: one uploaded image with its explanation, quiz and chat.

use std::time::Duration;

use chrono::{DateTime, Utc};
use diagramlens_core::{ChatRole, ChatTurn, Explanation, LensError, LensResult, QuizQuestion};
use markdown::Block;
use media::ImagePayload;
use serde::Serialize;
use uuid::Uuid;

use crate::chat::ChatTranscript;
use crate::quiz::{QuizSession, QuizView};

#[derive(Debug, Clone)]
pub struct StudySession {
    pub id: Uuid,
    pub image: ImagePayload,
    pub explanation: Explanation,
    /// Formatter output for `explanation.to_markdown()`.
    pub explanation_blocks: Vec<Block>,
    pub quiz: QuizSession,
    /// Why the quiz is empty, when generation failed.
    pub quiz_error: Option<String>,
    pub chat: ChatTranscript,
    /// Set between `begin_chat` and `finish_chat`.
    chat_in_flight: bool,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatTurnView {
    pub role: ChatRole,
    pub text: String,
    pub blocks: Vec<Block>,
    pub at: DateTime<Utc>,
}

/// JSON snapshot sent to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data_url: Option<String>,
    pub explanation: Explanation,
    pub explanation_blocks: Vec<Block>,
    pub quiz: QuizView,
    pub quiz_error: Option<String>,
    pub chat: Vec<ChatTurnView>,
    pub created_at: DateTime<Utc>,
}

impl StudySession {
    pub fn new(image: ImagePayload, explanation: Explanation) -> Self {
        let now = Utc::now();
        let explanation_blocks = markdown::parse(&explanation.to_markdown());
        Self {
            id: Uuid::new_v4(),
            image,
            explanation,
            explanation_blocks,
            quiz: QuizSession::default(),
            quiz_error: None,
            chat: ChatTranscript::new(),
            chat_in_flight: false,
            created_at: now,
            last_active: now,
        }
    }

    pub fn set_quiz(&mut self, questions: Vec<QuizQuestion>) {
        self.quiz.replace_questions(questions);
        self.quiz_error = None;
    }

    pub fn set_quiz_error(&mut self, message: impl Into<String>) {
        self.quiz.replace_questions(Vec::new());
        self.quiz_error = Some(message.into());
    }

    /// Record a question and return the history that precedes it. Only one
    /// question per session may be waiting on the model at a time, so the
    /// trailing user turn always belongs to the open exchange.
    pub fn begin_chat(&mut self, question: impl Into<String>) -> LensResult<Vec<ChatTurn>> {
        if self.chat_in_flight {
            return Err(LensError::InvalidInput(
                "the previous question is still being answered".into(),
            ));
        }
        let history = self.chat.history().to_vec();
        self.chat.push_user(question);
        self.chat_in_flight = true;
        Ok(history)
    }

    /// Close the open exchange: keep the answer, or drop the question when
    /// there is none.
    pub fn finish_chat(&mut self, answer: Option<String>) {
        if !self.chat_in_flight {
            return;
        }
        self.chat_in_flight = false;
        match answer {
            Some(answer) => self.chat.push_model(answer),
            None => {
                self.chat.pop_pending_user();
            }
        }
    }

    pub fn is_chat_in_flight(&self) -> bool {
        self.chat_in_flight
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn idle_for(&self) -> Duration {
        (Utc::now() - self.last_active).to_std().unwrap_or_default()
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.idle_for() > ttl
    }

    /// Snapshot for the UI. The image preview is only included on request
    /// since it is the bulk of the payload.
    pub fn view(&self, include_image: bool) -> SessionView {
        SessionView {
            id: self.id,
            filename: self.image.filename.clone(),
            mime_type: self.image.mime_type.clone(),
            image_data_url: include_image.then(|| self.image.to_data_url()),
            explanation: self.explanation.clone(),
            explanation_blocks: self.explanation_blocks.clone(),
            quiz: self.quiz.view(),
            quiz_error: self.quiz_error.clone(),
            chat: self
                .chat
                .history()
                .iter()
                .map(|t| ChatTurnView {
                    role: t.role,
                    text: t.text.clone(),
                    blocks: markdown::parse(&t.text),
                    at: t.at,
                })
                .collect(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0];

    fn session() -> StudySession {
        let image = ImagePayload::from_upload(Some("d.png"), None, Bytes::from_static(PNG), 64).unwrap();
        StudySession::new(
            image,
            Explanation {
                title: "Flow".into(),
                summary: "A **pipeline**.".into(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn explanation_is_formatted_on_creation() {
        let s = session();
        assert_eq!(s.explanation_blocks.len(), 3);
        assert!(matches!(s.explanation_blocks[0], Block::Heading { .. }));
        assert!(matches!(s.explanation_blocks[1], Block::Spacer));
    }

    #[test]
    fn quiz_error_clears_questions() {
        let mut s = session();
        s.set_quiz(vec![QuizQuestion {
            question: "q".into(),
            options: vec!["a".into(), "b".into()],
            correct_index: 0,
            explanation: String::new(),
        }]);
        assert_eq!(s.quiz.len(), 1);
        s.set_quiz_error("model unavailable");
        assert!(s.quiz.is_empty());
        assert_eq!(s.quiz_error.as_deref(), Some("model unavailable"));
    }

    #[test]
    fn view_optionally_embeds_image() {
        let mut s = session();
        s.chat.push_user("What is **this**?");
        let json = serde_json::to_value(s.view(false)).unwrap();
        assert!(json.get("image_data_url").is_none());
        assert_eq!(json["chat"][0]["role"], "user");
        assert_eq!(json["chat"][0]["blocks"][0]["kind"], "paragraph");
        assert_eq!(json["quiz"]["status"], "empty");

        let json = serde_json::to_value(s.view(true)).unwrap();
        assert!(json["image_data_url"].as_str().unwrap().starts_with("data:image/png"));
    }

    #[test]
    fn one_question_in_flight_at_a_time() {
        let mut s = session();
        let history = s.begin_chat("slow").unwrap();
        assert!(history.is_empty());
        assert!(s.is_chat_in_flight());

        let err = s.begin_chat("fast").unwrap_err();
        assert!(matches!(err, LensError::InvalidInput(_)));
        assert_eq!(s.chat.len(), 1);

        s.finish_chat(None);
        assert!(s.chat.is_empty());
        assert!(!s.is_chat_in_flight());

        let history = s.begin_chat("fast").unwrap();
        assert!(history.is_empty());
        s.finish_chat(Some("fast answer".into()));
        let roles: Vec<_> = s.chat.history().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Model]);
    }

    #[test]
    fn finishing_without_open_exchange_is_ignored() {
        let mut s = session();
        s.chat.push_user("typed earlier");
        s.finish_chat(None);
        s.finish_chat(Some("stray".into()));
        assert_eq!(s.chat.len(), 1);
    }

    #[test]
    fn fresh_session_is_not_expired() {
        let s = session();
        assert!(!s.is_expired(Duration::from_secs(60)));
    }
}
