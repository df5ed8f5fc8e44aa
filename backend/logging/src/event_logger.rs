//! Study Event Logger
//!
//! One structured record per user-visible step of a study session, emitted
//! under the `study_events` target so it can be filtered into its own file.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StudyEvent {
    SessionCreated {
        filename: String,
        mime_type: String,
        size_bytes: usize,
    },
    ExplanationReady {
        provider: String,
        model: String,
    },
    QuizGenerated {
        questions: usize,
    },
    QuizAnswered {
        question: usize,
        correct: bool,
    },
    QuizFinished {
        correct: usize,
        total: usize,
    },
    QuizRestarted,
    ChatAnswered {
        question: String,
        answer_chars: usize,
    },
    Error {
        error_msg: String,
    },
    SessionClosed,
}

#[derive(Debug, Serialize)]
pub struct StudyEventEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: StudyEvent,
}

pub struct StudyEventLogger;

impl StudyEventLogger {
    /// Build a redacted log entry.
    pub fn entry(session_id: &str, mut event: StudyEvent) -> StudyEventEntry {
        match &mut event {
            StudyEvent::ChatAnswered { question, .. } => {
                *question = redact_sensitive_data(question);
            }
            StudyEvent::Error { error_msg } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            _ => {}
        }
        StudyEventEntry {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn log_event(session_id: &str, event: StudyEvent) {
        let entry = Self::entry(session_id, event);
        let json = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "study_events", session = %entry.session_id, event = %json, "Study event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_redacted() {
        let entry = StudyEventLogger::entry(
            "s1",
            StudyEvent::Error {
                error_msg: "401 for key=AIzaSyA1234567890abcdefghijklmnopqrstu".into(),
            },
        );
        let StudyEvent::Error { error_msg } = &entry.event else {
            panic!("wrong variant");
        };
        assert!(!error_msg.contains("AIzaSy"));
    }

    #[test]
    fn serializes_with_type_tag() {
        let entry = StudyEventLogger::entry(
            "s1",
            StudyEvent::QuizAnswered {
                question: 2,
                correct: true,
            },
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"]["type"], "quiz_answered");
        assert_eq!(json["event"]["correct"], true);
        assert_eq!(json["session_id"], "s1");
    }
}
