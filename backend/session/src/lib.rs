pub mod chat;
pub mod quiz;
pub mod store;
pub mod study;

pub use chat::ChatTranscript;
pub use quiz::{AnswerFeedback, QuestionView, QuizScore, QuizSession, QuizStatus, QuizView};
pub use store::SessionStore;
pub use study::{ChatTurnView, SessionView, StudySession};
