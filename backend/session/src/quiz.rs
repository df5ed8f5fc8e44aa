//! Linear multiple-choice quiz.
//!
//! One question is shown at a time. An answer is final once given, and the
//! quiz only moves forward after the current question has been answered.

use diagramlens_core::{LensError, LensResult, QuizQuestion};
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    current: usize,
    answers: Vec<Option<usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub selected: usize,
    pub correct_index: usize,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub answered: usize,
    pub total: usize,
}

impl QuizScore {
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.correct as f64 / self.total as f64) * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    /// No questions yet (generation failed or pending).
    Empty,
    InProgress,
    Finished,
}

/// The current question without its answer key.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub question: String,
    pub options: Vec<String>,
}

/// Snapshot of quiz state for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct QuizView {
    pub status: QuizStatus,
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub question: Option<QuestionView>,
    pub selected: Option<usize>,
    /// Present once the current question has been answered.
    pub feedback: Option<AnswerFeedback>,
    pub score: QuizScore,
}

impl QuizSession {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            questions,
            current: 0,
            answers,
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn is_finished(&self) -> bool {
        !self.questions.is_empty() && self.current >= self.questions.len()
    }

    pub fn status(&self) -> QuizStatus {
        if self.questions.is_empty() {
            QuizStatus::Empty
        } else if self.is_finished() {
            QuizStatus::Finished
        } else {
            QuizStatus::InProgress
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current)
    }

    /// Answer recorded for the current question.
    pub fn current_answer(&self) -> Option<usize> {
        self.answers.get(self.current).copied().flatten()
    }

    /// `(position, total)` with a 1-based position, or `None` when there is
    /// no current question.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.current_question()
            .map(|_| (self.current + 1, self.questions.len()))
    }

    /// Record an answer for the current question.
    pub fn select(&mut self, option: usize) -> LensResult<AnswerFeedback> {
        if self.is_finished() {
            return Err(LensError::Quiz("quiz is already finished".into()));
        }
        let Some(question) = self.questions.get(self.current) else {
            return Err(LensError::Quiz("quiz has no questions".into()));
        };
        if option >= question.options.len() {
            return Err(LensError::Quiz(format!(
                "option {option} out of range for {} options",
                question.options.len()
            )));
        }
        if self.answers[self.current].is_some() {
            return Err(LensError::Quiz("question already answered".into()));
        }

        self.answers[self.current] = Some(option);
        Ok(feedback(question, option))
    }

    /// Move past the current, answered question.
    pub fn advance(&mut self) -> LensResult<()> {
        if self.questions.is_empty() {
            return Err(LensError::Quiz("quiz has no questions".into()));
        }
        if self.is_finished() {
            return Err(LensError::Quiz("quiz is already finished".into()));
        }
        if self.answers[self.current].is_none() {
            return Err(LensError::Quiz("answer the current question first".into()));
        }
        self.current += 1;
        Ok(())
    }

    pub fn score(&self) -> QuizScore {
        let mut score = QuizScore {
            correct: 0,
            answered: 0,
            total: self.questions.len(),
        };
        for (q, a) in self.questions.iter().zip(&self.answers) {
            if let Some(a) = a {
                score.answered += 1;
                if *a == q.correct_index {
                    score.correct += 1;
                }
            }
        }
        score
    }

    /// Same questions, fresh answers.
    pub fn restart(&mut self) {
        self.current = 0;
        self.answers = vec![None; self.questions.len()];
    }

    pub fn replace_questions(&mut self, questions: Vec<QuizQuestion>) {
        *self = Self::new(questions);
    }

    pub fn view(&self) -> QuizView {
        let question = self.current_question();
        let selected = self.current_answer();
        QuizView {
            status: self.status(),
            position: if question.is_some() { self.current + 1 } else { self.current },
            total: self.questions.len(),
            question: question.map(|q| QuestionView {
                question: q.question.clone(),
                options: q.options.clone(),
            }),
            selected,
            feedback: question.zip(selected).map(|(q, s)| feedback(q, s)),
            score: self.score(),
        }
    }
}

fn feedback(question: &QuizQuestion, selected: usize) -> AnswerFeedback {
    AnswerFeedback {
        correct: selected == question.correct_index,
        selected,
        correct_index: question.correct_index,
        explanation: question.explanation.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str, correct: usize) -> QuizQuestion {
        QuizQuestion {
            question: text.into(),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_index: correct,
            explanation: format!("because {correct}"),
        }
    }

    fn quiz() -> QuizSession {
        QuizSession::new(vec![q("one", 0), q("two", 2)])
    }

    #[test]
    fn full_run_scores_answers() {
        let mut quiz = quiz();
        assert_eq!(quiz.progress(), Some((1, 2)));

        let fb = quiz.select(0).unwrap();
        assert!(fb.correct);
        quiz.advance().unwrap();

        let fb = quiz.select(1).unwrap();
        assert!(!fb.correct);
        assert_eq!(fb.correct_index, 2);
        assert_eq!(fb.explanation, "because 2");
        quiz.advance().unwrap();

        assert!(quiz.is_finished());
        assert_eq!(quiz.status(), QuizStatus::Finished);
        assert_eq!(quiz.progress(), None);
        assert_eq!(quiz.score(), QuizScore { correct: 1, answered: 2, total: 2 });
        assert_eq!(quiz.score().percent(), 50);
    }

    #[test]
    fn answers_are_final() {
        let mut quiz = quiz();
        quiz.select(1).unwrap();
        let err = quiz.select(0).unwrap_err();
        assert!(err.to_string().contains("already answered"));
        assert_eq!(quiz.current_answer(), Some(1));
    }

    #[test]
    fn cannot_skip_unanswered_question() {
        let mut quiz = quiz();
        assert!(quiz.advance().is_err());
        assert_eq!(quiz.current_index(), 0);
    }

    #[test]
    fn out_of_range_option_is_rejected_without_recording() {
        let mut quiz = quiz();
        assert!(quiz.select(3).is_err());
        assert_eq!(quiz.current_answer(), None);
        assert!(quiz.select(2).is_ok());
    }

    #[test]
    fn finished_quiz_rejects_actions() {
        let mut quiz = QuizSession::new(vec![q("only", 1)]);
        quiz.select(1).unwrap();
        quiz.advance().unwrap();
        assert!(quiz.select(0).is_err());
        assert!(quiz.advance().is_err());
    }

    #[test]
    fn restart_clears_answers() {
        let mut quiz = quiz();
        quiz.select(0).unwrap();
        quiz.advance().unwrap();
        quiz.restart();
        assert_eq!(quiz.current_index(), 0);
        assert_eq!(quiz.score().answered, 0);
        assert_eq!(quiz.len(), 2);
    }

    #[test]
    fn empty_quiz() {
        let mut quiz = QuizSession::default();
        assert_eq!(quiz.status(), QuizStatus::Empty);
        assert!(!quiz.is_finished());
        assert!(quiz.select(0).is_err());
        assert!(quiz.advance().is_err());

        quiz.replace_questions(vec![q("new", 0)]);
        assert_eq!(quiz.status(), QuizStatus::InProgress);
    }

    #[test]
    fn view_hides_answer_until_selected() {
        let mut quiz = quiz();
        let view = quiz.view();
        assert_eq!(view.position, 1);
        assert!(view.feedback.is_none());
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["question"].get("correct_index").is_none());

        quiz.select(2).unwrap();
        let view = quiz.view();
        assert_eq!(view.selected, Some(2));
        assert!(!view.feedback.unwrap().correct);
    }

    #[test]
    fn finished_view_reports_total() {
        let mut quiz = QuizSession::new(vec![q("only", 0)]);
        quiz.select(0).unwrap();
        quiz.advance().unwrap();
        let view = quiz.view();
        assert_eq!(view.status, QuizStatus::Finished);
        assert_eq!(view.position, 1);
        assert!(view.question.is_none());
        assert_eq!(view.score.correct, 1);
    }
}
