use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured explanation of a diagram as returned by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub title: String,
    /// Markdown-subset prose describing the diagram as a whole.
    pub summary: String,
    #[serde(default)]
    pub components: Vec<DiagramComponent>,
    #[serde(default)]
    pub relationships: Vec<String>,
    #[serde(default)]
    pub key_takeaways: Vec<String>,
}

/// One labelled element of the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramComponent {
    pub name: String,
    pub description: String,
}

impl Explanation {
    /// Assemble the explanation into one document in the formatter's
    /// markdown subset (## headings, bullets, numbered steps, **bold**).
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        if !self.title.trim().is_empty() {
            let _ = writeln!(out, "## {}", self.title.trim());
            out.push('\n');
        }
        if !self.summary.trim().is_empty() {
            out.push_str(self.summary.trim());
            out.push_str("\n\n");
        }
        if !self.components.is_empty() {
            out.push_str("### Components\n");
            for c in &self.components {
                let _ = writeln!(out, "* **{}**: {}", c.name.trim(), c.description.trim());
            }
            out.push('\n');
        }
        if !self.relationships.is_empty() {
            out.push_str("### How it fits together\n");
            for (i, r) in self.relationships.iter().enumerate() {
                let _ = writeln!(out, "{}. {}", i + 1, r.trim());
            }
            out.push('\n');
        }
        if !self.key_takeaways.is_empty() {
            out.push_str("### Key takeaways\n");
            for t in &self.key_takeaways {
                let _ = writeln!(out, "- {}", t.trim());
            }
        }
        out.trim_end().to_string()
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
}

impl QuizQuestion {
    /// Reasons this question cannot be graded, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question text is blank".into());
        }
        if self.options.len() < 2 {
            return Err(format!("needs at least 2 options, got {}", self.options.len()));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err("an option is blank".into());
        }
        if self.correct_index >= self.options.len() {
            return Err(format!(
                "correct_index {} out of range for {} options",
                self.correct_index,
                self.options.len()
            ));
        }
        Ok(())
    }
}

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

/// One message in the question/answer chat about an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            at: Utc::now(),
        }
    }
}
