use diagramlens_core::{ChatRole, ChatTurn};

/// Question/answer transcript for one image.
#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    turns: Vec<ChatTurn>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(ChatTurn::new(ChatRole::User, text));
    }

    pub fn push_model(&mut self, text: impl Into<String>) {
        self.turns.push(ChatTurn::new(ChatRole::Model, text));
    }

    /// Drop the last turn if it is an unanswered user question, so a
    /// failed model call can be retried without duplicating it.
    pub fn pop_pending_user(&mut self) -> Option<ChatTurn> {
        match self.turns.last() {
            Some(turn) if turn.role == ChatRole::User => self.turns.pop(),
            _ => None,
        }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_only_removes_trailing_user_turn() {
        let mut chat = ChatTranscript::new();
        chat.push_user("q1");
        chat.push_model("a1");
        assert!(chat.pop_pending_user().is_none());
        assert_eq!(chat.len(), 2);

        chat.push_user("q2");
        let popped = chat.pop_pending_user().unwrap();
        assert_eq!(popped.text, "q2");
        assert_eq!(chat.history().last().unwrap().role, ChatRole::Model);
    }

    #[test]
    fn clear_empties_transcript() {
        let mut chat = ChatTranscript::new();
        chat.push_user("q");
        chat.clear();
        assert!(chat.is_empty());
    }
}
