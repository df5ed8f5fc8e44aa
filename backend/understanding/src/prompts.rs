//! Prompt text. Wording is free to change; structure lives in `schemas`.

use diagramlens_core::Explanation;

pub const TUTOR_SYSTEM: &str = "You are a patient tutor who explains technical diagrams \
to students. Be accurate about what the image shows and say so when something is unclear. \
Format prose with the markdown subset: ## and ### headings, * bullets, 1. numbered steps, \
**bold** for key terms. No tables, links, code blocks or images.";

pub const EXPLAIN_PROMPT: &str = "Explain this diagram. Identify its main components, \
how they relate to each other, and the key ideas a student should take away.";

pub fn quiz_prompt(count: u32, explanation: &Explanation) -> String {
    format!(
        "Write {count} multiple-choice questions that test understanding of this diagram, \
         not trivia about its styling. Each question has one correct option. \
         The diagram was summarised as \"{}\": {}",
        explanation.title.trim(),
        explanation.summary.trim()
    )
}

/// System instruction for the Q&A chat. The full explanation rides along
/// so follow-up answers stay consistent with it.
pub fn chat_system(explanation: Option<&Explanation>) -> String {
    let intro = format!(
        "{TUTOR_SYSTEM}\n\nThe student is studying the attached diagram. \
         Answer their questions about it concisely."
    );
    match explanation.map(Explanation::to_markdown) {
        Some(context) if !context.is_empty() => format!(
            "{intro} You already gave them this explanation:\n\n{context}"
        ),
        _ => intro,
    }
}
