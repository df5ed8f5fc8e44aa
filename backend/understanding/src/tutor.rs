/// Diagram understanding: explanation, quiz and chat calls against a
/// multimodal model.
use std::sync::Arc;

use diagramlens_core::{
    ChatRole, ChatTurn, Content, Explanation, LensError, LensResult, ModelProvider, ModelRequest,
    Part, QuizQuestion, ResponseSchema,
};
use media::ImagePayload;
use serde::Deserialize;
use tracing::{info, warn};

use crate::json::parse_structured;
use crate::prompts;
use crate::schemas::{explanation_schema, quiz_schema};

/// Generation knobs shared by every call.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Empty means the provider's default model.
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Most recent chat turns sent back to the model as context.
    pub max_history_turns: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.4,
            max_output_tokens: 8192,
            max_history_turns: 20,
        }
    }
}

pub struct DiagramTutor {
    provider: Arc<dyn ModelProvider>,
    settings: GenerationSettings,
}

#[derive(Deserialize)]
struct QuizEnvelope {
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

/// Signed so a model answering `-1` drops one question instead of
/// failing the whole parse.
#[derive(Deserialize)]
struct RawQuestion {
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Vec<String>,
    correct_index: i64,
    #[serde(default)]
    explanation: String,
}

impl DiagramTutor {
    pub fn new(provider: Arc<dyn ModelProvider>, settings: GenerationSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model_name(&self) -> &str {
        if self.settings.model.is_empty() {
            self.provider.default_model()
        } else {
            &self.settings.model
        }
    }

    fn request(
        &self,
        system_instruction: String,
        contents: Vec<Content>,
        response_schema: Option<ResponseSchema>,
    ) -> ModelRequest {
        ModelRequest {
            model: self.settings.model.clone(),
            system_instruction,
            contents,
            response_schema,
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_output_tokens,
        }
    }

    /// Ask the model for a structured explanation of the image.
    pub async fn explain(&self, image: &ImagePayload) -> LensResult<Explanation> {
        let request = self.request(
            prompts::TUTOR_SYSTEM.to_string(),
            vec![Content::user(vec![
                image.to_part(),
                Part::Text(prompts::EXPLAIN_PROMPT.to_string()),
            ])],
            Some(explanation_schema()),
        );

        let response = self.provider.generate(&request).await?;
        let explanation: Explanation = parse_structured(&response.text)?;
        if explanation.title.trim().is_empty() && explanation.summary.trim().is_empty() {
            return Err(LensError::MalformedResponse(
                "explanation has neither title nor summary".into(),
            ));
        }

        info!(
            image = %image.id,
            provider = %response.provider,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            components = explanation.components.len(),
            "Diagram explained"
        );
        Ok(explanation)
    }

    /// Ask for up to `count` gradeable questions about the image.
    pub async fn generate_quiz(
        &self,
        image: &ImagePayload,
        explanation: &Explanation,
        count: u32,
    ) -> LensResult<Vec<QuizQuestion>> {
        let request = self.request(
            prompts::TUTOR_SYSTEM.to_string(),
            vec![Content::user(vec![
                image.to_part(),
                Part::Text(prompts::quiz_prompt(count, explanation)),
            ])],
            Some(quiz_schema(count)),
        );

        let response = self.provider.generate(&request).await?;
        let envelope: QuizEnvelope = parse_structured(&response.text)?;
        let questions = validate_questions(envelope.questions, count as usize);
        if questions.is_empty() {
            return Err(LensError::MalformedResponse(
                "model returned no usable quiz questions".into(),
            ));
        }

        info!(
            image = %image.id,
            questions = questions.len(),
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "Quiz generated"
        );
        Ok(questions)
    }

    /// Answer a free-form question about the image, given the chat so far.
    pub async fn answer(
        &self,
        image: &ImagePayload,
        explanation: Option<&Explanation>,
        history: &[ChatTurn],
        question: &str,
    ) -> LensResult<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(LensError::InvalidInput("question is empty".into()));
        }

        let contents = chat_contents(image, history, question, self.settings.max_history_turns);
        let request = self.request(prompts::chat_system(explanation), contents, None);
        let response = self.provider.generate(&request).await?;

        info!(
            image = %image.id,
            history_turns = history.len(),
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "Chat question answered"
        );
        Ok(response.text.trim().to_string())
    }
}

fn validate_questions(raw: Vec<RawQuestion>, limit: usize) -> Vec<QuizQuestion> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(i, r)| {
            let Ok(correct_index) = usize::try_from(r.correct_index) else {
                warn!(index = i, correct_index = r.correct_index, "Dropping quiz question with negative answer index");
                return None;
            };
            let question = QuizQuestion {
                question: r.question.trim().to_string(),
                options: r.options.into_iter().map(|o| o.trim().to_string()).collect(),
                correct_index,
                explanation: r.explanation.trim().to_string(),
            };
            match question.validate() {
                Ok(()) => Some(question),
                Err(reason) => {
                    warn!(index = i, reason = %reason, "Dropping invalid quiz question");
                    None
                }
            }
        })
        .take(limit)
        .collect()
}

/// Build alternating contents: the image rides on the first user turn, and
/// the history window always starts on a user turn.
fn chat_contents(
    image: &ImagePayload,
    history: &[ChatTurn],
    question: &str,
    max_turns: usize,
) -> Vec<Content> {
    let start = history.len().saturating_sub(max_turns);
    let mut window = &history[start..];
    while let Some(first) = window.first() {
        if first.role == ChatRole::User {
            break;
        }
        window = &window[1..];
    }

    let mut contents: Vec<Content> = window
        .iter()
        .map(|turn| match turn.role {
            ChatRole::User => Content::user_text(turn.text.clone()),
            ChatRole::Model => Content::model_text(turn.text.clone()),
        })
        .collect();
    contents.push(Content::user_text(question));

    if let Some(first) = contents.first_mut() {
        first.parts.insert(0, image.to_part());
    }
    contents
}
