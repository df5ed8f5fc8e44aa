use async_trait::async_trait;

use crate::error::LensResult;
use crate::schema::ResponseSchema;
use crate::types::ChatRole;

/// Trait for the remote multimodal models DiagramLens delegates to.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Model used when a request leaves `model` empty.
    fn default_model(&self) -> &str;

    /// Send one generation request and return the response text.
    async fn generate(&self, request: &ModelRequest) -> LensResult<ModelResponse>;
}

/// One piece of a message sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Base64-encoded image bytes.
    InlineImage { mime_type: String, data: String },
}

/// A message with a role and ordered parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub role: ChatRole,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: ChatRole::User,
            parts,
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![Part::Text(text.into())])
    }
}

/// Request to a model provider.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    pub system_instruction: String,
    pub contents: Vec<Content>,
    /// When set, the provider must ask for JSON in this shape.
    pub response_schema: Option<ResponseSchema>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl ModelRequest {
    /// Number of inline images across all contents.
    pub fn image_count(&self) -> usize {
        self.contents
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter(|p| matches!(p, Part::InlineImage { .. }))
            .count()
    }
}

/// Response from a model provider.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
