use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use diagramlens_core::{
    ChatRole, Content, LensError, LensResult, ModelProvider, ModelRequest, ModelResponse, Part,
};

use crate::http_error;

pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Ollama local provider, for vision-capable local models (llava, qwen2.5vl, ...).
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    default_model: String,
}

impl OllamaProvider {
    pub fn new(timeout: Duration) -> LensResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LensError::provider("ollama", e.to_string()))?;
        Ok(Self {
            client,
            base_url: OLLAMA_DEFAULT_URL.to_string(),
            default_model: "llava".to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize, Deserialize)]
struct OllamaChatMessage {
    role: String,
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

/// Ollama carries images beside the text as bare base64 strings.
fn to_message(content: &Content) -> OllamaChatMessage {
    let mut text = Vec::new();
    let mut images = Vec::new();
    for part in &content.parts {
        match part {
            Part::Text(t) => text.push(t.as_str()),
            Part::InlineImage { data, .. } => images.push(data.clone()),
        }
    }
    OllamaChatMessage {
        role: match content.role {
            ChatRole::User => "user",
            ChatRole::Model => "assistant",
        }
        .to_string(),
        content: text.join("\n"),
        images,
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn generate(&self, request: &ModelRequest) -> LensResult<ModelResponse> {
        let start = Instant::now();

        let mut messages = Vec::new();
        if !request.system_instruction.is_empty() {
            messages.push(OllamaChatMessage {
                role: "system".to_string(),
                content: request.system_instruction.clone(),
                images: Vec::new(),
            });
        }
        messages.extend(request.contents.iter().map(to_message));

        // Strip any provider prefix like "ollama/".
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request
                .model
                .rsplit('/')
                .next()
                .unwrap_or(&request.model)
                .to_string()
        };

        let body = OllamaChatRequest {
            model: model.clone(),
            messages,
            stream: false,
            format: request
                .response_schema
                .as_ref()
                .map(|s| s.schema.to_json_schema()),
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_output_tokens,
            },
        };

        debug!(model = %model, images = request.image_count(), "Sending request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| http_error("ollama", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LensError::provider(
                "ollama",
                format!("returned {status}: {error_body}"),
            ));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LensError::MalformedResponse(format!("Ollama body: {e}")))?;

        let tokens_used = chat_response.eval_count.unwrap_or(0)
            + chat_response.prompt_eval_count.unwrap_or(0);

        Ok(ModelResponse {
            text: chat_response.message.content,
            provider: "ollama".to_string(),
            model,
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
