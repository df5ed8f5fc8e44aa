use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use diagramlens_core::{
    ChatRole, Content, LensError, LensResult, ModelProvider, ModelRequest, ModelResponse, Part,
};

use crate::http_error;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// OpenAI-compatible chat completions provider (OpenAI, OpenRouter, and
/// self-hosted gateways speaking the same protocol).
pub struct OpenAiProvider {
    client: Client,
    name: String,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> LensResult<Self> {
        Self::named("openai", api_key, OPENAI_API_BASE, "gpt-4o", timeout)
    }

    pub fn openrouter(api_key: impl Into<String>, timeout: Duration) -> LensResult<Self> {
        Self::named(
            "openrouter",
            api_key,
            OPENROUTER_API_BASE,
            "google/gemini-2.5-flash",
            timeout,
        )
    }

    fn named(
        name: &str,
        api_key: impl Into<String>,
        base_url: &str,
        default_model: &str,
        timeout: Duration,
    ) -> LensResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LensError::provider(name, e.to_string()))?;
        Ok(Self {
            client,
            name: name.to_string(),
            api_key: api_key.into(),
            base_url: base_url.to_string(),
            default_model: default_model.to_string(),
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
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

/// User turns become content arrays so images can ride along; model
/// turns are flattened back to a string.
fn to_message(content: &Content) -> ChatMessage {
    match content.role {
        ChatRole::User => {
            let parts: Vec<Value> = content
                .parts
                .iter()
                .map(|p| match p {
                    Part::Text(text) => json!({ "type": "text", "text": text }),
                    Part::InlineImage { mime_type, data } => json!({
                        "type": "image_url",
                        "image_url": { "url": format!("data:{mime_type};base64,{data}") }
                    }),
                })
                .collect();
            ChatMessage {
                role: "user",
                content: Value::Array(parts),
            }
        }
        ChatRole::Model => {
            let text: Vec<&str> = content
                .parts
                .iter()
                .filter_map(|p| match p {
                    Part::Text(t) => Some(t.as_str()),
                    Part::InlineImage { .. } => None,
                })
                .collect();
            ChatMessage {
                role: "assistant",
                content: Value::String(text.join("\n")),
            }
        }
    }
}

fn build_body(request: &ModelRequest, model: &str) -> ChatRequest {
    let mut messages = Vec::with_capacity(request.contents.len() + 1);
    if !request.system_instruction.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: Value::String(request.system_instruction.clone()),
        });
    }
    messages.extend(request.contents.iter().map(to_message));

    ChatRequest {
        model: model.to_string(),
        messages,
        max_tokens: request.max_output_tokens,
        temperature: request.temperature,
        response_format: request.response_schema.as_ref().map(|s| {
            json!({
                "type": "json_schema",
                "json_schema": {
                    "name": s.name,
                    "strict": true,
                    "schema": s.schema.to_json_schema(),
                }
            })
        }),
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn generate(&self, request: &ModelRequest) -> LensResult<ModelResponse> {
        let start = Instant::now();
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };
        let body = build_body(request, &model);

        debug!(
            provider = %self.name,
            model = %model,
            images = request.image_count(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| http_error(&self.name, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                return Err(LensError::RateLimited(self.name.clone()));
            }
            return Err(LensError::provider(
                &self.name,
                format!("returned {status}: {error_body}"),
            ));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LensError::MalformedResponse(format!("{} body: {e}", self.name)))?;

        let tokens_used = chat_response
            .usage
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);
        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LensError::MalformedResponse("no choices returned".into()))?;

        if let Some(refusal) = choice.message.refusal {
            return Err(LensError::provider(&self.name, format!("refused: {refusal}")));
        }
        let text = choice.message.content.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(LensError::MalformedResponse(format!(
                "empty response (finish reason {})",
                choice.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(ModelResponse {
            text,
            provider: self.name.clone(),
            model,
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagramlens_core::{ResponseSchema, SchemaNode};

    #[test]
    fn images_become_data_urls() {
        let request = ModelRequest {
            model: String::new(),
            system_instruction: "sys".into(),
            contents: vec![
                Content::user(vec![
                    Part::Text("What is this?".into()),
                    Part::InlineImage {
                        mime_type: "image/jpeg".into(),
                        data: "Zm9v".into(),
                    },
                ]),
                Content::model_text("A router."),
            ],
            response_schema: None,
            temperature: 0.2,
            max_output_tokens: 256,
        };
        let body = serde_json::to_value(build_body(&request, "gpt-4o")).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"][1]["type"], "image_url");
        assert_eq!(
            body["messages"][1]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,Zm9v"
        );
        assert_eq!(body["messages"][2]["role"], "assistant");
        assert_eq!(body["messages"][2]["content"], "A router.");
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn schema_becomes_strict_response_format() {
        let request = ModelRequest {
            model: "m".into(),
            system_instruction: String::new(),
            contents: vec![Content::user_text("hi")],
            response_schema: Some(ResponseSchema::new(
                "quiz",
                SchemaNode::object().property("q", SchemaNode::string()),
            )),
            temperature: 0.2,
            max_output_tokens: 256,
        };
        let body = serde_json::to_value(build_body(&request, "m")).unwrap();
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "quiz");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(
            body["response_format"]["json_schema"]["schema"]["additionalProperties"],
            false
        );
    }
}
