use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use diagramlens_core::{
    ChatRole, LensError, LensResult, ModelProvider, ModelRequest, ModelResponse, Part,
};

use crate::http_error;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Google Gemini `generateContent` provider.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> LensResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LensError::provider("gemini", e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: GEMINI_API_BASE.to_string(),
            default_model: GEMINI_DEFAULT_MODEL.to_string(),
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
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u64>,
}

fn to_gemini_part(part: &Part) -> GeminiPart {
    match part {
        Part::Text(text) => GeminiPart {
            text: Some(text.clone()),
            inline_data: None,
        },
        Part::InlineImage { mime_type, data } => GeminiPart {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.clone(),
                data: data.clone(),
            }),
        },
    }
}

fn build_body(request: &ModelRequest) -> GenerateRequest {
    let system_instruction = (!request.system_instruction.is_empty()).then(|| GeminiContent {
        role: None,
        parts: vec![GeminiPart {
            text: Some(request.system_instruction.clone()),
            inline_data: None,
        }],
    });

    let contents = request
        .contents
        .iter()
        .map(|c| GeminiContent {
            role: Some(
                match c.role {
                    ChatRole::User => "user",
                    ChatRole::Model => "model",
                }
                .to_string(),
            ),
            parts: c.parts.iter().map(to_gemini_part).collect(),
        })
        .collect();

    let schema = request.response_schema.as_ref();
    GenerateRequest {
        system_instruction,
        contents,
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
            response_mime_type: schema.map(|_| "application/json"),
            response_schema: schema.map(|s| s.schema.to_gemini()),
        },
    }
}

fn extract_text(response: GenerateResponse) -> LensResult<(String, u64)> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LensError::provider("gemini", format!("prompt blocked: {reason}")));
    }
    let tokens = response
        .usage_metadata
        .and_then(|u| u.total_token_count)
        .unwrap_or(0);

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(LensError::MalformedResponse("no candidates returned".into()));
    };
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
        return Err(LensError::MalformedResponse(format!(
            "empty response (finish reason {reason})"
        )));
    }
    Ok((text, tokens))
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn generate(&self, request: &ModelRequest) -> LensResult<ModelResponse> {
        let start = Instant::now();
        let model = if request.model.is_empty() {
            self.default_model.as_str()
        } else {
            request.model.as_str()
        };
        let body = build_body(request);

        debug!(
            model = %model,
            images = request.image_count(),
            structured = request.response_schema.is_some(),
            "Sending request to Gemini"
        );

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| http_error("gemini", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                return Err(LensError::RateLimited("gemini".into()));
            }
            return Err(LensError::provider(
                "gemini",
                format!("returned {status}: {error_body}"),
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LensError::MalformedResponse(format!("Gemini body: {e}")))?;
        let (text, tokens_used) = extract_text(parsed)?;

        Ok(ModelResponse {
            text,
            provider: "gemini".to_string(),
            model: model.to_string(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
