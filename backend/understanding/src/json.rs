//! Lenient JSON extraction from model text.
//!
//! Structured-output modes return bare JSON, but local models and proxies
//! sometimes wrap it in a code fence or a sentence.

use diagramlens_core::{LensError, LensResult};
use serde::de::DeserializeOwned;

/// Slice the JSON object out of a model response.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(body) = strip_fence(trimmed) {
        return body;
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

fn strip_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let body = rest.trim_end().strip_suffix("```")?;
    Some(body.trim())
}

/// Parse a structured model response into `T`.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> LensResult<T> {
    serde_json::from_str(extract_json(text))
        .map_err(|e| LensError::MalformedResponse(format!("could not parse model JSON: {e}")))
}
