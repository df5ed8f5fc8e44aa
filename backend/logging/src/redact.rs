//! Log Redaction
//!
//! Scrubs API keys, bearer tokens, `key=` query parameters and inline
//! base64 images from strings prior to logging.

use std::sync::LazyLock;

use regex::Regex;

static GOOGLE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AIza[0-9A-Za-z_\-]{30,}").unwrap());
static SECRET_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sk-[A-Za-z0-9_\-]{20,}").unwrap());
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[A-Za-z0-9\-\._~+/]+=*").unwrap());
static KEY_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&](?:key|api_key)=)[^&\s]+").unwrap());
static DATA_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(data:[a-z]+/[a-z0-9.+\-]+;base64,)[A-Za-z0-9+/=]+").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = DATA_URL_RE.replace_all(input, "${1}[REDACTED_IMAGE]");
    let redacted = KEY_PARAM_RE.replace_all(&redacted, "${1}[REDACTED_TOKEN]");
    let redacted = BEARER_RE.replace_all(&redacted, "Bearer [REDACTED_TOKEN]");
    let redacted = GOOGLE_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]");
    SECRET_KEY_RE
        .replace_all(&redacted, "[REDACTED_TOKEN]")
        .into_owned()
}
