pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use diagramlens_core::{LensError, LensResult, ModelProvider};
use tracing::info;

pub use gemini::GeminiProvider;
pub use mock::{MockProvider, MockReply};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Which backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    OpenRouter,
    Ollama,
    Mock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::OpenRouter => "openrouter",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }

    pub fn needs_api_key(&self) -> bool {
        matches!(self, Self::Gemini | Self::OpenAi | Self::OpenRouter)
    }
}

impl FromStr for ProviderKind {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "openrouter" => Ok(Self::OpenRouter),
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            other => Err(LensError::Config(format!("unknown model provider '{other}'"))),
        }
    }
}

/// Everything needed to construct a provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout: Duration,
}

/// Build the configured provider.
pub fn build_provider(settings: &ProviderSettings) -> LensResult<Arc<dyn ModelProvider>> {
    let api_key = || {
        settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LensError::Config(format!(
                    "provider '{}' requires an API key",
                    settings.kind.as_str()
                ))
            })
    };

    let provider: Arc<dyn ModelProvider> = match settings.kind {
        ProviderKind::Gemini => {
            let mut p = GeminiProvider::new(api_key()?, settings.timeout)?;
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            if let Some(model) = &settings.model {
                p = p.with_default_model(model);
            }
            Arc::new(p)
        }
        ProviderKind::OpenAi | ProviderKind::OpenRouter => {
            let mut p = if settings.kind == ProviderKind::OpenAi {
                OpenAiProvider::new(api_key()?, settings.timeout)?
            } else {
                OpenAiProvider::openrouter(api_key()?, settings.timeout)?
            };
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            if let Some(model) = &settings.model {
                p = p.with_default_model(model);
            }
            Arc::new(p)
        }
        ProviderKind::Ollama => {
            let mut p = OllamaProvider::new(settings.timeout)?;
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            if let Some(model) = &settings.model {
                p = p.with_default_model(model);
            }
            Arc::new(p)
        }
        ProviderKind::Mock => Arc::new(MockProvider::demo()),
    };

    info!(
        provider = provider.name(),
        model = provider.default_model(),
        "Model provider ready"
    );
    Ok(provider)
}

/// Map a transport failure to a provider error. The URL is dropped from
/// the message since it can carry credentials.
pub(crate) fn http_error(provider: &str, err: reqwest::Error) -> LensError {
    let err = err.without_url();
    if err.is_timeout() {
        LensError::provider(provider, "request timed out")
    } else {
        LensError::provider(provider, format!("HTTP request failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(kind: ProviderKind, key: Option<&str>) -> ProviderSettings {
        ProviderSettings {
            kind,
            api_key: key.map(str::to_string),
            base_url: None,
            model: Some("custom-model".into()),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn parses_kind_names() {
        assert_eq!("Google".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("openrouter".parse::<ProviderKind>().unwrap(), ProviderKind::OpenRouter);
        assert!("bard".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn hosted_providers_require_key() {
        let err = build_provider(&settings(ProviderKind::Gemini, None)).err().unwrap();
        assert!(matches!(err, LensError::Config(_)));
        let err = build_provider(&settings(ProviderKind::OpenAi, Some("  "))).err().unwrap();
        assert!(matches!(err, LensError::Config(_)));
    }

    #[test]
    fn builds_with_model_override() {
        let p = build_provider(&settings(ProviderKind::Gemini, Some("k"))).unwrap();
        assert_eq!(p.name(), "gemini");
        assert_eq!(p.default_model(), "custom-model");

        let p = build_provider(&settings(ProviderKind::Ollama, None)).unwrap();
        assert_eq!(p.name(), "ollama");
    }
}
