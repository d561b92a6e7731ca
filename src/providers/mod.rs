//! AI provider backends
//!
//! Each backend implements the `Provider` trait for both the understanding
//! and extraction phases. The registry maps a configured name to a built
//! backend; unknown names and missing API keys fail before any crawling.

mod anthropic;
mod ollama;
mod openai;
pub mod parse;
pub mod prompts;
mod traits;

use std::sync::Arc;

use crate::config::Settings;
use crate::{ConfigError, ConfigResult};

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use traits::{Provider, DEFAULT_CHUNK_CHARS};

/// Names accepted by `build_provider`
pub const PROVIDER_NAMES: &[&str] = &["openai", "anthropic", "ollama"];

/// Builds a provider backend by name from the configured endpoints
pub fn build_provider(name: &str, settings: &Settings) -> ConfigResult<Arc<dyn Provider>> {
    let temperature = settings.providers.temperature;
    match name {
        "openai" => Ok(Arc::new(OpenAiProvider::new(
            &settings.providers.openai,
            temperature,
        )?)),
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(
            &settings.providers.anthropic,
            temperature,
        )?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(
            &settings.providers.ollama,
            temperature,
        )?)),
        other => Err(ConfigError::UnknownProvider(other.to_string())),
    }
}

/// True for HTTP statuses worth retrying against the same backend
pub(crate) fn classify_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_rejected() {
        let settings = Settings::default();
        match build_provider("gemini", &settings) {
            Err(ConfigError::UnknownProvider(name)) => assert_eq!(name, "gemini"),
            other => panic!("expected UnknownProvider, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_ollama_needs_no_api_key() {
        let settings = Settings::default();
        let provider = build_provider("ollama", &settings).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_classify_status() {
        use reqwest::StatusCode;
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(classify_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(classify_status(StatusCode::BAD_GATEWAY));
        assert!(!classify_status(StatusCode::UNAUTHORIZED));
        assert!(!classify_status(StatusCode::BAD_REQUEST));
    }
}
