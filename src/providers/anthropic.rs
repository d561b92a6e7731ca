//! Anthropic messages API backend

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::ProviderEndpoint;
use crate::crawl::{LevelHint, PageError, PageResult};
use crate::providers::traits::DEFAULT_CHUNK_CHARS;
use crate::providers::{classify_status, parse, prompts, Provider};
use crate::{ConfigError, ConfigResult};

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const API_VERSION: &str = "2023-06-01";
const MAX_OUTPUT_TOKENS: u32 = 8192;

pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_chunk_chars: usize,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicProvider {
    pub fn new(endpoint: &ProviderEndpoint, temperature: f32) -> ConfigResult<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingApiKey(API_KEY_ENV))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: endpoint.base_url.clone(),
            api_key,
            model: endpoint.model.clone(),
            temperature,
            max_chunk_chars: endpoint.max_chunk_chars.unwrap_or(DEFAULT_CHUNK_CHARS),
        })
    }

    async fn message(&self, system: &str, user: &str) -> Result<String, PageError> {
        let body = json!({
            "model": self.model,
            "max_tokens": MAX_OUTPUT_TOKENS,
            "temperature": self.temperature,
            "system": system,
            "messages": [
                { "role": "user", "content": user },
            ],
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| PageError::Extraction {
                message: format!("anthropic request: {e}"),
                transient: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PageError::Extraction {
                message: format!("anthropic returned HTTP {status}: {detail}"),
                transient: classify_status(status),
            });
        }

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| PageError::Extraction {
                message: format!("anthropic response body: {e}"),
                transient: true,
            })?;

        let text: String = parsed.content.into_iter().map(|b| b.text).collect();
        if text.is_empty() {
            return Err(PageError::malformed_output("anthropic returned no text"));
        }
        Ok(text)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    async fn understand(&self, content: &str, page_url: &str) -> Result<String, PageError> {
        let user = prompts::understanding_request(content, page_url);
        self.message(prompts::UNDERSTAND_SYSTEM_PROMPT, &user).await
    }

    async fn extract(
        &self,
        content: &str,
        prompt: &str,
        page_url: &str,
        hint: LevelHint,
    ) -> Result<PageResult, PageError> {
        let user = prompts::extraction_request(content, prompt, page_url, hint);
        let raw = self.message(prompts::EXTRACT_SYSTEM_PROMPT, &user).await?;
        parse::parse_extraction(&raw)
    }
}
