//! OpenAI chat completions backend

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::ProviderEndpoint;
use crate::crawl::{LevelHint, PageError, PageResult};
use crate::providers::traits::DEFAULT_CHUNK_CHARS;
use crate::providers::{classify_status, parse, prompts, Provider};
use crate::{ConfigError, ConfigResult};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_chunk_chars: usize,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiProvider {
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

    async fn chat(&self, system: &str, user: &str, json_mode: bool) -> Result<String, PageError> {
        let mut body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });
        if json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PageError::Extraction {
                message: format!("openai request: {e}"),
                transient: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PageError::Extraction {
                message: format!("openai returned HTTP {status}: {detail}"),
                transient: classify_status(status),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| PageError::Extraction {
            message: format!("openai response body: {e}"),
            transient: true,
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PageError::malformed_output("openai returned no choices"))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    async fn understand(&self, content: &str, page_url: &str) -> Result<String, PageError> {
        let user = prompts::understanding_request(content, page_url);
        self.chat(prompts::UNDERSTAND_SYSTEM_PROMPT, &user, false)
            .await
    }

    async fn extract(
        &self,
        content: &str,
        prompt: &str,
        page_url: &str,
        hint: LevelHint,
    ) -> Result<PageResult, PageError> {
        let user = prompts::extraction_request(content, prompt, page_url, hint);
        let raw = self
            .chat(prompts::EXTRACT_SYSTEM_PROMPT, &user, true)
            .await?;
        parse::parse_extraction(&raw)
    }
}
