//! Local Ollama backend
//!
//! No API key required; suitable as a free fallback or as the cheap
//! understanding model in dual-model mode.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::ProviderEndpoint;
use crate::crawl::{LevelHint, PageError, PageResult};
use crate::providers::{classify_status, parse, prompts, Provider};
use crate::ConfigResult;

/// Local models carry smaller context windows than hosted ones
const OLLAMA_CHUNK_CHARS: usize = 24_000;

pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_chunk_chars: usize,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl OllamaProvider {
    pub fn new(endpoint: &ProviderEndpoint, temperature: f32) -> ConfigResult<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: endpoint.base_url.clone(),
            model: endpoint.model.clone(),
            temperature,
            max_chunk_chars: endpoint.max_chunk_chars.unwrap_or(OLLAMA_CHUNK_CHARS),
        })
    }

    async fn chat(&self, system: &str, user: &str, json_mode: bool) -> Result<String, PageError> {
        let mut body = json!({
            "model": self.model,
            "stream": false,
            "options": { "temperature": self.temperature },
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });
        if json_mode {
            body["format"] = json!("json");
        }

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| PageError::Extraction {
                message: format!("ollama request: {e}"),
                transient: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PageError::Extraction {
                message: format!("ollama returned HTTP {status}: {detail}"),
                transient: classify_status(status),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| PageError::Extraction {
            message: format!("ollama response body: {e}"),
            transient: true,
        })?;

        Ok(parsed.message.content)
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
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
