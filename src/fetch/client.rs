//! Rendering proxy transport
//!
//! Pages are fetched through a ScraperAPI-style rendering proxy: the target
//! URL goes in the query string and the proxy options travel as `x-sapi-*`
//! headers. JavaScript rendering and auto-scroll are per-run constants.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::FetchSettings;
use crate::crawl::PageError;
use crate::fetch::Fetcher;
use crate::{ConfigError, ConfigResult};

/// Environment variable holding the proxy service API key
pub const API_KEY_ENV: &str = "SCRAPER_API_KEY";

/// Instruction set asking the proxy to scroll the page before capturing it,
/// so lazily loaded listings are present in the returned HTML.
const SCROLL_INSTRUCTIONS: &str = r#"[{"type":"loop","for":3,"instructions":[{"type":"scroll","direction":"y","value":"bottom"},{"type":"wait","value":2000}]}]"#;

/// Fetches rendered HTML through the configured proxy endpoint
pub struct ProxyFetcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    render_js: bool,
    auto_scroll: bool,
}

impl ProxyFetcher {
    /// Builds the fetcher, resolving the API key from the environment
    pub fn from_settings(settings: &FetchSettings) -> ConfigResult<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingApiKey(API_KEY_ENV))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ConfigError::Validation(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key,
            render_js: settings.render_js,
            auto_scroll: settings.auto_scroll,
        })
    }

    /// Test constructor with an explicit endpoint and key
    #[doc(hidden)]
    pub fn with_endpoint(endpoint: &str, api_key: &str, render_js: bool, auto_scroll: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            render_js,
            auto_scroll,
        }
    }
}

#[async_trait]
impl Fetcher for ProxyFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PageError> {
        tracing::debug!("Fetching {} via proxy (render={})", url, self.render_js);

        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[("url", url)])
            .header("x-sapi-api_key", &self.api_key)
            .header("x-sapi-render", if self.render_js { "true" } else { "false" });

        if self.auto_scroll && self.render_js {
            request = request.header("x-sapi-instruction_set", SCROLL_INSTRUCTIONS);
        }

        let response = request.send().await.map_err(|e| PageError::Fetch {
            message: e.to_string(),
            // Timeouts and connection failures are worth another attempt;
            // anything else at this stage (bad request construction) is not.
            transient: e.is_timeout() || e.is_connect(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::Fetch {
                message: format!("proxy returned HTTP {status} for {url}"),
                transient: status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
            });
        }

        response.text().await.map_err(|e| PageError::Fetch {
            message: format!("reading proxy response body: {e}"),
            transient: true,
        })
    }
}
