use serde::Deserialize;

/// Main configuration structure for promptcrawl
///
/// Every section and field has a default, so running without a config file
/// works; CLI flags override whatever was loaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub crawl: CrawlSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub providers: ProvidersSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Crawl engine behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// Ceiling on pages fetched in one run (cache hits do not count)
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Minimum time between outbound fetches (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Retries per provider after a transient page failure
    #[serde(rename = "extraction-retries", default = "default_retries")]
    pub extraction_retries: u32,

    /// First retry backoff; doubles per attempt (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_ms")]
    pub backoff_base_ms: u64,
}

/// Rendering proxy transport settings
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    /// Proxy service endpoint; the target URL goes in the query string
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout (seconds); rendered pages are slow
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Ask the proxy to execute JavaScript before capturing
    #[serde(rename = "render-js", default = "default_true")]
    pub render_js: bool,

    /// Scroll to the bottom before capturing (lazy-loaded listings)
    #[serde(rename = "auto-scroll", default)]
    pub auto_scroll: bool,
}

/// AI provider selection and per-backend endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersSettings {
    /// Extraction backend used first
    #[serde(default = "default_provider")]
    pub default: String,

    /// Backend that takes over when the default's retry budget is spent
    #[serde(default)]
    pub fallback: Option<String>,

    /// Understanding backend for dual-model mode; unset means single-model
    #[serde(default)]
    pub processor: Option<String>,

    /// Sampling temperature for every backend
    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_openai")]
    pub openai: ProviderEndpoint,
    #[serde(default = "default_anthropic")]
    pub anthropic: ProviderEndpoint,
    #[serde(default = "default_ollama")]
    pub ollama: ProviderEndpoint,
}

/// Model and URL for one provider backend
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEndpoint {
    pub model: String,

    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Override of the backend's content chunk size
    #[serde(rename = "max-chunk-chars", default)]
    pub max_chunk_chars: Option<usize>,
}

/// Crawl cache persistence
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Path to the SQLite cache database
    #[serde(default = "default_cache_path")]
    pub path: String,
}

fn default_max_pages() -> u32 {
    20
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    2000
}

fn default_endpoint() -> String {
    "https://api.scrapingproxy.io/scrape".to_string()
}

fn default_timeout_secs() -> u64 {
    90
}

fn default_true() -> bool {
    true
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_openai() -> ProviderEndpoint {
    ProviderEndpoint {
        model: "gpt-4o-mini".to_string(),
        base_url: "https://api.openai.com/v1".to_string(),
        max_chunk_chars: None,
    }
}

fn default_anthropic() -> ProviderEndpoint {
    ProviderEndpoint {
        model: "claude-3-5-haiku-latest".to_string(),
        base_url: "https://api.anthropic.com".to_string(),
        max_chunk_chars: None,
    }
}

fn default_ollama() -> ProviderEndpoint {
    ProviderEndpoint {
        model: "llama3.1".to_string(),
        base_url: "http://localhost:11434".to_string(),
        max_chunk_chars: None,
    }
}

fn default_cache_path() -> String {
    "promptcrawl_cache.db".to_string()
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            delay_ms: default_delay_ms(),
            extraction_retries: default_retries(),
            backoff_base_ms: default_backoff_ms(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            render_js: true,
            auto_scroll: false,
        }
    }
}

impl Default for ProvidersSettings {
    fn default() -> Self {
        Self {
            default: default_provider(),
            fallback: None,
            processor: None,
            temperature: 0.0,
            openai: default_openai(),
            anthropic: default_anthropic(),
            ollama: default_ollama(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}
