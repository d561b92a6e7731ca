//! Promptcrawl: a prompt-driven multi-level web scraper
//!
//! This crate turns a seed URL and a natural-language extraction prompt into
//! structured records. It crawls a site breadth-first across link levels
//! (listing pages, then per-item detail pages), merging enrichment data from
//! deeper levels back into the originating records. Fetching goes through a
//! rendering proxy; page understanding and extraction are delegated to
//! pluggable AI providers.

pub mod cache;
pub mod cleaner;
pub mod config;
pub mod crawl;
pub mod fetch;
pub mod output;
pub mod providers;

use thiserror::Error;

/// Fatal error type for promptcrawl operations
///
/// Per-page failures never surface here; they are recorded into
/// `CrawlResult.errors` and the crawl continues. This enum covers only the
/// conditions that abort an entire run.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// All of these are reported before any crawling begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Missing API key: set {0} in the environment")]
    MissingApiKey(&'static str),
}

/// Result type alias for promptcrawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Settings;
pub use crawl::{CrawlResult, Item, LevelHint, Orchestrator, PageError, PageResult};
pub use fetch::Fetcher;
pub use providers::Provider;
