//! Configuration
//!
//! Settings come from an optional TOML file with per-field defaults, then CLI
//! flags override on top. Validation failures are fatal before any crawling
//! begins.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    CacheSettings, CrawlSettings, FetchSettings, ProviderEndpoint, ProvidersSettings, Settings,
};
pub use validation::validate;
