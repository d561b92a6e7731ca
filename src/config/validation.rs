use crate::config::types::{CrawlSettings, FetchSettings, ProvidersSettings, Settings};
use crate::ConfigError;
use url::Url;

/// Names accepted in provider selection fields
const KNOWN_PROVIDERS: &[&str] = &["openai", "anthropic", "ollama"];

/// Validates the entire configuration
///
/// Everything checked here is fatal before any crawling begins; API key
/// presence is checked later, when the selected backends are actually built.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    validate_crawl(&settings.crawl)?;
    validate_fetch(&settings.fetch)?;
    validate_providers(&settings.providers)?;

    if settings.cache.path.is_empty() {
        return Err(ConfigError::Validation(
            "cache path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_crawl(settings: &CrawlSettings) -> Result<(), ConfigError> {
    if settings.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            settings.max_pages
        )));
    }

    Ok(())
}

fn validate_fetch(settings: &FetchSettings) -> Result<(), ConfigError> {
    Url::parse(&settings.endpoint).map_err(|e| {
        ConfigError::Validation(format!("invalid fetch endpoint '{}': {}", settings.endpoint, e))
    })?;

    if settings.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            settings.timeout_secs
        )));
    }

    if settings.auto_scroll && !settings.render_js {
        return Err(ConfigError::Validation(
            "auto-scroll requires render-js".to_string(),
        ));
    }

    Ok(())
}

fn validate_providers(settings: &ProvidersSettings) -> Result<(), ConfigError> {
    validate_provider_name(&settings.default)?;
    if let Some(fallback) = &settings.fallback {
        validate_provider_name(fallback)?;
        if fallback == &settings.default {
            return Err(ConfigError::Validation(format!(
                "fallback provider '{fallback}' is the same as the default"
            )));
        }
    }
    if let Some(processor) = &settings.processor {
        validate_provider_name(processor)?;
    }

    if !(0.0..=2.0).contains(&settings.temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature must be between 0.0 and 2.0, got {}",
            settings.temperature
        )));
    }

    Ok(())
}

fn validate_provider_name(name: &str) -> Result<(), ConfigError> {
    if KNOWN_PROVIDERS.contains(&name) {
        Ok(())
    } else {
        Err(ConfigError::UnknownProvider(name.to_string()))
    }
}
