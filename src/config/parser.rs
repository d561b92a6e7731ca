use crate::config::types::Settings;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&content)?;
    validate(&settings)?;
    Ok(settings)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a resumed run can be matched against the
/// configuration it was started with.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the settings and their hash
pub fn load_config_with_hash(path: &Path) -> Result<(Settings, String), ConfigError> {
    let settings = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((settings, hash))
}
