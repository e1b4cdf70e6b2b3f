use crate::config::types::Config;
use crate::config::validation::validate;
use crate::oembed::default_providers;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// A config that declares no `[[provider]]` tables gets the built-in
/// provider table; declared tables replace the built-ins entirely rather
/// than merging with them.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use kasumi::config::load_config;
///
/// let config = load_config(Path::new("kasumi.toml")).unwrap();
/// println!("cache backend: {:?}", config.cache.backend);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config: Config = toml::from_str(&content)?;

    if config.providers.is_empty() {
        config.providers = default_providers();
    }

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Used to tell whether a persistent cache was populated under a different
/// configuration.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
