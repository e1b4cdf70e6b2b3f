use crate::oembed::{default_providers, Provider};
use crate::scrape::RuleConfig;
use serde::Deserialize;

/// Main configuration structure for Kasumi
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub identity: IdentityConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Provider table; empty means "use the built-in table"
    #[serde(default, rename = "provider")]
    pub providers: Vec<Provider>,

    /// Scraping rules; the universal fallback is appended automatically
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            cache: CacheConfig::default(),
            providers: default_providers(),
            rules: Vec::new(),
        }
    }
}

/// Client identity configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Name of the client
    #[serde(rename = "client-name")]
    pub client_name: String,

    /// Version of the client
    #[serde(rename = "client-version")]
    pub client_version: String,

    /// URL with information about the client
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl IdentityConfig {
    /// The user agent string presented to origins
    ///
    /// Format: `Name/Version (+ContactURL)`
    pub fn user_agent(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.client_name, self.client_version, self.contact_url
        )
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            client_name: "Kasumi".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/kasumi-unfurl/kasumi".to_string(),
        }
    }
}

/// Which cache backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Cache behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Backend to store entries in
    #[serde(default)]
    pub backend: CacheBackend,

    /// Path to the SQLite database file (sqlite backend only)
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,

    /// TTL for cached successful responses, in seconds
    #[serde(rename = "success-ttl-secs", default = "default_success_ttl")]
    pub success_ttl_secs: u64,

    /// TTL for cached failures, in seconds
    #[serde(rename = "failure-ttl-secs", default = "default_failure_ttl")]
    pub failure_ttl_secs: u64,

    /// Whether failed fetches are cached at all
    #[serde(rename = "cache-failures", default = "default_true")]
    pub cache_failures: bool,

    /// Whether caching is enabled; disabled means every fetch is live
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-request timeout, in seconds
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            database_path: None,
            success_ttl_secs: default_success_ttl(),
            failure_ttl_secs: default_failure_ttl(),
            cache_failures: true,
            enabled: true,
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_success_ttl() -> u64 {
    60 * 60
}

fn default_failure_ttl() -> u64 {
    5 * 60
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}
