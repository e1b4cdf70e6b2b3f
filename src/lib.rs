//! Kasumi: a link-unfurling engine for document pipelines
//!
//! This crate resolves URLs found in documents to structured metadata — an
//! oEmbed endpoint response or fields scraped from the page itself — and
//! renders a markup fragment, shielding the network from redundant requests
//! with a TTL cache that also remembers failures.

pub mod cache;
pub mod config;
pub mod fetch;
pub mod oembed;
pub mod pipeline;
pub mod render;
pub mod scrape;

use thiserror::Error;

/// Main error type for Kasumi operations
#[derive(Debug, Error)]
pub enum KasumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetch::FetchError),

    #[error("oEmbed error: {0}")]
    Oembed(#[from] oembed::OembedError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern in config: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Kasumi operations
pub type Result<T> = std::result::Result<T, KasumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::{CacheStorage, MemoryCache, SqliteCache};
pub use config::Config;
pub use fetch::{CachingFetcher, DirectFetcher, FetchCapability, FetchError, FetchedResponse};
pub use oembed::{EndpointResolver, OembedError, OembedResponse};
pub use pipeline::{UnfurlContext, Unfurler};
pub use scrape::{ExtractedMetadata, FieldValue, RuleEngine};
