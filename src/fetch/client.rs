//! HTTP client construction
//!
//! Builds the reqwest client all fetchers share: a descriptive user agent,
//! bounded timeouts, and transparent compression.

use crate::config::IdentityConfig;
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client carrying the configured identity
///
/// The user agent is formatted as `Name/Version (+ContactURL)` so origin
/// operators can identify the tool and find its documentation.
///
/// # Example
///
/// ```no_run
/// use kasumi::config::IdentityConfig;
/// use kasumi::fetch::build_http_client;
/// use std::time::Duration;
///
/// let identity = IdentityConfig {
///     client_name: "Kasumi".to_string(),
///     client_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&identity, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    identity: &IdentityConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(identity.user_agent())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}
