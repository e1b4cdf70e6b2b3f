//! Fetch capability trait and the direct (always live) fetcher

use crate::config::IdentityConfig;
use crate::fetch::client::build_http_client;
use crate::fetch::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A fetched HTTP response, reduced to what the resolvers need
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value
    pub content_type: String,

    /// Response body as text
    pub body: String,

    /// Whether this response was served from the cache rather than the
    /// network
    pub from_cache: bool,
}

/// Trait for anything that can perform a GET on behalf of the resolvers
///
/// Exactly two implementations ship with the crate: [`DirectFetcher`], which
/// always performs a live request, and
/// [`CachingFetcher`](crate::fetch::CachingFetcher), which consults cache
/// storage first. The identity string participates in cache key derivation,
/// so two fetchers with different identities never share entries.
#[async_trait]
pub trait FetchCapability: Send + Sync {
    /// Fetches the URL, honoring the cancellation token
    async fn fetch(
        &self,
        url: &str,
        accept: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedResponse, FetchError>;

    /// The identity string this fetcher presents to origins
    fn identity(&self) -> &str;
}

/// Fetcher that always performs a live network request
///
/// Used directly when staleness cannot be tolerated, and as the inner
/// delegate of the caching wrapper everywhere else.
pub struct DirectFetcher {
    client: Client,
    identity: String,
}

impl DirectFetcher {
    /// Creates a fetcher with a freshly built HTTP client
    pub fn new(identity: &IdentityConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = build_http_client(identity, timeout)?;
        Ok(Self {
            client,
            identity: identity.user_agent(),
        })
    }

    /// Wraps an existing client
    pub fn from_client(client: Client, identity: String) -> Self {
        Self { client, identity }
    }
}

#[async_trait]
impl FetchCapability for DirectFetcher {
    async fn fetch(
        &self,
        url: &str,
        accept: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedResponse, FetchError> {
        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
            result = request => result.map_err(|e| classify_error(url, &e))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
            result = response.text() => result.map_err(|e| classify_error(url, &e))?,
        };

        Ok(FetchedResponse {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
            from_cache: false,
        })
    }

    fn identity(&self) -> &str {
        &self.identity
    }
}

/// Classifies a reqwest error into the fetch error taxonomy
fn classify_error(url: &str, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
