//! Caching fetch wrapper
//!
//! Wraps any [`FetchCapability`] with cache storage so a repeated fetch of
//! the same `(url, accept, identity)` triple is served from cache, and a
//! recently failed fetch fails again immediately without touching the
//! network (negative caching).
//!
//! Two rules hold no matter what the cache does:
//! - A cache write failure never fails the overall call; the live result is
//!   returned and the failure is only logged.
//! - After a failed fetch the caller always sees the original fetch error,
//!   even when recording the failure raised a different error.

use crate::cache::{cache_key, CacheStorage};
use crate::fetch::capability::{FetchCapability, FetchedResponse};
use crate::fetch::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default TTL for cached successful responses
pub const DEFAULT_SUCCESS_TTL: Duration = Duration::from_secs(60 * 60);

/// Default TTL for cached failures
pub const DEFAULT_FAILURE_TTL: Duration = Duration::from_secs(5 * 60);

/// Persisted cache envelope: a success payload or a failure record
#[derive(Debug, Serialize, Deserialize)]
struct CachedEnvelope {
    #[serde(rename = "type")]
    kind: EnvelopeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<CachedResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<CachedFailure>,

    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum EnvelopeKind {
    Success,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedResponse {
    url: String,
    status: u16,
    content_type: String,
    body: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedFailure {
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

impl CachedEnvelope {
    fn success(response: &FetchedResponse) -> Self {
        Self {
            kind: EnvelopeKind::Success,
            data: Some(CachedResponse {
                url: response.url.clone(),
                status: response.status,
                content_type: response.content_type.clone(),
                body: response.body.clone(),
            }),
            error: None,
            timestamp: Utc::now(),
        }
    }

    fn failure(error: &FetchError) -> Self {
        let message = error.to_string();
        let status = error.status().or_else(|| derive_status(&message));
        Self {
            kind: EnvelopeKind::Error,
            data: None,
            error: Some(CachedFailure { message, status }),
            timestamp: Utc::now(),
        }
    }
}

/// Extracts an HTTP status code from an error message like "HTTP 404 for …"
fn derive_status(message: &str) -> Option<u16> {
    let re = regex::Regex::new(r"(?i)\bHTTP\s+([1-5]\d{2})\b").ok()?;
    re.captures(message)?.get(1)?.as_str().parse().ok()
}

/// Rebuilds a fetch error from a stored failure record
fn rebuild_error(url: &str, failure: &CachedFailure) -> FetchError {
    match failure.status {
        Some(status) => FetchError::Http {
            url: url.to_string(),
            status,
        },
        None => FetchError::Network {
            url: url.to_string(),
            message: failure.message.clone(),
        },
    }
}

/// Fetcher that consults cache storage before touching the network
pub struct CachingFetcher {
    inner: Arc<dyn FetchCapability>,
    cache: Arc<dyn CacheStorage>,
    success_ttl: Duration,
    failure_ttl: Duration,
    cache_failures: bool,
}

impl CachingFetcher {
    /// Wraps a fetcher with default TTLs and failure caching enabled
    pub fn new(inner: Arc<dyn FetchCapability>, cache: Arc<dyn CacheStorage>) -> Self {
        Self {
            inner,
            cache,
            success_ttl: DEFAULT_SUCCESS_TTL,
            failure_ttl: DEFAULT_FAILURE_TTL,
            cache_failures: true,
        }
    }

    /// Overrides the success and failure TTLs
    pub fn with_ttls(mut self, success_ttl: Duration, failure_ttl: Duration) -> Self {
        self.success_ttl = success_ttl;
        self.failure_ttl = failure_ttl;
        self
    }

    /// Enables or disables negative caching
    pub fn with_failure_caching(mut self, enabled: bool) -> Self {
        self.cache_failures = enabled;
        self
    }

    /// Consults the cache; `Some` short-circuits the network fetch
    async fn consult_cache(&self, key: &str, url: &str) -> Option<Result<FetchedResponse, FetchError>> {
        let raw = match self.cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                // A cache read failure is just a miss
                tracing::debug!(url, error = %e, "cache read failed, fetching live");
                return None;
            }
        };

        let envelope: CachedEnvelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(url, error = %e, "purging corrupt cache envelope");
                if let Err(e) = self.cache.delete(key).await {
                    tracing::debug!(url, error = %e, "failed to purge corrupt entry");
                }
                return None;
            }
        };

        match (envelope.kind, envelope.data, envelope.error) {
            (EnvelopeKind::Success, Some(data), _) => {
                tracing::debug!(url, "serving fetch from cache");
                Some(Ok(FetchedResponse {
                    url: data.url,
                    status: data.status,
                    content_type: data.content_type,
                    body: data.body,
                    from_cache: true,
                }))
            }
            (EnvelopeKind::Error, _, Some(failure)) if self.cache_failures => {
                tracing::debug!(url, "serving cached failure");
                Some(Err(rebuild_error(url, &failure)))
            }
            (EnvelopeKind::Error, _, _) => {
                // Failure caching disabled, or a failure envelope with no
                // record; either way treat it as a miss
                None
            }
            (EnvelopeKind::Success, None, _) => {
                tracing::debug!(url, "purging success envelope with no data");
                if let Err(e) = self.cache.delete(key).await {
                    tracing::debug!(url, error = %e, "failed to purge entry");
                }
                None
            }
        }
    }

    /// Records the outcome of a live fetch; storage errors are logged only
    async fn record(&self, key: &str, url: &str, envelope: &CachedEnvelope, ttl: Duration) {
        match serde_json::to_string(envelope) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(key, &raw, Some(ttl)).await {
                    tracing::warn!(url, error = %e, "failed to write cache entry");
                }
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "failed to serialize cache entry");
            }
        }
    }
}

#[async_trait]
impl FetchCapability for CachingFetcher {
    async fn fetch(
        &self,
        url: &str,
        accept: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedResponse, FetchError> {
        let key = cache_key(url, accept, self.inner.identity());

        if let Some(cached) = self.consult_cache(&key, url).await {
            return cached;
        }

        match self.inner.fetch(url, accept, cancel).await {
            Ok(response) => {
                self.record(
                    &key,
                    url,
                    &CachedEnvelope::success(&response),
                    self.success_ttl,
                )
                .await;
                Ok(response)
            }
            Err(error) => {
                // Cancellation reflects this caller, not the origin, so it
                // is never recorded as a failure of the URL.
                if self.cache_failures && !error.is_cancelled() {
                    self.record(&key, url, &CachedEnvelope::failure(&error), self.failure_ttl)
                        .await;
                }
                Err(error)
            }
        }
    }

    fn identity(&self) -> &str {
        self.inner.identity()
    }
}
