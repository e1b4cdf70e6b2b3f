//! Cache storage trait and error types

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for cache storage backends
///
/// All backends share the same contract:
/// - `get` on an expired entry evicts it and reports a miss.
/// - Eviction is idempotent: racing readers may both decide an entry is
///   expired; whichever deletes first wins and the loser is a no-op.
/// - Each mutation is individually atomic, so no reader observes a
///   partially-written entry. The lock guarding a mutation is scoped to that
///   single operation.
/// - Corrupted persisted entries are purged and treated as misses, never
///   surfaced as errors.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Gets a live value, evicting it first if it has expired
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores a value under the key with an optional TTL
    ///
    /// `None` means the entry never expires; a zero duration means the entry
    /// is expired on arrival (effectively "do not persist").
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()>;

    /// Removes an entry; removing an absent key is a no-op
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Removes all entries
    async fn clear(&self) -> CacheResult<()>;

    /// Counts live entries, evicting any expired entries it encounters
    async fn size(&self) -> CacheResult<usize>;
}
