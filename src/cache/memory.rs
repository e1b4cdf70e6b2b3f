//! In-process cache backend
//!
//! A HashMap behind a tokio mutex. The mutex is taken once per operation and
//! released before returning, so independent operations never hold the lock
//! across each other, and expiry is re-checked under the same lock that
//! performs the eviction.

use crate::cache::entry::CacheEntry;
use crate::cache::traits::{CacheResult, CacheStorage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

/// In-memory cache backend
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    /// Creates an empty in-memory cache
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                // Self-healing eviction; the expiry check and removal happen
                // under the same lock, so a racing reader either sees the
                // live entry or an absent key, never a half-removed one.
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.payload.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        Ok(())
    }

    async fn size(&self) -> CacheResult<usize> {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| !entry.is_expired());
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();
        cache.set("k", "v", None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_is_immediate_miss() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Some(Duration::ZERO)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_on_get() {
        let cache = MemoryCache::new();
        cache
            .set("k", "v", Some(Duration::from_secs(10)))
            .await
            .unwrap();

        // Backdate the entry past its TTL
        {
            let mut entries = cache.entries.lock().await;
            entries.get_mut("k").unwrap().created_at = Utc::now() - chrono::Duration::seconds(11);
        }

        assert_eq!(cache.get("k").await.unwrap(), None);
        let entries = cache.entries.lock().await;
        assert!(!entries.contains_key("k"));
    }

    #[tokio::test]
    async fn test_repeated_get_on_expired_key_is_noop() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Some(Duration::ZERO)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = MemoryCache::new();
        cache.set("k", "v", None).await.unwrap();
        cache.delete("k").await.unwrap();
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let cache = MemoryCache::new();
        cache.set("a", "1", None).await.unwrap();
        cache.set("b", "2", None).await.unwrap();
        cache.clear().await.unwrap();
        assert_eq!(cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_size_counts_only_live_entries() {
        let cache = MemoryCache::new();
        cache.set("live", "1", None).await.unwrap();
        cache
            .set("fresh", "2", Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        cache.set("dead", "3", Some(Duration::ZERO)).await.unwrap();

        assert_eq!(cache.size().await.unwrap(), 2);

        // size() must have evicted the expired entry, not just skipped it
        let entries = cache.entries.lock().await;
        assert!(!entries.contains_key("dead"));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value_and_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", "old", Some(Duration::ZERO)).await.unwrap();
        cache.set("k", "new", None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_writers_do_not_corrupt() {
        use std::sync::Arc;

        let cache = Arc::new(MemoryCache::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache
                    .set("shared", &format!("value-{}", i), None)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // One of the writers won; the value is a complete write, not a blend.
        let value = cache.get("shared").await.unwrap().unwrap();
        assert!(value.starts_with("value-"));
    }
}
