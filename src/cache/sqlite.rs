//! SQLite cache backend
//!
//! A persistent key/value backend satisfying the same contract as the
//! in-memory cache. Each entry row stores the payload, creation timestamp,
//! and optional TTL; rows that fail to parse are purged and reported as
//! misses rather than errors.

use crate::cache::entry::CacheEntry;
use crate::cache::traits::{CacheError, CacheResult, CacheStorage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// SQL schema for the cache database
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    ttl_ms INTEGER
);
"#;

/// SQLite-backed cache
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Opens (or creates) a cache database at the given path
    pub fn new(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock_conn(&self) -> CacheResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CacheError::Backend(format!("cache lock poisoned: {}", e)))
    }

    /// Reconstructs an entry from a raw row, or `None` if the row is corrupt
    fn parse_row(payload: String, created_at: String, ttl_ms: Option<i64>) -> Option<CacheEntry> {
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .ok()?
            .with_timezone(&Utc);
        let ttl = match ttl_ms {
            None => None,
            Some(ms) if ms < 0 => return None,
            Some(ms) => Some(Duration::from_millis(ms as u64)),
        };
        Some(CacheEntry {
            payload,
            created_at,
            ttl,
        })
    }
}

#[async_trait]
impl CacheStorage for SqliteCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let conn = self.lock_conn()?;

        let row: Option<(String, String, Option<i64>)> = conn
            .query_row(
                "SELECT payload, created_at, ttl_ms FROM cache_entries WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((payload, created_at, ttl_ms)) = row else {
            return Ok(None);
        };

        match Self::parse_row(payload, created_at, ttl_ms) {
            Some(entry) if entry.is_expired() => {
                conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.payload)),
            None => {
                // Corrupt row; purge it and report a miss
                tracing::debug!(key, "purging corrupt cache entry");
                conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let conn = self.lock_conn()?;
        let now = Utc::now().to_rfc3339();
        let ttl_ms = ttl.map(|t| t.as_millis().min(i64::MAX as u128) as i64);
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, payload, created_at, ttl_ms)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, value, now, ttl_ms],
        )?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM cache_entries", [])?;
        Ok(())
    }

    async fn size(&self) -> CacheResult<usize> {
        let conn = self.lock_conn()?;

        // Evict expired and unparsable rows first so the count reflects
        // live entries only
        let rows: Vec<(String, String, String, Option<i64>)> = {
            let mut stmt =
                conn.prepare("SELECT key, payload, created_at, ttl_ms FROM cache_entries")?;
            let mapped = stmt.query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;
            mapped.collect::<Result<_, _>>()?
        };

        let mut live = 0usize;
        for (key, payload, created_at, ttl_ms) in rows {
            match Self::parse_row(payload, created_at, ttl_ms) {
                Some(entry) if !entry.is_expired() => live += 1,
                _ => {
                    conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
                }
            }
        }

        Ok(live)
    }
}
