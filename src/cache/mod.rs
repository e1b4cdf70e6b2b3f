//! Cache storage for fetched payloads
//!
//! This module contains the caching layer used by the fetch wrapper:
//! - A per-entry expiry model with optional TTLs
//! - Deterministic cache key derivation
//! - A backend-agnostic storage trait
//! - In-memory and SQLite-backed implementations

mod entry;
mod key;
mod memory;
mod sqlite;
mod traits;

pub use entry::CacheEntry;
pub use key::cache_key;
pub use memory::MemoryCache;
pub use sqlite::SqliteCache;
pub use traits::{CacheError, CacheResult, CacheStorage};
