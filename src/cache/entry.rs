//! Cache entry model and expiry rules
//!
//! An entry records the cached payload together with its creation time and
//! an optional time-to-live. Expiry is evaluated lazily at read time.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A single cached value with its expiry bookkeeping
///
/// Expiry rules:
/// - No TTL: the entry never expires.
/// - Zero TTL: the entry is expired immediately ("do not persist").
/// - Otherwise the entry expires once `now > created_at + ttl`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The cached payload
    pub payload: String,

    /// When the entry was stored
    pub created_at: DateTime<Utc>,

    /// Optional time-to-live
    pub ttl: Option<Duration>,
}

impl CacheEntry {
    /// Creates an entry timestamped now
    pub fn new(payload: String, ttl: Option<Duration>) -> Self {
        Self {
            payload,
            created_at: Utc::now(),
            ttl,
        }
    }

    /// Checks whether the entry has expired as of `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.ttl {
            None => false,
            Some(ttl) if ttl.is_zero() => true,
            Some(ttl) => {
                // TTLs beyond chrono's range are treated as "never expires"
                match chrono::Duration::from_std(ttl) {
                    Ok(ttl) => now > self.created_at + ttl,
                    Err(_) => false,
                }
            }
        }
    }

    /// Checks whether the entry has expired as of the current time
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
