//! Deterministic cache key derivation
//!
//! Keys are derived from the request triple `(url, accept, identity)` so the
//! same logical request always lands on the same entry, and any change to one
//! component yields a different key.

use sha2::{Digest, Sha256};

/// Derives the cache key for a request triple
///
/// Each component is length-framed before hashing so that, for example,
/// `("ab", "c")` and `("a", "bc")` cannot collide. The result is a
/// hex-encoded SHA-256 digest, safe to use as a map key, SQLite primary key,
/// or filename.
pub fn cache_key(url: &str, accept: &str, identity: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [url, accept, identity] {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}
