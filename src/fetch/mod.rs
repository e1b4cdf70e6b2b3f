//! Fetching layer
//!
//! This module contains everything that touches the network:
//! - Building HTTP clients with a proper identity string
//! - The `FetchCapability` trait with its direct (always live) implementation
//! - The caching wrapper that makes repeat fetches cheap and remembers
//!   failures for a shorter window

mod cached;
mod capability;
mod client;

pub use cached::CachingFetcher;
pub use capability::{DirectFetcher, FetchCapability, FetchedResponse};
pub use client::build_http_client;

use thiserror::Error;

/// Errors produced by fetch operations
///
/// Cancellation and timeout are distinct variants so callers can tell a
/// cooperative abort apart from a slow origin. `CrossOrigin` exists for
/// browser-embedded hosts whose fetch capability is subject to CORS; the
/// native fetcher never produces it, but resolvers log it at a lower
/// severity since it is expected there, not a defect.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Request cancelled for {url}")]
    Cancelled { url: String },

    #[error("Connection failed for {url}")]
    Connect { url: String },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Cross-origin request blocked for {url}")]
    CrossOrigin { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    /// The HTTP status carried by this error, when there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error represents cooperative cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }
}
