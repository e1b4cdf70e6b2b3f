//! oEmbed endpoint resolution
//!
//! Maps a content URL to the provider endpoint that can describe it:
//! - A declarative provider table compiled into an ordered scheme map
//! - Discovery by scanning a fetched page for the well-known `<link>` hint
//! - Fetching and deserializing the endpoint's JSON response

mod providers;
mod resolver;
mod response;

pub use providers::{default_providers, Endpoint, Provider, SchemeMap};
pub use resolver::EndpointResolver;
pub use response::OembedResponse;

use thiserror::Error;

/// Errors produced by endpoint resolution
#[derive(Debug, Error)]
pub enum OembedError {
    #[error("No oEmbed endpoint found for {url}")]
    NoEndpoint { url: String },

    #[error("Invalid oEmbed response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("Fetch error: {0}")]
    Fetch(#[from] crate::fetch::FetchError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}
