//! Endpoint resolution algorithm
//!
//! Resolution is a two-step fallback: consult the compiled scheme map, and
//! when no pattern matches, fetch the page itself and look for the
//! well-known oEmbed discovery `<link>` in its raw markup.

use crate::fetch::{FetchCapability, FetchError};
use crate::oembed::providers::{Provider, SchemeMap};
use crate::oembed::response::OembedResponse;
use crate::oembed::OembedError;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Resolves content URLs to oEmbed endpoint URLs
///
/// The scheme map is built once at construction and read-only afterwards;
/// the fetch capability is supplied per call so one resolver can serve many
/// concurrent pipeline invocations.
pub struct EndpointResolver {
    scheme_map: SchemeMap,
}

impl EndpointResolver {
    /// Builds a resolver from a provider table
    pub fn new(providers: &[Provider]) -> Self {
        Self {
            scheme_map: SchemeMap::build(providers),
        }
    }

    /// Whether the scheme map alone can resolve this URL (no discovery)
    pub fn has_static_endpoint(&self, content_url: &str) -> bool {
        self.scheme_map.lookup(content_url).is_some()
    }

    /// Resolves a content URL to an absolute endpoint call URL
    ///
    /// On a scheme-map hit the endpoint call carries the content URL and a
    /// JSON format flag as query parameters. On a miss the page is fetched
    /// and scanned for a discovery link; if that also fails the result is
    /// [`OembedError::NoEndpoint`].
    pub async fn resolve(
        &self,
        content_url: &str,
        fetcher: &dyn FetchCapability,
        cancel: &CancellationToken,
    ) -> Result<String, OembedError> {
        if let Some(endpoint_url) = self.scheme_map.lookup(content_url) {
            let mut endpoint = Url::parse(endpoint_url)?;
            endpoint
                .query_pairs_mut()
                .append_pair("url", content_url)
                .append_pair("format", "json");
            return Ok(endpoint.to_string());
        }

        self.discover(content_url, fetcher, cancel).await
    }

    /// Discovery fallback: fetch the page and scan for the oEmbed link
    async fn discover(
        &self,
        content_url: &str,
        fetcher: &dyn FetchCapability,
        cancel: &CancellationToken,
    ) -> Result<String, OembedError> {
        let page = match fetcher.fetch(content_url, "text/html", cancel).await {
            Ok(page) => page,
            Err(FetchError::Cancelled { url }) => {
                return Err(FetchError::Cancelled { url }.into());
            }
            Err(error @ FetchError::CrossOrigin { .. }) => {
                // Expected in browser-hosted callers, not actionable here
                tracing::debug!(url = content_url, %error, "discovery fetch blocked");
                return Err(OembedError::NoEndpoint {
                    url: content_url.to_string(),
                });
            }
            Err(error) => {
                tracing::warn!(url = content_url, %error, "discovery fetch failed");
                return Err(OembedError::NoEndpoint {
                    url: content_url.to_string(),
                });
            }
        };

        let Some(href) = find_discovery_href(&page.body) else {
            return Err(OembedError::NoEndpoint {
                url: content_url.to_string(),
            });
        };

        let base = Url::parse(content_url)?;
        Ok(base.join(&href)?.to_string())
    }

    /// Resolves the endpoint and fetches its JSON response
    pub async fn fetch_embed(
        &self,
        content_url: &str,
        fetcher: &dyn FetchCapability,
        cancel: &CancellationToken,
    ) -> Result<OembedResponse, OembedError> {
        let endpoint = self.resolve(content_url, fetcher, cancel).await?;
        let response = fetcher
            .fetch(&endpoint, "application/json", cancel)
            .await?;

        serde_json::from_str(&response.body).map_err(|e| OembedError::InvalidResponse {
            url: endpoint,
            message: e.to_string(),
        })
    }
}

/// Scans raw markup for an oEmbed discovery link and returns its href
///
/// The scan runs over the raw text rather than a parsed tree, so it works on
/// pages too mangled for the HTML parser. JSON endpoints are preferred over
/// XML ones when a page advertises both. The href is HTML-entity-decoded
/// before being returned.
fn find_discovery_href(html: &str) -> Option<String> {
    let link_re = Regex::new(r"(?is)<link\b[^>]*>").ok()?;
    let href_re = Regex::new(r#"(?is)href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#).ok()?;

    for mime in ["application/json+oembed", "text/xml+oembed"] {
        let type_re = Regex::new(&format!(
            r#"(?is)type\s*=\s*["']?{}["'\s>]"#,
            regex::escape(mime)
        ))
        .ok()?;

        for tag in link_re.find_iter(html) {
            let tag = tag.as_str();
            if !type_re.is_match(tag) {
                continue;
            }
            let Some(caps) = href_re.captures(tag) else {
                continue;
            };
            let raw = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or("");
            let decoded = html_escape::decode_html_entities(raw).trim().to_string();
            if !decoded.is_empty() {
                return Some(decoded);
            }
        }
    }

    None
}
