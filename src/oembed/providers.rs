//! Provider table and scheme map
//!
//! Providers declare which URL shapes ("schemes") they can describe and the
//! endpoint that describes them. The table is compiled once into an ordered
//! scheme map at resolver construction; the map is immutable afterwards and
//! safe to share across tasks without locking.

use regex::Regex;
use serde::Deserialize;

/// An oEmbed provider and its endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Provider {
    /// Provider name, for logs and diagnostics
    pub name: String,

    /// Provider home URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Endpoints the provider exposes
    pub endpoints: Vec<Endpoint>,
}

/// A single endpoint with the URL schemes it serves
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    /// URL patterns this endpoint serves; `*` matches any run of
    /// characters, including path separators
    pub schemes: Vec<String>,

    /// The endpoint URL to call
    pub url: String,

    /// Whether the provider also supports on-page discovery
    #[serde(default)]
    pub discovery: bool,
}

/// One compiled scheme entry
#[derive(Debug)]
struct SchemeEntry {
    pattern: String,
    regex: Regex,
    endpoint_url: String,
}

/// Ordered scheme-pattern map, built once from a provider table
///
/// Iteration order is declaration order and the first matching pattern wins.
/// Registering an identical literal pattern again replaces its endpoint in
/// place (last write wins) without disturbing the order, so later providers
/// never remove earlier entries.
#[derive(Debug, Default)]
pub struct SchemeMap {
    entries: Vec<SchemeEntry>,
}

impl SchemeMap {
    /// Builds the map from a provider table
    ///
    /// Patterns that fail to compile are skipped with a warning rather than
    /// failing the whole table; a provider list is data, not code.
    pub fn build(providers: &[Provider]) -> Self {
        let mut map = SchemeMap::default();
        for provider in providers {
            for endpoint in &provider.endpoints {
                for scheme in &endpoint.schemes {
                    map.insert(scheme, &endpoint.url, &provider.name);
                }
            }
        }
        map
    }

    fn insert(&mut self, scheme: &str, endpoint_url: &str, provider: &str) {
        let pattern = scheme.to_lowercase();

        if let Some(existing) = self.entries.iter_mut().find(|e| e.pattern == pattern) {
            existing.endpoint_url = endpoint_url.to_string();
            return;
        }

        match compile_scheme_pattern(&pattern) {
            Ok(regex) => self.entries.push(SchemeEntry {
                pattern,
                regex,
                endpoint_url: endpoint_url.to_string(),
            }),
            Err(e) => {
                tracing::warn!(provider, scheme, error = %e, "skipping unparsable scheme pattern");
            }
        }
    }

    /// Finds the endpoint URL for the first pattern matching the content URL
    ///
    /// Matching is against the lowercased URL, since patterns themselves are
    /// lowercased at build time.
    pub fn lookup(&self, content_url: &str) -> Option<&str> {
        let candidate = content_url.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.regex.is_match(&candidate))
            .map(|entry| entry.endpoint_url.as_str())
    }

    /// Number of distinct patterns in the map
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no patterns
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compiles a scheme pattern into an anchored regex
///
/// Literal characters are escaped and `*` becomes `.*`. The wildcard
/// deliberately crosses path separators; provider tables in the wild are
/// authored against that looser behavior.
fn compile_scheme_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    Regex::new(&format!("^{}$", escaped))
}

/// Built-in provider table used when the config declares none
pub fn default_providers() -> Vec<Provider> {
    vec![
        Provider {
            name: "YouTube".to_string(),
            base_url: "https://www.youtube.com".to_string(),
            endpoints: vec![Endpoint {
                schemes: vec![
                    "https://*.youtube.com/watch*".to_string(),
                    "https://*.youtube.com/shorts/*".to_string(),
                    "https://youtu.be/*".to_string(),
                ],
                url: "https://www.youtube.com/oembed".to_string(),
                discovery: true,
            }],
        },
        Provider {
            name: "Vimeo".to_string(),
            base_url: "https://vimeo.com".to_string(),
            endpoints: vec![Endpoint {
                schemes: vec![
                    "https://vimeo.com/*".to_string(),
                    "https://player.vimeo.com/video/*".to_string(),
                ],
                url: "https://vimeo.com/api/oembed.json".to_string(),
                discovery: true,
            }],
        },
        Provider {
            name: "Flickr".to_string(),
            base_url: "https://www.flickr.com".to_string(),
            endpoints: vec![Endpoint {
                schemes: vec![
                    "https://*.flickr.com/photos/*".to_string(),
                    "https://flic.kr/p/*".to_string(),
                ],
                url: "https://www.flickr.com/services/oembed/".to_string(),
                discovery: true,
            }],
        },
        Provider {
            name: "SoundCloud".to_string(),
            base_url: "https://soundcloud.com".to_string(),
            endpoints: vec![Endpoint {
                schemes: vec!["https://soundcloud.com/*".to_string()],
                url: "https://soundcloud.com/oembed".to_string(),
                discovery: true,
            }],
        },
        Provider {
            name: "Spotify".to_string(),
            base_url: "https://open.spotify.com".to_string(),
            endpoints: vec![Endpoint {
                schemes: vec![
                    "https://open.spotify.com/track/*".to_string(),
                    "https://open.spotify.com/album/*".to_string(),
                    "https://open.spotify.com/playlist/*".to_string(),
                ],
                url: "https://open.spotify.com/oembed".to_string(),
                discovery: false,
            }],
        },
    ]
}
