//! Pipeline integration surface
//!
//! The conversion pipeline calls [`Unfurler::unfurl`] once per recognized
//! block, handing it a per-call [`UnfurlContext`]. The unfurler owns the
//! immutable provider and rule tables; everything call-specific —
//! cancellation, fetch capability, frontmatter, id generation — arrives in
//! the context, so one unfurler serves any number of concurrent calls.

use crate::config::Config;
use crate::fetch::FetchCapability;
use crate::oembed::EndpointResolver;
use crate::render;
use crate::scrape::{ExtractedMetadata, RuleEngine};
use crate::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Generates unique fragment ids within one document conversion
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id with the given prefix, e.g. `embed-3`
    pub fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", prefix, n)
    }
}

/// Per-call context supplied by the conversion pipeline
pub struct UnfurlContext {
    /// Cooperative cancellation for the whole block conversion
    pub cancel: CancellationToken,

    /// The fetch capability to use for this call
    pub fetcher: Arc<dyn FetchCapability>,

    /// Frontmatter of the document being converted
    pub frontmatter: HashMap<String, String>,

    /// Fragment id generator, shared across the document's blocks
    pub id_gen: Arc<IdGenerator>,
}

impl UnfurlContext {
    /// Builds a context with empty frontmatter and a fresh id generator
    pub fn new(fetcher: Arc<dyn FetchCapability>) -> Self {
        Self {
            cancel: CancellationToken::new(),
            fetcher,
            frontmatter: HashMap::new(),
            id_gen: Arc::new(IdGenerator::new()),
        }
    }
}

/// Ties endpoint resolution, rule scraping, and rendering together
pub struct Unfurler {
    resolver: EndpointResolver,
    engine: RuleEngine,
}

impl Unfurler {
    /// Builds an unfurler from configured provider and rule tables
    pub fn new(config: &Config) -> Self {
        Self {
            resolver: EndpointResolver::new(&config.providers),
            engine: RuleEngine::new(&config.rules),
        }
    }

    /// The endpoint resolver, for callers that want embeds only
    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    /// The rule engine, for callers that want the raw field map
    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Resolves a URL to a markup fragment
    ///
    /// URLs with a static oEmbed endpoint go through the embed path; a
    /// terminal embed failure degrades to the explicit "unavailable"
    /// presentation rather than surfacing a raw error into the document.
    /// Everything else is scraped, which always yields a renderable map.
    pub async fn unfurl(&self, url: &str, ctx: &UnfurlContext) -> Result<String> {
        let fragment_id = ctx.id_gen.next_id("kasumi-embed");

        if self.resolver.has_static_endpoint(url) {
            match self
                .resolver
                .fetch_embed(url, ctx.fetcher.as_ref(), &ctx.cancel)
                .await
            {
                Ok(response) => return Ok(render::render_oembed(&response, url, &fragment_id)),
                Err(crate::oembed::OembedError::Fetch(e)) if e.is_cancelled() => {
                    return Err(e.into());
                }
                Err(error) => {
                    tracing::warn!(url, %error, "embed resolution failed, rendering unavailable");
                    return Ok(render::render_unavailable(url, &fragment_id));
                }
            }
        }

        let metadata = self
            .engine
            .scrape(url, ctx.fetcher.as_ref(), &ctx.cancel)
            .await?;
        Ok(render::render_metadata(&metadata, &fragment_id))
    }

    /// Resolves a URL to its raw field map, skipping rendering
    pub async fn scrape(&self, url: &str, ctx: &UnfurlContext) -> Result<ExtractedMetadata> {
        Ok(self
            .engine
            .scrape(url, ctx.fetcher.as_ref(), &ctx.cancel)
            .await?)
    }
}
