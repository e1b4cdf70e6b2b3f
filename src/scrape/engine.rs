//! Rule engine
//!
//! Selects the first rule whose URL pattern matches the source URL, then
//! evaluates each field's selector chain against the parsed page. A
//! universal fallback rule is always present at the end of the effective
//! list, so selection never fails; a page with none of the expected elements
//! still yields a minimal result the renderer can link.

use crate::fetch::{FetchCapability, FetchError};
use crate::scrape::page::ParsedPage;
use crate::scrape::processors::ProcessorContext;
use crate::scrape::rules::{
    default_rules, ExtractMethod, FieldConfig, RuleConfig, SelectorRule, UNIVERSAL_PATTERN,
};
use crate::scrape::{ExtractedMetadata, FieldValue};
use regex::Regex;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A rule set with its URL pattern compiled
struct CompiledRule {
    pattern: Regex,
    site_label: String,
    locale: Option<String>,
    fields: Vec<FieldConfig>,
}

/// Rule-driven metadata extraction engine
///
/// The rule catalog is compiled once at construction and read-only
/// afterwards; the fetch capability is supplied per call.
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
}

impl RuleEngine {
    /// Builds an engine from an ordered rule list
    ///
    /// Rules whose pattern fails to compile are skipped with a warning
    /// (config validation reports them as hard errors at load time). If the
    /// list does not end with the universal pattern, the built-in universal
    /// rule is appended so every URL resolves to some rule.
    pub fn new(configs: &[RuleConfig]) -> Self {
        let mut rules = Vec::with_capacity(configs.len() + 1);
        for config in configs {
            match Regex::new(&config.pattern) {
                Ok(pattern) => rules.push(CompiledRule {
                    pattern,
                    site_label: config.site.clone(),
                    locale: config.locale.clone(),
                    fields: config.fields.clone(),
                }),
                Err(e) => {
                    tracing::warn!(site = %config.site, pattern = %config.pattern, error = %e,
                        "skipping rule with unparsable pattern");
                }
            }
        }

        let has_universal = rules
            .last()
            .is_some_and(|rule| rule.pattern.as_str() == UNIVERSAL_PATTERN);
        if !has_universal {
            for config in default_rules() {
                if let Ok(pattern) = Regex::new(&config.pattern) {
                    rules.push(CompiledRule {
                        pattern,
                        site_label: config.site.clone(),
                        locale: config.locale.clone(),
                        fields: config.fields.clone(),
                    });
                }
            }
        }

        Self { rules }
    }

    /// Builds an engine with only the built-in rule catalog
    pub fn with_defaults() -> Self {
        Self::new(&[])
    }

    /// Fetches the page and extracts its field map
    ///
    /// Network failures propagate; extraction itself cannot fail.
    pub async fn scrape(
        &self,
        url: &str,
        fetcher: &dyn FetchCapability,
        cancel: &CancellationToken,
    ) -> Result<ExtractedMetadata, FetchError> {
        let response = fetcher.fetch(url, "text/html", cancel).await?;

        let source = Url::parse(&response.url)
            .or_else(|_| Url::parse(url))
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: format!("unparsable source URL: {}", e),
            })?;

        Ok(self.extract(&response.body, &source))
    }

    /// Applies the matched rule to already-fetched markup
    pub fn extract(&self, html: &str, source_url: &Url) -> ExtractedMetadata {
        let page = ParsedPage::parse(html);
        let url_str = source_url.as_str();

        let Some(rule) = self.rules.iter().find(|r| r.pattern.is_match(url_str)) else {
            // Only reachable with an empty catalog and a non-http URL
            return minimal_result(source_url);
        };

        // Explicit rule locale wins over the page's own declaration
        let page_locale = page.language();
        let locale = match rule.locale.as_deref() {
            Some("auto") | None => page_locale.as_deref(),
            Some(explicit) => Some(explicit),
        };

        let ctx = ProcessorContext {
            base_url: source_url,
            locale,
        };

        let mut result = ExtractedMetadata::new();
        for field in &rule.fields {
            match extract_field(&page, field, &ctx) {
                Some(value) => {
                    result.insert(field.name.clone(), value);
                }
                None if field.required => {
                    tracing::debug!(site = %rule.site_label, field = %field.name,
                        "required field produced no value");
                }
                None => {}
            }
        }

        if result.is_empty() {
            return minimal_result(source_url);
        }

        // Downstream rendering always needs a label and a link target
        result
            .entry("site_name".to_string())
            .or_insert_with(|| FieldValue::Single(host_label(source_url)));
        result
            .entry("url".to_string())
            .or_insert_with(|| FieldValue::Single(url_str.to_string()));

        result
    }
}

/// Evaluates one field's selector chain; first rule with a value wins
fn extract_field(
    page: &ParsedPage,
    field: &FieldConfig,
    ctx: &ProcessorContext<'_>,
) -> Option<FieldValue> {
    for rule in &field.rules {
        if let Some(value) = eval_selector_rule(page, rule, ctx) {
            return Some(value);
        }
    }
    None
}

/// Evaluates one selector rule; selectors are tried in order until one
/// yields at least one non-empty processed value
fn eval_selector_rule(
    page: &ParsedPage,
    rule: &SelectorRule,
    ctx: &ProcessorContext<'_>,
) -> Option<FieldValue> {
    for selector in rule.selector.iter() {
        let mut values = Vec::new();

        for element in page.select(selector) {
            let raw = match rule.method {
                ExtractMethod::Text => ParsedPage::text_of(element),
                ExtractMethod::Attr => match rule.attr.as_deref() {
                    Some(name) => ParsedPage::attr_of(element, name).unwrap_or_default(),
                    None => {
                        tracing::trace!(selector, "attr rule without an attr name");
                        continue;
                    }
                },
            };

            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let processed = match &rule.processor {
                Some(processor) => processor.apply(raw, ctx),
                None => Some(raw.to_string()),
            };

            if let Some(value) = processed {
                values.push(value);
                if !rule.collect_all {
                    break;
                }
            }
        }

        if values.is_empty() {
            continue;
        }

        return Some(if rule.collect_all {
            FieldValue::Many(values)
        } else {
            FieldValue::Single(values.swap_remove(0))
        });
    }

    None
}

/// The minimal synthetic result: a linkable label from the URL's host
fn minimal_result(source_url: &Url) -> ExtractedMetadata {
    let mut result = ExtractedMetadata::new();
    result.insert(
        "site_name".to_string(),
        FieldValue::Single(host_label(source_url)),
    );
    result.insert(
        "url".to_string(),
        FieldValue::Single(source_url.as_str().to_string()),
    );
    result
}

fn host_label(url: &Url) -> String {
    url.host_str().unwrap_or(url.as_str()).to_string()
}
