//! Scraping rule declarations
//!
//! Rules are data: a URL pattern, a site label, an optional locale, and per
//! field an ordered chain of selector rules. Rule files deserialize straight
//! into these types; the engine compiles the URL patterns once at
//! construction.

use crate::scrape::processors::Processor;
use serde::Deserialize;

/// Pattern of the mandatory universal fallback rule
pub const UNIVERSAL_PATTERN: &str = "^https?://";

/// A selector, or an ordered list of selectors tried in sequence
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Selectors {
    One(String),
    Many(Vec<String>),
}

impl Selectors {
    /// Iterates the selectors in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        match self {
            Selectors::One(s) => std::slice::from_ref(s).iter(),
            Selectors::Many(list) => list.iter(),
        }
        .map(String::as_str)
    }
}

/// How a value is pulled out of a matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMethod {
    /// The element's text content
    #[default]
    Text,

    /// A named attribute
    Attr,
}

/// One selector rule in a field's fallback chain
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorRule {
    /// Selector(s) to try against the page
    pub selector: Selectors,

    /// Extraction method; defaults to text
    #[serde(default)]
    pub method: ExtractMethod,

    /// Attribute name, required when method is `attr`
    #[serde(default)]
    pub attr: Option<String>,

    /// Collect every match of this rule into a list instead of stopping at
    /// the first
    #[serde(default, rename = "collect-all")]
    pub collect_all: bool,

    /// Optional value processor
    #[serde(default)]
    pub processor: Option<Processor>,
}

/// A named field with its ordered selector rules
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub name: String,

    #[serde(default)]
    pub required: bool,

    pub rules: Vec<SelectorRule>,
}

/// A site-matched rule set
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// Regex matched against the source URL
    pub pattern: String,

    /// Label identifying the site this rule targets
    pub site: String,

    /// Explicit locale for locale-sensitive processors; `"auto"` or absent
    /// defers to the page's own declared language
    #[serde(default)]
    pub locale: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

fn attr_rule(selector: &[&str], attr: &str, processor: Option<Processor>) -> SelectorRule {
    SelectorRule {
        selector: Selectors::Many(selector.iter().map(|s| s.to_string()).collect()),
        method: ExtractMethod::Attr,
        attr: Some(attr.to_string()),
        collect_all: false,
        processor,
    }
}

fn text_rule(selector: &str) -> SelectorRule {
    SelectorRule {
        selector: Selectors::One(selector.to_string()),
        method: ExtractMethod::Text,
        attr: None,
        collect_all: false,
        processor: None,
    }
}

/// The built-in rule catalog: just the universal Open Graph fallback
///
/// It matches any http(s) URL and reads the conventional self-description
/// tags, so every page resolves to at least a linkable label.
pub fn default_rules() -> Vec<RuleConfig> {
    vec![RuleConfig {
        pattern: UNIVERSAL_PATTERN.to_string(),
        site: "generic".to_string(),
        locale: None,
        fields: vec![
            FieldConfig {
                name: "title".to_string(),
                required: false,
                rules: vec![
                    attr_rule(
                        &[
                            r#"meta[property="og:title"]"#,
                            r#"meta[name="twitter:title"]"#,
                        ],
                        "content",
                        None,
                    ),
                    text_rule("title"),
                ],
            },
            FieldConfig {
                name: "description".to_string(),
                required: false,
                rules: vec![attr_rule(
                    &[
                        r#"meta[property="og:description"]"#,
                        r#"meta[name="twitter:description"]"#,
                        r#"meta[name="description"]"#,
                    ],
                    "content",
                    None,
                )],
            },
            FieldConfig {
                name: "image".to_string(),
                required: false,
                rules: vec![attr_rule(
                    &[
                        r#"meta[property="og:image"]"#,
                        r#"meta[name="twitter:image"]"#,
                    ],
                    "content",
                    Some(Processor::ResolveUrl),
                )],
            },
            FieldConfig {
                name: "site_name".to_string(),
                required: false,
                rules: vec![attr_rule(
                    &[r#"meta[property="og:site_name"]"#],
                    "content",
                    None,
                )],
            },
            FieldConfig {
                name: "url".to_string(),
                required: false,
                rules: vec![
                    attr_rule(
                        &[r#"link[rel="canonical"]"#],
                        "href",
                        Some(Processor::ResolveUrl),
                    ),
                    attr_rule(
                        &[r#"meta[property="og:url"]"#],
                        "content",
                        Some(Processor::ResolveUrl),
                    ),
                ],
            },
        ],
    }]
}
