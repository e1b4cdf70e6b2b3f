//! Value processors
//!
//! Pure transformations applied to raw extracted strings. Processors are a
//! tagged union so rule files can name them with parameters; an arbitrary
//! function can also be plugged in from code. A processor never errors: bad
//! input degrades to `None` and the field simply ends up absent.

use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Context handed to every processor invocation
#[derive(Debug, Clone, Copy)]
pub struct ProcessorContext<'a> {
    /// The page URL, used to absolutize relative references
    pub base_url: &'a Url,

    /// Effective locale for locale-sensitive formatting, if any
    pub locale: Option<&'a str>,
}

/// One step of a substitution chain
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceStep {
    pub pattern: String,
    pub replacement: String,
}

/// A named value processor, or a plugged-in function
#[derive(Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Processor {
    /// Resolves a relative URL against the page URL; absolute and
    /// protocol-relative URLs pass through with their meaning intact
    ResolveUrl,

    /// Strips a leading prefix (e.g. the `@` on a handle) when present
    StripPrefix { prefix: String },

    /// Formats a numeric string as a price with locale-aware separators and
    /// a fixed currency symbol
    FormatCurrency { symbol: String },

    /// Applies regex substitutions in order; an unparsable step is skipped
    RegexReplace { steps: Vec<ReplaceStep> },

    /// Keeps only the first regex match (capture group 1 when present)
    FirstMatch { pattern: String },

    /// Passes the value through only if it contains `include` (when set)
    /// and does not contain `exclude` (when set)
    Filter {
        #[serde(default)]
        include: Option<String>,
        #[serde(default)]
        exclude: Option<String>,
    },

    /// An arbitrary function supplied from code; not expressible in config
    #[serde(skip)]
    Custom(CustomProcessor),
}

/// Wrapper for plugged-in processor functions
#[derive(Clone)]
pub struct CustomProcessor(
    pub Arc<dyn Fn(&str, &ProcessorContext<'_>) -> Option<String> + Send + Sync>,
);

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Processor::ResolveUrl => write!(f, "ResolveUrl"),
            Processor::StripPrefix { prefix } => write!(f, "StripPrefix({:?})", prefix),
            Processor::FormatCurrency { symbol } => write!(f, "FormatCurrency({:?})", symbol),
            Processor::RegexReplace { steps } => write!(f, "RegexReplace({} steps)", steps.len()),
            Processor::FirstMatch { pattern } => write!(f, "FirstMatch({:?})", pattern),
            Processor::Filter { include, exclude } => {
                write!(f, "Filter(include={:?}, exclude={:?})", include, exclude)
            }
            Processor::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl Processor {
    /// Applies the processor; `None` means the value is dropped
    pub fn apply(&self, value: &str, ctx: &ProcessorContext<'_>) -> Option<String> {
        let result = match self {
            Processor::ResolveUrl => resolve_url(value, ctx.base_url),
            Processor::StripPrefix { prefix } => {
                Some(value.strip_prefix(prefix.as_str()).unwrap_or(value).to_string())
            }
            Processor::FormatCurrency { symbol } => format_currency(value, symbol, ctx.locale),
            Processor::RegexReplace { steps } => Some(apply_replacements(value, steps)),
            Processor::FirstMatch { pattern } => first_match(value, pattern),
            Processor::Filter { include, exclude } => {
                let included = include.as_ref().map_or(true, |s| value.contains(s.as_str()));
                let excluded = exclude.as_ref().is_some_and(|s| value.contains(s.as_str()));
                if included && !excluded {
                    Some(value.to_string())
                } else {
                    None
                }
            }
            Processor::Custom(custom) => (custom.0)(value, ctx),
        };
        result.filter(|s| !s.is_empty())
    }
}

/// Absolutizes a URL reference against the page URL
///
/// Already-absolute http(s) URLs pass through untouched; protocol-relative
/// references inherit the page's scheme; anything else is joined against the
/// base. Unresolvable references degrade to `None`.
fn resolve_url(value: &str, base: &Url) -> Option<String> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        return Some(value.to_string());
    }
    if let Some(rest) = value.strip_prefix("//") {
        return Some(format!("{}://{}", base.scheme(), rest));
    }
    base.join(value).ok().map(|url| url.to_string())
}

/// Applies a chain of regex substitutions, skipping unparsable steps
fn apply_replacements(value: &str, steps: &[ReplaceStep]) -> String {
    let mut current = value.to_string();
    for step in steps {
        match Regex::new(&step.pattern) {
            Ok(re) => current = re.replace_all(&current, step.replacement.as_str()).into_owned(),
            Err(e) => {
                tracing::trace!(pattern = %step.pattern, error = %e, "skipping bad replace step");
            }
        }
    }
    current
}

/// Keeps only the first match of the pattern
fn first_match(value: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let caps = re.captures(value)?;
    let matched = caps.get(1).or_else(|| caps.get(0))?;
    Some(matched.as_str().to_string())
}

/// Thousands and decimal separators for a locale's primary subtag
fn separators(locale: Option<&str>) -> (char, char) {
    let primary = locale
        .unwrap_or("")
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_lowercase();
    match primary.as_str() {
        "de" | "es" | "it" | "nl" | "pt" | "id" | "tr" => ('.', ','),
        "fr" | "ru" | "pl" | "cs" | "sv" | "fi" | "nb" => (' ', ','),
        // Invariant default
        _ => (',', '.'),
    }
}

/// Formats a scraped numeric string as a price
///
/// The input is read as an invariant decimal (`1234.56`, possibly with `,`
/// grouping); the output regroups it with the locale's separators and the
/// given currency symbol. Input with no digits degrades to `None`.
fn format_currency(value: &str, symbol: &str, locale: Option<&str>) -> Option<String> {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let (int_part, frac_part) = match cleaned.split_once('.') {
        Some((int_part, frac)) => (int_part.to_string(), Some(frac.to_string())),
        None => (cleaned, None),
    };
    let int_part = if int_part.is_empty() {
        "0".to_string()
    } else {
        int_part
    };

    let (group_sep, decimal_sep) = separators(locale);

    // Group the integer digits in threes from the right
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(group_sep);
        }
        grouped.push(*c);
    }

    let mut formatted = format!("{}{}", symbol, grouped);
    if let Some(frac) = frac_part {
        if !frac.is_empty() {
            formatted.push(decimal_sep);
            formatted.push_str(&frac);
        }
    }
    Some(formatted)
}
