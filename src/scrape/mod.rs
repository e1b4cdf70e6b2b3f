//! Rule-driven page scraping
//!
//! Given a fetched page and its source URL, the rule engine produces a map
//! of named fields by evaluating declarative, site-matched rules:
//! - Ordered rule sets selected by URL pattern, with a universal fallback
//! - Per-field ordered selector chains with first-non-empty semantics
//! - Composable, locale-aware value processors

mod engine;
mod page;
mod processors;
mod rules;

pub use engine::RuleEngine;
pub use page::ParsedPage;
pub use processors::{Processor, ProcessorContext, ReplaceStep};
pub use rules::{
    default_rules, ExtractMethod, FieldConfig, RuleConfig, SelectorRule, Selectors,
    UNIVERSAL_PATTERN,
};

use serde::Serialize;
use std::collections::BTreeMap;

/// A single extracted field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// One value
    Single(String),

    /// All matches of a collect-all rule
    Many(Vec<String>),
}

impl FieldValue {
    /// The value as a single string, when it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Single(s) => Some(s),
            FieldValue::Many(_) => None,
        }
    }

    /// The first value, regardless of shape
    pub fn first(&self) -> Option<&str> {
        match self {
            FieldValue::Single(s) => Some(s),
            FieldValue::Many(values) => values.first().map(String::as_str),
        }
    }
}

/// Field map produced by applying one matched rule to one fetched page
///
/// Absence of a field means no rule in its chain produced a non-empty value.
pub type ExtractedMetadata = BTreeMap<String, FieldValue>;
