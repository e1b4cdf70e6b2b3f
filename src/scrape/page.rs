//! Parsed-page capability
//!
//! A narrow wrapper over the HTML parser exposing just what the rule engine
//! needs: CSS selection, text and attribute extraction, and the page's own
//! declared language. Instances are built per extraction and never cross an
//! await point.

use scraper::{ElementRef, Html, Selector};

/// A parsed HTML page
pub struct ParsedPage {
    doc: Html,
}

impl ParsedPage {
    /// Parses HTML text; the parser is lenient and never fails outright
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    /// Runs a CSS selector, returning matched elements in document order
    ///
    /// An unparsable selector selects nothing; rule data must not be able to
    /// abort an extraction.
    pub fn select(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(selector) {
            Ok(selector) => self.doc.select(&selector).collect(),
            Err(e) => {
                tracing::trace!(selector, error = %e, "skipping unparsable selector");
                Vec::new()
            }
        }
    }

    /// The trimmed text content of an element
    pub fn text_of(element: ElementRef<'_>) -> String {
        element.text().collect::<String>().trim().to_string()
    }

    /// A named attribute of an element
    pub fn attr_of(element: ElementRef<'_>, name: &str) -> Option<String> {
        element.value().attr(name).map(str::to_string)
    }

    /// The language the page declares about itself
    ///
    /// `<html lang>` wins over a `content-language` meta tag.
    pub fn language(&self) -> Option<String> {
        if let Some(element) = self.select("html[lang]").into_iter().next() {
            if let Some(lang) = Self::attr_of(element, "lang") {
                let lang = lang.trim().to_string();
                if !lang.is_empty() {
                    return Some(lang);
                }
            }
        }

        self.select(r#"meta[http-equiv="content-language" i]"#)
            .into_iter()
            .next()
            .and_then(|element| Self::attr_of(element, "content"))
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
    }
}
