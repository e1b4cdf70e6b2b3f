//! Markup fragment rendering
//!
//! Thin downstream layer turning a field map or an oEmbed response into an
//! HTML fragment by plain string assembly. Everything interpolated into the
//! fragment is escaped, except provider-supplied embed markup which is the
//! point of the oEmbed exchange.

use crate::oembed::OembedResponse;
use crate::scrape::{ExtractedMetadata, FieldValue};
use html_escape::{encode_double_quoted_attribute, encode_text};

fn field<'a>(metadata: &'a ExtractedMetadata, name: &str) -> Option<&'a str> {
    metadata.get(name).and_then(FieldValue::first)
}

/// Renders a scraped field map as a link-card fragment
///
/// The engine guarantees `url` and `site_name` are present, so the card is
/// always linkable even for the minimal fallback result.
pub fn render_metadata(metadata: &ExtractedMetadata, fragment_id: &str) -> String {
    let url = field(metadata, "url").unwrap_or("");
    let site_name = field(metadata, "site_name").unwrap_or(url);
    let title = field(metadata, "title").unwrap_or(site_name);

    let mut out = String::new();
    out.push_str(&format!(
        r#"<figure class="kasumi-card" id="{}">"#,
        encode_double_quoted_attribute(fragment_id)
    ));
    out.push_str(&format!(
        r#"<a href="{}" rel="noopener">"#,
        encode_double_quoted_attribute(url)
    ));

    if let Some(image) = field(metadata, "image") {
        out.push_str(&format!(
            r#"<img src="{}" alt="">"#,
            encode_double_quoted_attribute(image)
        ));
    }

    out.push_str(&format!(
        r#"<span class="kasumi-card-title">{}</span>"#,
        encode_text(title)
    ));
    if let Some(description) = field(metadata, "description") {
        out.push_str(&format!(
            r#"<span class="kasumi-card-description">{}</span>"#,
            encode_text(description)
        ));
    }
    out.push_str(&format!(
        r#"<span class="kasumi-card-site">{}</span>"#,
        encode_text(site_name)
    ));

    out.push_str("</a></figure>");
    out
}

/// Renders an oEmbed response as an embed fragment
pub fn render_oembed(response: &OembedResponse, content_url: &str, fragment_id: &str) -> String {
    let id = encode_double_quoted_attribute(fragment_id).to_string();

    match response.kind.as_str() {
        "video" | "rich" => {
            if let Some(html) = response.html.as_deref() {
                return format!(r#"<figure class="kasumi-embed" id="{}">{}</figure>"#, id, html);
            }
            render_link_card(response, content_url, &id)
        }
        "photo" => {
            let src = response.url.as_deref().unwrap_or(content_url);
            let alt = response.title.as_deref().unwrap_or("");
            format!(
                r#"<figure class="kasumi-embed" id="{}"><a href="{}"><img src="{}" alt="{}"></a></figure>"#,
                id,
                encode_double_quoted_attribute(content_url),
                encode_double_quoted_attribute(src),
                encode_double_quoted_attribute(alt),
            )
        }
        _ => render_link_card(response, content_url, &id),
    }
}

fn render_link_card(response: &OembedResponse, content_url: &str, id: &str) -> String {
    let label = response
        .title
        .as_deref()
        .or(response.provider_name.as_deref())
        .unwrap_or(content_url);
    format!(
        r#"<figure class="kasumi-embed" id="{}"><a href="{}" rel="noopener">{}</a></figure>"#,
        id,
        encode_double_quoted_attribute(content_url),
        encode_text(label),
    )
}

/// Renders the explicit "content unavailable" presentation
///
/// Used when endpoint resolution fails terminally; the reader still gets a
/// working link instead of a raw error.
pub fn render_unavailable(content_url: &str, fragment_id: &str) -> String {
    format!(
        r#"<p class="kasumi-unavailable" id="{}"><a href="{}" rel="noopener">{}</a></p>"#,
        encode_double_quoted_attribute(fragment_id),
        encode_double_quoted_attribute(content_url),
        encode_text(content_url),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn metadata(pairs: &[(&str, &str)]) -> ExtractedMetadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::Single(v.to_string())))
            .collect::<BTreeMap<_, _>>()
    }

    #[test]
    fn test_render_metadata_full_card() {
        let meta = metadata(&[
            ("title", "An Article"),
            ("description", "About things."),
            ("image", "https://example.com/img.png"),
            ("site_name", "example.com"),
            ("url", "https://example.com/article"),
        ]);
        let html = render_metadata(&meta, "embed-1");

        assert!(html.contains(r#"id="embed-1""#));
        assert!(html.contains(r#"href="https://example.com/article""#));
        assert!(html.contains("An Article"));
        assert!(html.contains("About things."));
        assert!(html.contains(r#"src="https://example.com/img.png""#));
    }

    #[test]
    fn test_render_metadata_minimal_fallback() {
        let meta = metadata(&[("site_name", "example.com"), ("url", "https://example.com/x")]);
        let html = render_metadata(&meta, "embed-1");
        assert!(html.contains("example.com"));
        assert!(html.contains(r#"href="https://example.com/x""#));
        assert!(!html.contains("kasumi-card-description"));
    }

    #[test]
    fn test_render_metadata_escapes_content() {
        let meta = metadata(&[
            ("title", "<script>alert(1)</script>"),
            ("site_name", "evil"),
            ("url", r#"https://example.com/"quote"#),
        ]);
        let html = render_metadata(&meta, "embed-1");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains(r#"/"quote""#));
    }

    #[test]
    fn test_render_oembed_video_passes_html_through() {
        let response = OembedResponse {
            kind: "video".to_string(),
            version: None,
            title: Some("Clip".to_string()),
            author_name: None,
            author_url: None,
            provider_name: None,
            provider_url: None,
            html: Some(r#"<iframe src="https://e.example/embed/1"></iframe>"#.to_string()),
            url: None,
            width: None,
            height: None,
            thumbnail_url: None,
        };
        let html = render_oembed(&response, "https://e.example/v/1", "embed-2");
        assert!(html.contains("<iframe"));
        assert!(html.contains("kasumi-embed"));
    }

    #[test]
    fn test_render_oembed_photo() {
        let response = OembedResponse {
            kind: "photo".to_string(),
            version: None,
            title: Some("Sunset".to_string()),
            author_name: None,
            author_url: None,
            provider_name: None,
            provider_url: None,
            html: None,
            url: Some("https://e.example/p.jpg".to_string()),
            width: None,
            height: None,
            thumbnail_url: None,
        };
        let html = render_oembed(&response, "https://e.example/photos/1", "embed-3");
        assert!(html.contains(r#"src="https://e.example/p.jpg""#));
        assert!(html.contains(r#"alt="Sunset""#));
    }

    #[test]
    fn test_render_oembed_link_falls_back_to_card() {
        let response = OembedResponse {
            kind: "link".to_string(),
            version: None,
            title: Some("A Page".to_string()),
            author_name: None,
            author_url: None,
            provider_name: None,
            provider_url: None,
            html: None,
            url: None,
            width: None,
            height: None,
            thumbnail_url: None,
        };
        let html = render_oembed(&response, "https://e.example/page", "embed-4");
        assert!(html.contains("A Page"));
        assert!(html.contains(r#"href="https://e.example/page""#));
    }

    #[test]
    fn test_render_unavailable() {
        let html = render_unavailable("https://gone.example/x", "embed-5");
        assert!(html.contains("kasumi-unavailable"));
        assert!(html.contains(r#"href="https://gone.example/x""#));
    }
}
