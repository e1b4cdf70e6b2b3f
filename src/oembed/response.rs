//! oEmbed response payload

use serde::{Deserialize, Serialize};

/// A deserialized oEmbed endpoint response
///
/// Only the fields the renderer consumes are modeled; unknown fields are
/// ignored. `width` and `height` stay loose because providers return both
/// numbers and strings like `"100%"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OembedResponse {
    /// Resource type: "video", "rich", "photo", or "link"
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub author_name: Option<String>,

    #[serde(default)]
    pub author_url: Option<String>,

    #[serde(default)]
    pub provider_name: Option<String>,

    #[serde(default)]
    pub provider_url: Option<String>,

    /// Embeddable markup, present for video and rich types
    #[serde(default)]
    pub html: Option<String>,

    /// Image URL, present for photo types
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub width: Option<serde_json::Value>,

    #[serde(default)]
    pub height: Option<serde_json::Value>,

    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_response() {
        let raw = r#"{
            "type": "video",
            "version": "1.0",
            "title": "A video",
            "provider_name": "Example",
            "html": "<iframe src=\"https://example.com/embed/1\"></iframe>",
            "width": 640,
            "height": 360
        }"#;
        let response: OembedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.kind, "video");
        assert_eq!(response.title.as_deref(), Some("A video"));
        assert!(response.html.unwrap().contains("iframe"));
    }

    #[test]
    fn test_parse_photo_response() {
        let raw = r#"{
            "type": "photo",
            "url": "https://example.com/photo.jpg",
            "width": "100%",
            "height": null
        }"#;
        let response: OembedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.kind, "photo");
        assert_eq!(response.url.as_deref(), Some("https://example.com/photo.jpg"));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let raw = r#"{"type": "link", "title": "T", "cache_age": 86400, "extra": {"x": 1}}"#;
        let response: OembedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.kind, "link");
    }
}
