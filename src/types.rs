// Strong typing over strings. Configuration, provider classification, and load state.

use serde::{Deserialize, Serialize};

use crate::error::LazyEmbedError;

/// Element configuration passed from JS. Immutable for one attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedConfig {
    /// Video URL (YouTube, Vimeo, or any embeddable page).
    #[serde(default)]
    pub src: String,
    /// Image shown before the video loads.
    #[serde(default)]
    pub preview_image: String,
    #[serde(default = "default_alt")]
    pub alt: String,
    /// Container width, any CSS length.
    #[serde(default = "default_width")]
    pub width: String,
    /// Container height, any CSS length. `auto` leaves the height unset.
    #[serde(default = "default_height")]
    pub height: String,
    #[serde(default)]
    pub video_title: String,
    /// Load the video once the element scrolls into view.
    #[serde(default, alias = "playOnVisible")]
    pub load_on_visible: bool,
    /// Hold the preview image back until the element nears the viewport.
    #[serde(default)]
    pub lazy_preview: bool,
    /// Selector of an ancestor whose opening loads the video.
    #[serde(default)]
    pub load_on_parent_open: String,
    /// Selector of elements whose click loads the video.
    #[serde(default)]
    pub load_on_click_selector: String,
}

fn default_alt() -> String {
    "Video preview".to_string()
}

fn default_width() -> String {
    "100%".to_string()
}

fn default_height() -> String {
    "auto".to_string()
}

impl Default for EmbedConfig {
    fn default() -> Self {
        EmbedConfig {
            src: String::new(),
            preview_image: String::new(),
            alt: default_alt(),
            width: default_width(),
            height: default_height(),
            video_title: String::new(),
            load_on_visible: false,
            lazy_preview: false,
            load_on_parent_open: String::new(),
            load_on_click_selector: String::new(),
        }
    }
}

impl EmbedConfig {
    /// Config for a bare source URL with every other option defaulted.
    pub fn with_src(src: impl Into<String>) -> Self {
        EmbedConfig {
            src: src.into(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LazyEmbedError> {
        serde_json::from_str(json).map_err(|e| LazyEmbedError::InvalidConfig(e.to_string()))
    }

    /// Height as an inline style value; `None` when the height should stay unset.
    pub fn height_style(&self) -> Option<&str> {
        let height = self.height.trim();
        if height.is_empty() || height.eq_ignore_ascii_case("auto") {
            None
        } else {
            Some(height)
        }
    }

    pub fn preview_image(&self) -> Option<&str> {
        non_blank(&self.preview_image)
    }

    pub fn parent_selector(&self) -> Option<&str> {
        non_blank(&self.load_on_parent_open)
    }

    pub fn click_selector(&self) -> Option<&str> {
        non_blank(&self.load_on_click_selector)
    }

    /// Title announced for the iframe.
    pub fn frame_title(&self) -> &str {
        non_blank(&self.video_title).unwrap_or("Embedded video")
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Video hosting service recognized from the source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Youtube,
    Vimeo,
    #[default]
    Unknown,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Youtube => "youtube",
            Provider::Vimeo => "vimeo",
            Provider::Unknown => "unknown",
        }
    }
}

/// Derived once per attachment from the source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    #[serde(rename = "type")]
    pub provider: Provider,
    /// Provider-specific identifier, empty for unknown providers.
    pub id: String,
    /// Fully-qualified iframe source. Empty only when the source is empty.
    pub embed_url: String,
}

impl VideoInfo {
    pub fn is_embeddable(&self) -> bool {
        !self.embed_url.is_empty()
    }
}

/// Two-state load machine. `Loaded` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loaded,
}

impl LoadState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded)
    }
}

/// Intersection observation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityOptions {
    /// Margin grown around the viewport, in pixels.
    pub root_margin_px: u32,
    /// Fraction of the target that must be visible (0.0 to 1.0).
    pub threshold: f64,
}

impl VisibilityOptions {
    /// Video loading fires slightly ahead of the element entering view.
    pub const VIDEO: VisibilityOptions = VisibilityOptions {
        root_margin_px: 100,
        threshold: 0.1,
    };

    pub const PREVIEW: VisibilityOptions = VisibilityOptions {
        root_margin_px: 50,
        threshold: 0.1,
    };

    /// CSS `rootMargin` string.
    pub fn root_margin(&self) -> String {
        format!("{}px", self.root_margin_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = EmbedConfig::from_json("{}").unwrap();
        assert_eq!(config, EmbedConfig::default());
        assert_eq!(config.alt, "Video preview");
        assert_eq!(config.width, "100%");
        assert_eq!(config.height, "auto");
        assert!(!config.load_on_visible);
        assert_eq!(config.parent_selector(), None);
        assert_eq!(config.click_selector(), None);
    }

    #[test]
    fn config_reads_camel_case_keys() {
        let json = r#"{
            "src": "https://youtu.be/dQw4w9WgXcQ",
            "previewImage": "/thumb.jpg",
            "videoTitle": "Intro",
            "loadOnVisible": true,
            "loadOnParentOpen": "details.faq",
            "loadOnClickSelector": ".trigger"
        }"#;
        let config = EmbedConfig::from_json(json).unwrap();
        assert_eq!(config.preview_image(), Some("/thumb.jpg"));
        assert_eq!(config.frame_title(), "Intro");
        assert!(config.load_on_visible);
        assert_eq!(config.parent_selector(), Some("details.faq"));
        assert_eq!(config.click_selector(), Some(".trigger"));
    }

    #[test]
    fn play_on_visible_is_an_alias() {
        let config = EmbedConfig::from_json(r#"{"playOnVisible": true}"#).unwrap();
        assert!(config.load_on_visible);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = EmbedConfig::from_json(r#"{"loadOnVisible": "yes"}"#).unwrap_err();
        assert!(matches!(err, LazyEmbedError::InvalidConfig(_)));
    }

    #[test]
    fn auto_height_is_unset() {
        let mut config = EmbedConfig::default();
        assert_eq!(config.height_style(), None);
        config.height = "AUTO".to_string();
        assert_eq!(config.height_style(), None);
        config.height = "360px".to_string();
        assert_eq!(config.height_style(), Some("360px"));
    }

    #[test]
    fn blank_title_falls_back() {
        let config = EmbedConfig::default();
        assert_eq!(config.frame_title(), "Embedded video");
    }

    #[test]
    fn video_info_serializes_type_key() {
        let info = VideoInfo {
            provider: Provider::Vimeo,
            id: "1".to_string(),
            embed_url: "u".to_string(),
        };
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"type":"vimeo","id":"1","embedUrl":"u"}"#);
    }

    #[test]
    fn visibility_margins() {
        assert_eq!(VisibilityOptions::VIDEO.root_margin(), "100px");
        assert_eq!(VisibilityOptions::PREVIEW.root_margin(), "50px");
    }
}
