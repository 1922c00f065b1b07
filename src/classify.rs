// Source URL classification. Pure string matching, no network access.
// Anything unrecognized is embedded verbatim.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{Provider, VideoInfo};

const YOUTUBE_PATTERN: &str =
    r#"(?i)(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#;

// `[0-9]` rather than `\d`: ids are ASCII digits only.
const VIMEO_PATTERN: &str = r"(?i)(?:vimeo\.com/(?:video/)?|player\.vimeo\.com/video/)([0-9]+)";

fn youtube_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(YOUTUBE_PATTERN).expect("youtube pattern is valid"))
}

fn vimeo_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VIMEO_PATTERN).expect("vimeo pattern is valid"))
}

/// Classify a source URL and derive its iframe URL.
pub fn classify(src: &str) -> VideoInfo {
    if src.is_empty() {
        return VideoInfo::default();
    }

    if let Some(id) = capture(youtube_regex(), src) {
        return VideoInfo {
            provider: Provider::Youtube,
            embed_url: format!("https://www.youtube.com/embed/{}?autoplay=1", id),
            id: id.to_string(),
        };
    }

    if let Some(id) = capture(vimeo_regex(), src) {
        return VideoInfo {
            provider: Provider::Vimeo,
            embed_url: format!("https://player.vimeo.com/video/{}?autoplay=1", id),
            id: id.to_string(),
        };
    }

    VideoInfo {
        provider: Provider::Unknown,
        id: String::new(),
        embed_url: src.to_string(),
    }
}

fn capture<'a>(re: &Regex, src: &'a str) -> Option<&'a str> {
    re.captures(src)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| !id.is_empty())
}
