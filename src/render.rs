// Pure render: (config, video info, load state) -> markup tree. No side effects.

use std::fmt;

use serde::Serialize;

use crate::types::{EmbedConfig, LoadState, VideoInfo};

const FRAME_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

/// One element of the render tree. Attribute and style order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Markup {
    pub tag: &'static str,
    pub attributes: Vec<(&'static str, String)>,
    pub style: Vec<(&'static str, String)>,
    pub children: Vec<Markup>,
}

impl Markup {
    pub fn new(tag: &'static str) -> Self {
        Markup {
            tag,
            attributes: Vec::new(),
            style: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_class(tag: &'static str, class: &str) -> Self {
        Markup::new(tag).attr("class", class)
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((name, value.into()));
        self
    }

    pub fn style(mut self, property: &'static str, value: impl Into<String>) -> Self {
        self.style.push((property, value.into()));
        self
    }

    pub fn child(mut self, child: Markup) -> Self {
        self.children.push(child);
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_style(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Inline `style` attribute text, `None` when no properties are set.
    pub fn style_text(&self) -> Option<String> {
        if self.style.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .style
            .iter()
            .map(|(p, v)| format!("{}: {};", p, v))
            .collect();
        Some(parts.join(" "))
    }

    /// Depth-first search for the first element with `tag`.
    pub fn find(&self, tag: &str) -> Option<&Markup> {
        if self.tag == tag {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(tag))
    }

    pub fn find_class(&self, class: &str) -> Option<&Markup> {
        let matches = self
            .get_attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class));
        if matches {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_class(class))
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "img" | "br" | "hr" | "input" | "meta" | "link")
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// HTML serialization.
impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attributes {
            if value.is_empty() {
                write!(f, " {}", name)?;
            } else {
                write!(f, " {}=\"{}\"", name, escape(value))?;
            }
        }
        if let Some(style) = self.style_text() {
            write!(f, " style=\"{}\"", escape(&style))?;
        }
        write!(f, ">")?;
        if is_void(self.tag) {
            return Ok(());
        }
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

/// Build the element's markup for the current state.
///
/// `preview_ready` gates the preview image when it is lazily loaded.
pub fn render(
    config: &EmbedConfig,
    info: &VideoInfo,
    state: LoadState,
    preview_ready: bool,
) -> Markup {
    let mut container =
        Markup::with_class("div", "lazy-embed-container").style("width", config.width.as_str());
    if let Some(height) = config.height_style() {
        container = container.style("height", height);
    }
    container = container.style("position", "relative");

    match state {
        LoadState::Unloaded => container.child(render_preview(config, preview_ready)),
        LoadState::Loaded => container.child(render_frame(config, info)),
    }
}

fn render_preview(config: &EmbedConfig, preview_ready: bool) -> Markup {
    let preview = match config.preview_image() {
        Some(src) if preview_ready => Markup::new("img")
            .attr("src", src)
            .attr("alt", config.alt.as_str())
            .attr("class", "preview-image"),
        _ => Markup::with_class("div", "placeholder")
            .child(Markup::with_class("div", "play-button")),
    };

    Markup::with_class("div", "preview-container")
        .child(preview)
        .child(
            Markup::with_class("div", "play-overlay").child(
                Markup::with_class("div", "play-button").attr("aria-label", "Play video"),
            ),
        )
}

fn render_frame(config: &EmbedConfig, info: &VideoInfo) -> Markup {
    Markup::with_class("div", "embed-responsive").child(
        Markup::new("iframe")
            .attr("src", info.embed_url.as_str())
            .attr("title", config.frame_title())
            .attr("frameborder", "0")
            .attr("allow", FRAME_ALLOW)
            .attr("allowfullscreen", ""),
    )
}
