// lazy-embed: Rust/WASM lazily-loading video embed element.
// The core is host-agnostic and decides *when* to swap the preview for the iframe; `web` binds it to the DOM.

mod classify;
mod component;
mod error;
mod host;
mod logging;
mod render;
mod state;
mod triggers;
mod types;
mod web;

use wasm_bindgen::prelude::*;

pub use classify::classify;
pub use component::LazyEmbed;
pub use error::LazyEmbedError;
pub use host::{Host, Subscription};
pub use render::{render, Markup};
pub use types::*;
pub use web::{classify_url, enable_logging, LazyEmbedElement, WebHost, WebSubscription};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
