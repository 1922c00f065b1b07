// Element lifecycle: attach -> classify + arm triggers, detach -> release everything.
// Load state belongs to the instance and survives detach/re-attach.

use std::cell::Ref;
use std::rc::Rc;

use crate::classify::classify;
use crate::host::Host;
use crate::render::Markup;
use crate::state::Loader;
use crate::triggers::TriggerSet;
use crate::types::{EmbedConfig, LoadState, VideoInfo};

/// A lazily-loading video embed bound to one host element.
pub struct LazyEmbed<H: Host> {
    loader: Loader<H>,
    triggers: TriggerSet<H::Subscription>,
}

impl<H: Host> LazyEmbed<H> {
    pub fn new(host: Rc<H>) -> Self {
        LazyEmbed {
            loader: Loader::new(host),
            triggers: TriggerSet::default(),
        }
    }

    /// Connect to the host with `config` and return the initial render.
    ///
    /// Re-attaching without a detach first releases the previous triggers.
    pub fn attach(&mut self, config: EmbedConfig) -> Markup {
        self.triggers.release();

        let info = classify(&config.src);
        tracing::debug!(
            provider = info.provider.as_str(),
            id = %info.id,
            "classified source"
        );
        self.loader.configure(config, info);
        self.triggers = TriggerSet::arm(&self.loader);

        self.loader.render()
    }

    /// Disconnect every observer and listener. Safe to call at any time.
    pub fn detach(&mut self) {
        self.triggers.release();
    }

    /// Swap the preview for the embed. Idempotent; no-op without an embed URL.
    pub fn load_video(&self) {
        self.loader.load();
    }

    /// Click on the element itself.
    pub fn handle_click(&self) {
        if !self.is_loaded() {
            self.load_video();
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state().is_loaded()
    }

    pub fn state(&self) -> LoadState {
        self.loader.state()
    }

    pub fn video_info(&self) -> Ref<'_, VideoInfo> {
        self.loader.info()
    }

    pub fn config(&self) -> Ref<'_, EmbedConfig> {
        self.loader.config()
    }

    pub fn render(&self) -> Markup {
        self.loader.render()
    }

    /// Live observer and listener registrations.
    pub fn active_triggers(&self) -> usize {
        self.triggers.len()
    }
}

impl<H: Host> Drop for LazyEmbed<H> {
    fn drop(&mut self) {
        self.triggers.release();
    }
}
