// Per-instance load state shared between the element and its trigger callbacks.
// Single-threaded: Rc + Cell, check-and-set is synchronous.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use crate::host::Host;
use crate::render::{render, Markup};
use crate::types::{EmbedConfig, LoadState, VideoInfo};

#[derive(Default)]
pub(crate) struct Shared {
    config: RefCell<EmbedConfig>,
    info: RefCell<VideoInfo>,
    state: Cell<LoadState>,
    preview_ready: Cell<bool>,
}

/// Handle held by every trigger. All paths to `Loaded` go through [`Loader::load`].
pub(crate) struct Loader<H: Host> {
    host: Rc<H>,
    shared: Rc<Shared>,
}

impl<H: Host> Clone for Loader<H> {
    fn clone(&self) -> Self {
        Loader {
            host: Rc::clone(&self.host),
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<H: Host> Loader<H> {
    pub fn new(host: Rc<H>) -> Self {
        Loader {
            host,
            shared: Rc::new(Shared::default()),
        }
    }

    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    /// Install a new configuration. The load state is kept.
    pub fn configure(&self, config: EmbedConfig, info: VideoInfo) {
        // Preview is shown right away unless it waits for visibility.
        self.shared
            .preview_ready
            .set(!(config.lazy_preview && config.preview_image().is_some()));
        *self.shared.config.borrow_mut() = config;
        *self.shared.info.borrow_mut() = info;
    }

    pub fn config(&self) -> Ref<'_, EmbedConfig> {
        self.shared.config.borrow()
    }

    pub fn info(&self) -> Ref<'_, VideoInfo> {
        self.shared.info.borrow()
    }

    pub fn state(&self) -> LoadState {
        self.shared.state.get()
    }

    pub fn preview_ready(&self) -> bool {
        self.shared.preview_ready.get()
    }

    /// Transition `Unloaded -> Loaded` and re-render.
    ///
    /// Returns `false` without side effects when already loaded or when there is
    /// nothing to embed.
    pub fn load(&self) -> bool {
        if self.state().is_loaded() || !self.shared.info.borrow().is_embeddable() {
            return false;
        }
        self.shared.state.set(LoadState::Loaded);
        tracing::info!(embed_url = %self.shared.info.borrow().embed_url, "video loaded");
        self.commit();
        true
    }

    /// Show the lazily-held preview image. Only re-renders on the first call.
    pub fn reveal_preview(&self) -> bool {
        if self.shared.preview_ready.replace(true) {
            return false;
        }
        tracing::debug!("preview image revealed");
        if !self.state().is_loaded() {
            self.commit();
        }
        true
    }

    pub fn render(&self) -> Markup {
        render(
            &self.shared.config.borrow(),
            &self.shared.info.borrow(),
            self.state(),
            self.preview_ready(),
        )
    }

    fn commit(&self) {
        let markup = self.render();
        self.host.commit(&markup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::host::fake::FakeHost;
    use proptest::prelude::*;

    fn loader_for(config: EmbedConfig) -> (Rc<FakeHost>, Loader<FakeHost>) {
        let host = FakeHost::new();
        let loader = Loader::new(Rc::clone(&host));
        let info = classify(&config.src);
        loader.configure(config, info);
        (host, loader)
    }

    #[test]
    fn load_transitions_once() {
        let (host, loader) = loader_for(EmbedConfig::with_src("https://youtu.be/dQw4w9WgXcQ"));
        assert_eq!(loader.state(), LoadState::Unloaded);

        assert!(loader.load());
        assert!(!loader.load());
        assert_eq!(loader.state(), LoadState::Loaded);
        assert_eq!(host.commits.borrow().len(), 1);
        assert!(host.commits.borrow()[0].find("iframe").is_some());
    }

    #[test]
    fn empty_source_never_loads() {
        let (host, loader) = loader_for(EmbedConfig::default());
        assert!(!loader.load());
        assert_eq!(loader.state(), LoadState::Unloaded);
        assert!(host.commits.borrow().is_empty());
    }

    #[test]
    fn lazy_preview_starts_hidden() {
        let config = EmbedConfig {
            preview_image: "/p.png".to_string(),
            lazy_preview: true,
            ..EmbedConfig::with_src("v")
        };
        let (host, loader) = loader_for(config);
        assert!(!loader.preview_ready());

        assert!(loader.reveal_preview());
        assert!(!loader.reveal_preview());
        assert!(loader.preview_ready());
        assert_eq!(host.commits.borrow().len(), 1);
        assert!(host.commits.borrow()[0].find("img").is_some());
    }

    #[test]
    fn eager_preview_is_ready() {
        let config = EmbedConfig {
            preview_image: "/p.png".to_string(),
            ..EmbedConfig::with_src("v")
        };
        let (_host, loader) = loader_for(config);
        assert!(loader.preview_ready());
    }

    proptest! {
        /// However many times load is requested, exactly one transition happens.
        #[test]
        fn load_is_idempotent(src in ".{0,40}", attempts in 1usize..10) {
            let (host, loader) = loader_for(EmbedConfig::with_src(src.clone()));
            let transitions = (0..attempts).filter(|_| loader.load()).count();
            let expected = usize::from(!src.is_empty());
            prop_assert_eq!(transitions, expected);
            prop_assert_eq!(host.commits.borrow().len(), expected);
            prop_assert_eq!(loader.state().is_loaded(), !src.is_empty());
        }
    }
}
