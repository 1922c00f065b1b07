// Trigger controllers. Each one converges on Loader::load; the first to fire wins.
// Subscriptions are owned by the TriggerSet and released together on detach.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::LazyEmbedError;
use crate::host::{Host, Subscription};
use crate::state::Loader;
use crate::types::VisibilityOptions;

/// Attributes whose mutation may reveal the watched parent.
const PARENT_ATTRIBUTES: [&str; 2] = ["class", "style"];

/// Subscription slot the preview callback can reach to stop its own observer.
type SharedSlot<S> = Rc<RefCell<Option<S>>>;

/// Live subscriptions for one attachment.
pub(crate) struct TriggerSet<S: Subscription> {
    self_click: Option<S>,
    visibility: Option<S>,
    preview: Option<SharedSlot<S>>,
    parent: Option<S>,
    clicks: Vec<S>,
}

impl<S: Subscription> Default for TriggerSet<S> {
    fn default() -> Self {
        TriggerSet {
            self_click: None,
            visibility: None,
            preview: None,
            parent: None,
            clicks: Vec::new(),
        }
    }
}

impl<S: Subscription> TriggerSet<S> {
    /// Arm every trigger the current configuration asks for.
    ///
    /// A trigger that cannot be armed is reported and left idle; the rest still arm.
    pub fn arm<H>(loader: &Loader<H>) -> Self
    where
        H: Host<Subscription = S>,
    {
        let (visible, lazy_preview, parent, click) = {
            let config = loader.config();
            (
                config.load_on_visible,
                config.lazy_preview && config.preview_image().is_some(),
                config.parent_selector().map(str::to_string),
                config.click_selector().map(str::to_string),
            )
        };

        let host: &H = loader.host();
        let mut set = TriggerSet::default();

        set.self_click = report(host, arm_self_click(loader));

        if visible {
            set.visibility = report(host, arm_visibility(loader));
        }
        if lazy_preview {
            set.preview = report(host, arm_preview(loader));
        }
        if let Some(selector) = parent {
            set.parent = report(host, arm_parent_open(loader, &selector));
        }
        if let Some(selector) = click {
            set.clicks = report(host, arm_external_clicks(loader, &selector))
                .unwrap_or_default();
        }

        tracing::debug!(armed = set.len(), "triggers armed");
        set
    }

    /// Number of held subscriptions.
    pub fn len(&self) -> usize {
        let preview = self
            .preview
            .as_ref()
            .map_or(0, |slot| usize::from(slot.borrow().is_some()));
        [&self.self_click, &self.visibility, &self.parent]
            .iter()
            .filter(|s| s.is_some())
            .count()
            + preview
            + self.clicks.len()
    }

    /// Cancel everything. Safe on a set that was never armed.
    pub fn release(&mut self) {
        // Taking the subscription out of the slot also breaks the slot <-> callback cycle.
        let preview = self.preview.take().and_then(|slot| slot.borrow_mut().take());
        let singles = [
            self.self_click.take(),
            self.visibility.take(),
            preview,
            self.parent.take(),
        ];
        for mut subscription in singles.into_iter().flatten() {
            subscription.cancel();
        }
        for mut subscription in self.clicks.drain(..) {
            subscription.cancel();
        }
    }
}

fn report<H: Host, T>(host: &H, result: Result<T, LazyEmbedError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = %err, "trigger inactive");
            host.warn(&err.to_string());
            None
        }
    }
}

fn arm_self_click<H: Host>(loader: &Loader<H>) -> Result<H::Subscription, LazyEmbedError> {
    let host = loader.host();
    let loader = loader.clone();
    host.listen_click(
        &host.root(),
        Box::new(move || {
            loader.load();
        }),
    )
}

fn arm_visibility<H: Host>(loader: &Loader<H>) -> Result<H::Subscription, LazyEmbedError> {
    let host = loader.host();
    let loader = loader.clone();
    host.observe_visibility(
        &host.root(),
        VisibilityOptions::VIDEO,
        Box::new(move |intersecting| {
            if intersecting && !loader.state().is_loaded() {
                loader.load();
            }
        }),
    )
}

/// The observer stops itself after the first reveal. The subscription stays in the
/// slot while its callback runs; it is dropped on release.
fn arm_preview<H: Host>(
    loader: &Loader<H>,
) -> Result<SharedSlot<H::Subscription>, LazyEmbedError> {
    let host = loader.host();
    let slot: SharedSlot<H::Subscription> = Rc::new(RefCell::new(None));
    let own = Rc::clone(&slot);
    let loader = loader.clone();
    let subscription = host.observe_visibility(
        &host.root(),
        VisibilityOptions::PREVIEW,
        Box::new(move |intersecting| {
            if !intersecting {
                return;
            }
            loader.reveal_preview();
            if let Some(subscription) = own.borrow_mut().as_mut() {
                subscription.cancel();
            }
        }),
    )?;
    *slot.borrow_mut() = Some(subscription);
    Ok(slot)
}

fn arm_parent_open<H: Host>(
    loader: &Loader<H>,
    selector: &str,
) -> Result<H::Subscription, LazyEmbedError> {
    let host = loader.host();
    let parent = host
        .query_selector(selector)
        .ok_or_else(|| LazyEmbedError::ParentNotFound {
            selector: selector.to_string(),
        })?;

    let watched = parent.clone();
    let loader = loader.clone();
    host.observe_attributes(
        &parent,
        &PARENT_ATTRIBUTES,
        Box::new(move |attribute| {
            let relevant = PARENT_ATTRIBUTES.iter().any(|name| *name == attribute);
            if !relevant || loader.state().is_loaded() {
                return;
            }
            if loader.host().is_rendered_visible(&watched) {
                loader.load();
            }
        }),
    )
}

fn arm_external_clicks<H: Host>(
    loader: &Loader<H>,
    selector: &str,
) -> Result<Vec<H::Subscription>, LazyEmbedError> {
    let host = loader.host();
    let targets = host.query_selector_all(selector);
    if targets.is_empty() {
        return Err(LazyEmbedError::NoClickTargets {
            selector: selector.to_string(),
        });
    }

    let mut subscriptions = Vec::with_capacity(targets.len());
    for target in &targets {
        let loader = loader.clone();
        let armed = host.listen_click(
            target,
            Box::new(move || {
                loader.load();
            }),
        );
        match armed {
            Ok(subscription) => subscriptions.push(subscription),
            Err(err) => {
                // Keep what was registered so far releasable.
                for mut subscription in subscriptions {
                    subscription.cancel();
                }
                return Err(err);
            }
        }
    }
    Ok(subscriptions)
}
