// Capability interface to the host environment (browser DOM or a test double).
// The core never touches the platform directly; every observer and listener goes through here.

use crate::error::LazyEmbedError;
use crate::render::Markup;
use crate::types::VisibilityOptions;

/// Cancellable observer or listener registration.
pub trait Subscription {
    /// Stop delivering callbacks. Calling it again is a no-op.
    fn cancel(&mut self);
}

/// Platform services the element consumes.
///
/// All callbacks run on the host's single event loop; they may call back into the
/// host (for instance to commit a new render) but are never invoked re-entrantly.
pub trait Host: 'static {
    type Node: Clone + 'static;
    type Subscription: Subscription;

    /// The element this instance renders into.
    fn root(&self) -> Self::Node;

    fn query_selector(&self, selector: &str) -> Option<Self::Node>;

    fn query_selector_all(&self, selector: &str) -> Vec<Self::Node>;

    /// Watch `target` against the viewport. The callback receives `isIntersecting`
    /// of the first entry in each batch.
    fn observe_visibility(
        &self,
        target: &Self::Node,
        options: VisibilityOptions,
        callback: Box<dyn FnMut(bool)>,
    ) -> Result<Self::Subscription, LazyEmbedError>;

    /// Watch attribute mutations of `target`, limited to `attributes`.
    /// The callback receives the changed attribute name.
    fn observe_attributes(
        &self,
        target: &Self::Node,
        attributes: &[&'static str],
        callback: Box<dyn FnMut(&str)>,
    ) -> Result<Self::Subscription, LazyEmbedError>;

    fn listen_click(
        &self,
        target: &Self::Node,
        callback: Box<dyn FnMut()>,
    ) -> Result<Self::Subscription, LazyEmbedError>;

    /// Computed `display != none` and `visibility != hidden`.
    fn is_rendered_visible(&self, target: &Self::Node) -> bool;

    /// Replace the rendered output with `markup`.
    fn commit(&self, markup: &Markup);

    /// Non-fatal warning channel (the browser console on the web).
    fn warn(&self, message: &str);
}

/// Recording host used by the unit tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;

    pub type NodeId = u32;

    pub const ROOT: NodeId = 0;

    enum Callback {
        Visibility(VisibilityOptions, Box<dyn FnMut(bool)>),
        Attributes(Vec<&'static str>, Box<dyn FnMut(&str)>),
        Click(Box<dyn FnMut()>),
    }

    struct Registration {
        id: u64,
        target: NodeId,
        // Taken out while the callback runs.
        callback: Option<Callback>,
    }

    #[derive(Default)]
    struct Registry {
        next_id: u64,
        active: Vec<Registration>,
    }

    pub struct FakeSubscription {
        id: u64,
        registry: Rc<RefCell<Registry>>,
    }

    impl Subscription for FakeSubscription {
        fn cancel(&mut self) {
            self.registry
                .borrow_mut()
                .active
                .retain(|r| r.id != self.id);
        }
    }

    /// In-memory DOM stand-in: selectors map to node ids, visibility is a flag per node.
    #[derive(Default)]
    pub struct FakeHost {
        registry: Rc<RefCell<Registry>>,
        selectors: RefCell<HashMap<String, Vec<NodeId>>>,
        hidden: RefCell<Vec<NodeId>>,
        pub commits: RefCell<Vec<Markup>>,
        pub warnings: RefCell<Vec<String>>,
        pub fail_visibility: Cell<bool>,
    }

    impl FakeHost {
        pub fn new() -> Rc<Self> {
            Rc::new(FakeHost::default())
        }

        pub fn add_nodes(&self, selector: &str, nodes: &[NodeId]) {
            self.selectors
                .borrow_mut()
                .entry(selector.to_string())
                .or_default()
                .extend_from_slice(nodes);
        }

        pub fn set_visible(&self, node: NodeId, visible: bool) {
            let mut hidden = self.hidden.borrow_mut();
            hidden.retain(|n| *n != node);
            if !visible {
                hidden.push(node);
            }
        }

        /// Number of live observers and listeners.
        pub fn active_count(&self) -> usize {
            self.registry.borrow().active.len()
        }

        pub fn click_listener_count(&self, node: NodeId) -> usize {
            self.registry
                .borrow()
                .active
                .iter()
                .filter(|r| r.target == node && matches!(r.callback, Some(Callback::Click(_))))
                .count()
        }

        pub fn visibility_margins(&self) -> Vec<u32> {
            self.registry
                .borrow()
                .active
                .iter()
                .filter_map(|r| match &r.callback {
                    Some(Callback::Visibility(options, _)) => Some(options.root_margin_px),
                    _ => None,
                })
                .collect()
        }

        pub fn click(&self, node: NodeId) {
            self.dispatch(node, |callback| {
                if let Callback::Click(f) = callback {
                    f();
                }
            });
        }

        /// Deliver an intersection batch to every observer of `node`.
        pub fn intersect(&self, node: NodeId, intersecting: bool) {
            self.dispatch(node, |callback| {
                if let Callback::Visibility(_, f) = callback {
                    f(intersecting);
                }
            });
        }

        pub fn mutate(&self, node: NodeId, attribute: &str) {
            self.dispatch(node, |callback| {
                if let Callback::Attributes(filter, f) = callback {
                    if filter.iter().any(|name| *name == attribute) {
                        f(attribute);
                    }
                }
            });
        }

        fn dispatch(&self, node: NodeId, mut run: impl FnMut(&mut Callback)) {
            let ids: Vec<u64> = self
                .registry
                .borrow()
                .active
                .iter()
                .filter(|r| r.target == node)
                .map(|r| r.id)
                .collect();

            for id in ids {
                let taken = self
                    .registry
                    .borrow_mut()
                    .active
                    .iter_mut()
                    .find(|r| r.id == id)
                    .and_then(|r| r.callback.take());
                let Some(mut callback) = taken else {
                    continue;
                };
                run(&mut callback);
                if let Some(r) = self
                    .registry
                    .borrow_mut()
                    .active
                    .iter_mut()
                    .find(|r| r.id == id)
                {
                    r.callback = Some(callback);
                }
            }
        }

        fn register(&self, target: NodeId, callback: Callback) -> FakeSubscription {
            let mut registry = self.registry.borrow_mut();
            registry.next_id += 1;
            let id = registry.next_id;
            registry.active.push(Registration {
                id,
                target,
                callback: Some(callback),
            });
            FakeSubscription {
                id,
                registry: Rc::clone(&self.registry),
            }
        }
    }

    impl Host for FakeHost {
        type Node = NodeId;
        type Subscription = FakeSubscription;

        fn root(&self) -> NodeId {
            ROOT
        }

        fn query_selector(&self, selector: &str) -> Option<NodeId> {
            self.query_selector_all(selector).into_iter().next()
        }

        fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
            self.selectors
                .borrow()
                .get(selector)
                .cloned()
                .unwrap_or_default()
        }

        fn observe_visibility(
            &self,
            target: &NodeId,
            options: VisibilityOptions,
            callback: Box<dyn FnMut(bool)>,
        ) -> Result<FakeSubscription, LazyEmbedError> {
            if self.fail_visibility.get() {
                return Err(LazyEmbedError::host("visibility", "IntersectionObserver unavailable"));
            }
            Ok(self.register(*target, Callback::Visibility(options, callback)))
        }

        fn observe_attributes(
            &self,
            target: &NodeId,
            attributes: &[&'static str],
            callback: Box<dyn FnMut(&str)>,
        ) -> Result<FakeSubscription, LazyEmbedError> {
            Ok(self.register(*target, Callback::Attributes(attributes.to_vec(), callback)))
        }

        fn listen_click(
            &self,
            target: &NodeId,
            callback: Box<dyn FnMut()>,
        ) -> Result<FakeSubscription, LazyEmbedError> {
            Ok(self.register(*target, Callback::Click(callback)))
        }

        fn is_rendered_visible(&self, target: &NodeId) -> bool {
            !self.hidden.borrow().contains(target)
        }

        fn commit(&self, markup: &Markup) {
            self.commits.borrow_mut().push(markup.clone());
        }

        fn warn(&self, message: &str) {
            self.warnings.borrow_mut().push(message.to_string());
        }
    }
}
