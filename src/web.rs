// Browser host backed by web-sys, plus the wasm-bindgen surface the custom element calls into.
// JS registers the element and forwards connected/disconnected callbacks; everything else lives here.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, MutationObserver, MutationObserverInit,
    MutationRecord, ShadowRoot, ShadowRootInit, ShadowRootMode, Window,
};

use crate::classify::classify;
use crate::component::LazyEmbed;
use crate::error::LazyEmbedError;
use crate::host::{Host, Subscription};
use crate::logging;
use crate::render::Markup;
use crate::types::{EmbedConfig, VisibilityOptions};

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, JsValue)>;

/// Live browser registration. Holds the closure so it outlives the JS side's reference.
pub enum WebSubscription {
    Intersection {
        observer: IntersectionObserver,
        _callback: ObserverCallback,
    },
    Mutation {
        observer: MutationObserver,
        _callback: ObserverCallback,
    },
    Click {
        target: EventTarget,
        callback: Option<Closure<dyn FnMut(Event)>>,
    },
}

impl Subscription for WebSubscription {
    fn cancel(&mut self) {
        match self {
            WebSubscription::Intersection { observer, .. } => observer.disconnect(),
            WebSubscription::Mutation { observer, .. } => observer.disconnect(),
            WebSubscription::Click { target, callback } => {
                if let Some(callback) = callback.take() {
                    let removed = target.remove_event_listener_with_callback(
                        "click",
                        callback.as_ref().unchecked_ref(),
                    );
                    if let Err(e) = removed {
                        tracing::warn!(error = %js_message(&e), "click listener removal failed");
                    }
                }
            }
        }
    }
}

fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

/// DOM host: renders into an open shadow root of the host element.
pub struct WebHost {
    window: Window,
    document: Document,
    element: HtmlElement,
    shadow: ShadowRoot,
}

impl WebHost {
    pub fn new(element: HtmlElement) -> Result<WebHost, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object"))?;
        let shadow = match element.shadow_root() {
            Some(shadow) => shadow,
            None => element.attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open))?,
        };
        Ok(WebHost {
            window,
            document,
            element,
            shadow,
        })
    }

    fn build(&self, markup: &Markup) -> Result<Element, JsValue> {
        let el = self.document.create_element(markup.tag)?;
        for (name, value) in &markup.attributes {
            el.set_attribute(name, value)?;
        }
        if let Some(style) = markup.style_text() {
            el.set_attribute("style", &style)?;
        }
        for child in &markup.children {
            let node = self.build(child)?;
            el.append_child(&node)?;
        }
        Ok(el)
    }

    fn try_commit(&self, markup: &Markup) -> Result<(), JsValue> {
        let tree = self.build(markup)?;
        self.shadow.set_inner_html("");
        self.shadow.append_child(&tree)?;
        Ok(())
    }
}

impl Host for WebHost {
    type Node = Element;
    type Subscription = WebSubscription;

    fn root(&self) -> Element {
        self.element.clone().unchecked_into()
    }

    fn query_selector(&self, selector: &str) -> Option<Element> {
        // An invalid selector matches nothing.
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn observe_visibility(
        &self,
        target: &Element,
        options: VisibilityOptions,
        mut callback: Box<dyn FnMut(bool)>,
    ) -> Result<WebSubscription, LazyEmbedError> {
        let closure: ObserverCallback = Closure::wrap(Box::new(
            move |entries: js_sys::Array, _observer: JsValue| {
                let first = entries.get(0).dyn_into::<IntersectionObserverEntry>();
                if let Ok(entry) = first {
                    callback(entry.is_intersecting());
                }
            },
        ) as Box<dyn FnMut(js_sys::Array, JsValue)>);

        let init = IntersectionObserverInit::new();
        init.set_root_margin(&options.root_margin());
        init.set_threshold(&JsValue::from_f64(options.threshold));

        let observer =
            IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init)
                .map_err(|e| LazyEmbedError::host("visibility", js_message(&e)))?;
        observer.observe(target);

        Ok(WebSubscription::Intersection {
            observer,
            _callback: closure,
        })
    }

    fn observe_attributes(
        &self,
        target: &Element,
        attributes: &[&'static str],
        mut callback: Box<dyn FnMut(&str)>,
    ) -> Result<WebSubscription, LazyEmbedError> {
        let closure: ObserverCallback = Closure::wrap(Box::new(
            move |records: js_sys::Array, _observer: JsValue| {
                for record in records.iter() {
                    let Ok(record) = record.dyn_into::<MutationRecord>() else {
                        continue;
                    };
                    if record.type_() != "attributes" {
                        continue;
                    }
                    if let Some(name) = record.attribute_name() {
                        callback(&name);
                    }
                }
            },
        ) as Box<dyn FnMut(js_sys::Array, JsValue)>);

        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())
            .map_err(|e| LazyEmbedError::host("parent-open", js_message(&e)))?;

        let filter: js_sys::Array = attributes.iter().map(|a| JsValue::from_str(a)).collect();
        let init = MutationObserverInit::new();
        init.set_attributes(true);
        js_sys::Reflect::set(&init, &JsValue::from_str("attributeFilter"), &filter)
            .map_err(|e| LazyEmbedError::host("parent-open", js_message(&e)))?;
        observer
            .observe_with_options(target, &init)
            .map_err(|e| LazyEmbedError::host("parent-open", js_message(&e)))?;

        Ok(WebSubscription::Mutation {
            observer,
            _callback: closure,
        })
    }

    fn listen_click(
        &self,
        target: &Element,
        mut callback: Box<dyn FnMut()>,
    ) -> Result<WebSubscription, LazyEmbedError> {
        let closure = Closure::wrap(Box::new(move |_event: Event| {
            callback();
        }) as Box<dyn FnMut(Event)>);

        let target: EventTarget = target.clone().unchecked_into();
        target
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
            .map_err(|e| LazyEmbedError::host("click", js_message(&e)))?;

        Ok(WebSubscription::Click {
            target,
            callback: Some(closure),
        })
    }

    fn is_rendered_visible(&self, target: &Element) -> bool {
        let Ok(Some(style)) = self.window.get_computed_style(target) else {
            return false;
        };
        let display = style.get_property_value("display").unwrap_or_default();
        let visibility = style.get_property_value("visibility").unwrap_or_default();
        display != "none" && visibility != "hidden"
    }

    fn commit(&self, markup: &Markup) {
        if let Err(e) = self.try_commit(markup) {
            let message = js_message(&e);
            tracing::error!(error = %message, "render failed");
            web_sys::console::error_1(&format!("lazy-embed render failed: {}", message).into());
        }
    }

    fn warn(&self, message: &str) {
        web_sys::console::warn_1(&message.into());
    }
}

/// Element instance exposed to JavaScript.
///
/// ```js
/// class LazyEmbedElement extends HTMLElement {
///   connectedCallback() {
///     this.inner = new wasm.LazyEmbedElement(this, JSON.stringify(config));
///     this.inner.connected();
///   }
///   disconnectedCallback() { this.inner.disconnected(); }
/// }
/// ```
#[wasm_bindgen]
pub struct LazyEmbedElement {
    inner: RefCell<LazyEmbed<WebHost>>,
    host: Rc<WebHost>,
    config: EmbedConfig,
}

#[wasm_bindgen]
impl LazyEmbedElement {
    #[wasm_bindgen(constructor)]
    pub fn new(element: HtmlElement, config_json: &str) -> Result<LazyEmbedElement, JsValue> {
        let config = EmbedConfig::from_json(config_json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let host = Rc::new(WebHost::new(element)?);

        Ok(LazyEmbedElement {
            inner: RefCell::new(LazyEmbed::new(Rc::clone(&host))),
            host,
            config,
        })
    }

    /// `connectedCallback`: classify, arm triggers, and render.
    pub fn connected(&self) {
        let markup = self.inner.borrow_mut().attach(self.config.clone());
        self.host.commit(&markup);
    }

    /// `disconnectedCallback`: release every observer and listener.
    pub fn disconnected(&self) {
        self.inner.borrow_mut().detach();
    }

    /// Load the video now. Resolves once the embed is in place.
    #[wasm_bindgen(js_name = loadVideo)]
    pub fn load_video(&self) -> js_sys::Promise {
        self.inner.borrow().load_video();
        wasm_bindgen_futures::future_to_promise(async { Ok(JsValue::UNDEFINED) })
    }

    #[wasm_bindgen(getter)]
    pub fn loaded(&self) -> bool {
        self.inner.borrow().is_loaded()
    }

    #[wasm_bindgen(getter, js_name = embedUrl)]
    pub fn embed_url(&self) -> String {
        self.inner.borrow().video_info().embed_url.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn provider(&self) -> String {
        self.inner.borrow().video_info().provider.as_str().to_string()
    }

    /// Current render as an HTML string.
    #[wasm_bindgen(js_name = toHtml)]
    pub fn to_html(&self) -> String {
        self.inner.borrow().render().to_string()
    }
}

/// Classify a URL without creating an element. Returns `{ type, id, embedUrl }` as JSON.
#[wasm_bindgen(js_name = classifyUrl)]
pub fn classify_url(src: &str) -> Result<String, JsValue> {
    serde_json::to_string(&classify(src))
        .map_err(|e| JsValue::from_str(&LazyEmbedError::from(e).to_string()))
}

/// Route tracing events to the browser console at `level` (`error` .. `trace`).
///
/// Returns `false` when a subscriber was already installed.
#[wasm_bindgen(js_name = enableLogging)]
pub fn enable_logging(level: &str) -> Result<bool, JsValue> {
    let level = logging::parse_level(level).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(logging::install(level))
}
