//! `web-sys` implementation of the host traits.
//!
//! Listener closures live in a registration table keyed by
//! [`ListenerId`] and are dropped when the listener is removed. Timers
//! share one dispatch closure; `setTimeout` passes the timer id back as
//! its argument, so cancelled timers leave nothing behind on the JS side.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use js_sys::{Reflect, JSON};
use turbo_bridge::host::{
    DomAccess, DomEvent, EventCallback, EventHost, ListenerId, ListenerOptions, ListenerTarget,
    MessageHandler, ParentChannel, Rect, TimerHost, TimerId,
};
use turbo_bridge::{BridgeError, BridgeResult};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    AddEventListenerOptions, CssStyleDeclaration, Document, Element, Event, EventTarget,
    HtmlElement, MessageEvent, Window,
};

/// Render a thrown JS value for an error message.
fn describe(context: &str, error: JsValue) -> String {
    let detail = Reflect::get(&error, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{:?}", error));
    format!("{}: {}", context, detail)
}

#[wasm_bindgen]
extern "C" {
    /// A JS `WeakRef` to an element.
    #[wasm_bindgen(js_name = WeakRef)]
    #[derive(Debug, Clone)]
    pub type WeakElement;

    #[wasm_bindgen(constructor, js_class = "WeakRef")]
    fn new(target: &Element) -> WeakElement;

    /// The element, or `undefined` once collected.
    #[wasm_bindgen(method, js_class = "WeakRef", js_name = deref)]
    fn target(this: &WeakElement) -> JsValue;
}

struct WebEvent(Event);

impl DomEvent for WebEvent {
    fn prevent_default(&self) {
        self.0.prevent_default();
    }

    fn stop_propagation(&self) {
        self.0.stop_propagation();
    }

    fn stop_immediate_propagation(&self) {
        self.0.stop_immediate_propagation();
    }
}

struct Registration {
    target: EventTarget,
    event_type: String,
    capture: bool,
    closure: Closure<dyn FnMut(Event)>,
}

type TimerTable = HashMap<TimerId, (i32, Box<dyn FnOnce()>)>;

/// The live browser frame.
pub struct WebHost {
    window: Window,
    document: Document,
    listeners: RefCell<HashMap<ListenerId, Registration>>,
    timers: Rc<RefCell<TimerTable>>,
    timer_dispatch: Closure<dyn FnMut(JsValue)>,
    next_id: Cell<u64>,
}

impl WebHost {
    pub fn new() -> BridgeResult<Self> {
        let window =
            web_sys::window().ok_or_else(|| BridgeError::Dom("no global window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| BridgeError::Dom("window has no document".to_string()))?;

        let timers: Rc<RefCell<TimerTable>> = Rc::new(RefCell::new(HashMap::new()));
        let table = Rc::downgrade(&timers);
        let timer_dispatch = Closure::<dyn FnMut(JsValue)>::new(move |id: JsValue| {
            let Some(table) = table.upgrade() else { return };
            let Some(raw) = id.as_f64() else { return };
            let entry = table.borrow_mut().remove(&TimerId(raw as u64));
            if let Some((_, callback)) = entry {
                callback();
            }
        });

        Ok(Self {
            window,
            document,
            listeners: RefCell::new(HashMap::new()),
            timers,
            timer_dispatch,
            next_id: Cell::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn event_target(&self, target: ListenerTarget) -> EventTarget {
        match target {
            ListenerTarget::Window => self.window.clone().into(),
            ListenerTarget::Document => self.document.clone().into(),
        }
    }

    fn listen(
        &self,
        target: EventTarget,
        event_type: &str,
        capture: bool,
        handler: impl FnMut(Event) + 'static,
    ) -> BridgeResult<ListenerId> {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        let options = AddEventListenerOptions::new();
        options.set_capture(capture);

        target
            .add_event_listener_with_callback_and_add_event_listener_options(
                event_type,
                closure.as_ref().unchecked_ref(),
                &options,
            )
            .map_err(|e| BridgeError::Dom(describe("addEventListener", e)))?;

        let id = ListenerId(self.next_id());
        self.listeners.borrow_mut().insert(
            id,
            Registration {
                target,
                event_type: event_type.to_string(),
                capture,
                closure,
            },
        );
        Ok(id)
    }
}

impl DomAccess for WebHost {
    type Element = Element;
    type WeakElement = WeakElement;

    fn downgrade(&self, element: &Element) -> WeakElement {
        WeakElement::new(element)
    }

    fn upgrade(&self, weak: &WeakElement) -> Option<Element> {
        weak.target().dyn_into::<Element>().ok()
    }

    fn document_element(&self) -> Option<Element> {
        self.document.document_element()
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn query_selector(&self, selector: &str) -> BridgeResult<Option<Element>> {
        self.document
            .query_selector(selector)
            .map_err(|e| BridgeError::InvalidSelector(describe(selector, e)))
    }

    fn element_from_point(&self, x: f64, y: f64) -> Option<Element> {
        self.document.element_from_point(x as f32, y as f32)
    }

    fn id(&self, element: &Element) -> String {
        element.id()
    }

    fn tag_name(&self, element: &Element) -> String {
        element.tag_name()
    }

    fn class_name(&self, element: &Element) -> Option<String> {
        // SVG elements expose an SVGAnimatedString here.
        Reflect::get(element, &JsValue::from_str("className"))
            .ok()
            .and_then(|value| value.as_string())
    }

    fn class_attribute(&self, element: &Element) -> Option<String> {
        element.get_attribute("class")
    }

    fn parent_element(&self, element: &Element) -> Option<Element> {
        element.parent_element()
    }

    fn children(&self, element: &Element) -> Vec<Element> {
        let children = element.children();
        (0..children.length())
            .filter_map(|index| children.item(index))
            .collect()
    }

    fn text_content(&self, element: &Element) -> Option<String> {
        element.text_content()
    }

    fn bounding_rect(&self, element: &Element) -> Rect {
        let rect = element.get_bounding_client_rect();
        Rect::new(rect.top(), rect.left(), rect.width(), rect.height())
    }

    fn computed_style(&self, element: &Element, property: &str) -> String {
        self.window
            .get_computed_style(element)
            .ok()
            .flatten()
            .and_then(|style| style.get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn is_connected(&self, element: &Element) -> bool {
        element.is_connected()
    }

    fn create_element(&self, tag: &str) -> BridgeResult<Element> {
        self.document
            .create_element(tag)
            .map_err(|e| BridgeError::Dom(describe("createElement", e)))
    }

    fn append_to_body(&self, element: &Element) -> BridgeResult<()> {
        let body = self
            .document
            .body()
            .ok_or_else(|| BridgeError::Dom("document has no body".to_string()))?;
        body.append_child(element)
            .map(|_| ())
            .map_err(|e| BridgeError::Dom(describe("appendChild", e)))
    }

    fn style_property(&self, element: &Element, property: &str) -> BridgeResult<String> {
        inline_style(element)?
            .get_property_value(property)
            .map_err(|e| BridgeError::Dom(describe(property, e)))
    }

    fn set_style(&self, element: &Element, property: &str, value: &str) -> BridgeResult<()> {
        let style = inline_style(element)?;
        let result = if value.is_empty() {
            style.remove_property(property).map(|_| ())
        } else {
            style.set_property(property, value)
        };
        result.map_err(|e| BridgeError::Dom(describe(property, e)))
    }
}

impl EventHost for WebHost {
    fn add_listener(
        &self,
        target: ListenerTarget,
        event_type: &str,
        options: ListenerOptions,
        callback: EventCallback,
    ) -> BridgeResult<ListenerId> {
        self.listen(
            self.event_target(target),
            event_type,
            options.capture,
            move |event: Event| callback(&WebEvent(event)),
        )
    }

    fn remove_listener(&self, id: ListenerId) -> BridgeResult<()> {
        let registration = self.listeners.borrow_mut().remove(&id);
        let Some(registration) = registration else {
            return Ok(());
        };
        registration
            .target
            .remove_event_listener_with_callback_and_bool(
                &registration.event_type,
                registration.closure.as_ref().unchecked_ref(),
                registration.capture,
            )
            .map_err(|e| BridgeError::Dom(describe("removeEventListener", e)))
    }
}

impl TimerHost for WebHost {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> BridgeResult<TimerId> {
        let id = TimerId(self.next_id());
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let handle = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_1(
                self.timer_dispatch.as_ref().unchecked_ref(),
                millis,
                &JsValue::from_f64(id.0 as f64),
            )
            .map_err(|e| BridgeError::Timer(describe("setTimeout", e)))?;
        self.timers.borrow_mut().insert(id, (handle, callback));
        Ok(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        let entry = self.timers.borrow_mut().remove(&id);
        if let Some((handle, _)) = entry {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

impl ParentChannel for WebHost {
    fn post_to_parent(&self, message: &serde_json::Value) -> BridgeResult<()> {
        let parent = self
            .window
            .parent()
            .map_err(|e| BridgeError::Channel(describe("window.parent", e)))?
            .ok_or_else(|| BridgeError::Channel("frame has no parent window".to_string()))?;
        let text = serde_json::to_string(message)?;
        let value = JSON::parse(&text).map_err(|e| BridgeError::Channel(describe("JSON.parse", e)))?;
        parent
            .post_message(&value, "*")
            .map_err(|e| BridgeError::Channel(describe("postMessage", e)))
    }

    fn on_message(&self, handler: MessageHandler) -> BridgeResult<ListenerId> {
        self.listen(
            self.window.clone().into(),
            "message",
            false,
            move |event: Event| {
                let Some(event) = event.dyn_ref::<MessageEvent>() else { return };
                if let Some(data) = decode_message(&event.data()) {
                    handler(&data);
                }
            },
        )
    }
}

fn inline_style(element: &Element) -> BridgeResult<CssStyleDeclaration> {
    element
        .dyn_ref::<HtmlElement>()
        .map(HtmlElement::style)
        .ok_or_else(|| BridgeError::Dom(format!("<{}> has no inline style", element.tag_name())))
}

/// Copy message data into a JSON value. Data JSON cannot represent is dropped.
fn decode_message(data: &JsValue) -> Option<serde_json::Value> {
    let text = JSON::stringify(data).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}
