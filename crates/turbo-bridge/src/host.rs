//! Host abstraction.
//!
//! The bridge never touches the browser directly. Everything it needs from
//! the live page is expressed by the traits in this module, so the same
//! logic runs against `web-sys` in the preview frame and against an
//! in-memory document in tests.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BridgeResult;

/// A viewport-relative rectangle, as reported by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Whether the point lies inside the rectangle (right/bottom edges excluded).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.left + self.width && y >= self.top && y < self.top + self.height
    }
}

/// Identifier of a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Identifier of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Where a listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    Window,
    Document,
}

/// Listener registration options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Register for the capture phase.
    pub capture: bool,
}

impl ListenerOptions {
    pub fn capture() -> Self {
        Self { capture: true }
    }

    pub fn bubble() -> Self {
        Self { capture: false }
    }
}

/// The parts of a DOM event a listener can act on.
pub trait DomEvent {
    fn prevent_default(&self);
    fn stop_propagation(&self);
    fn stop_immediate_propagation(&self);
}

/// Callback invoked for each dispatched event.
pub type EventCallback = Rc<dyn Fn(&dyn DomEvent)>;

/// Callback invoked with the payload of each message from the parent frame.
pub type MessageHandler = Rc<dyn Fn(&serde_json::Value)>;

/// Read and write access to the document.
pub trait DomAccess {
    /// Handle to a DOM element.
    type Element: Clone + PartialEq + fmt::Debug;

    /// Handle that does not keep its element alive.
    type WeakElement: Clone + fmt::Debug;

    fn downgrade(&self, element: &Self::Element) -> Self::WeakElement;

    /// The element, unless the host has since collected it.
    fn upgrade(&self, weak: &Self::WeakElement) -> Option<Self::Element>;

    /// The document's root element (`<html>`).
    fn document_element(&self) -> Option<Self::Element>;

    /// The document body.
    fn body(&self) -> Option<Self::Element>;

    /// First element matching `selector`. Syntax errors are `Err`.
    fn query_selector(&self, selector: &str) -> BridgeResult<Option<Self::Element>>;

    /// Topmost element at the viewport point.
    fn element_from_point(&self, x: f64, y: f64) -> Option<Self::Element>;

    /// The `id` attribute, empty when absent.
    fn id(&self, element: &Self::Element) -> String;

    /// Tag name as the DOM reports it (uppercase for HTML elements).
    fn tag_name(&self, element: &Self::Element) -> String;

    /// `className` when it is a plain string; `None` otherwise (SVG).
    fn class_name(&self, element: &Self::Element) -> Option<String>;

    /// Raw `class` attribute.
    fn class_attribute(&self, element: &Self::Element) -> Option<String>;

    fn parent_element(&self, element: &Self::Element) -> Option<Self::Element>;

    /// Element children in document order.
    fn children(&self, element: &Self::Element) -> Vec<Self::Element>;

    fn text_content(&self, element: &Self::Element) -> Option<String>;

    fn bounding_rect(&self, element: &Self::Element) -> Rect;

    /// Resolved value of a CSS property (kebab-case name).
    fn computed_style(&self, element: &Self::Element, property: &str) -> String;

    /// Whether the element is still attached to the document.
    fn is_connected(&self, element: &Self::Element) -> bool;

    fn create_element(&self, tag: &str) -> BridgeResult<Self::Element>;

    fn append_to_body(&self, element: &Self::Element) -> BridgeResult<()>;

    /// Inline style property value (kebab-case name), empty when unset.
    fn style_property(&self, element: &Self::Element, property: &str) -> BridgeResult<String>;

    /// Set an inline style property (kebab-case name). An empty value resets it.
    fn set_style(&self, element: &Self::Element, property: &str, value: &str) -> BridgeResult<()>;
}

/// Event listener registration.
pub trait EventHost {
    fn add_listener(
        &self,
        target: ListenerTarget,
        event_type: &str,
        options: ListenerOptions,
        callback: EventCallback,
    ) -> BridgeResult<ListenerId>;

    /// Remove a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId) -> BridgeResult<()>;
}

/// One-shot timers.
pub trait TimerHost {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> BridgeResult<TimerId>;

    /// Cancel a timer. Fired or unknown ids are ignored.
    fn clear_timeout(&self, id: TimerId);
}

/// The message channel to the embedding editor frame.
pub trait ParentChannel {
    /// Post a message to the parent window with target origin `*`.
    fn post_to_parent(&self, message: &serde_json::Value) -> BridgeResult<()>;

    /// Receive messages from any origin.
    fn on_message(&self, handler: MessageHandler) -> BridgeResult<ListenerId>;
}

/// Everything the bridge needs from its environment.
pub trait Host: DomAccess + EventHost + TimerHost + ParentChannel + 'static {}

impl<T> Host for T where T: DomAccess + EventHost + TimerHost + ParentChannel + 'static {}
