//! Event registration and dispatch.
//!
//! Dispatch follows the DOM model closely enough for the bridge: capture
//! listeners run from the window down to the target's parent, listeners
//! on the target run in registration order, then bubbling listeners run
//! back up. `stopPropagation` finishes the current node and stops;
//! `stopImmediatePropagation` stops at once.

use std::cell::Cell;

use turbo_bridge::host::{
    DomEvent, EventCallback, EventHost, ListenerId, ListenerOptions, ListenerTarget,
};
use turbo_bridge::{BridgeError, BridgeResult};

use crate::document::{MockDocument, NodeId};

/// Anything that can receive events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Window,
    Document,
    Element(NodeId),
}

impl From<ListenerTarget> for EventTarget {
    fn from(target: ListenerTarget) -> Self {
        match target {
            ListenerTarget::Window => EventTarget::Window,
            ListenerTarget::Document => EventTarget::Document,
        }
    }
}

pub(crate) struct Registration {
    id: ListenerId,
    target: EventTarget,
    event_type: String,
    capture: bool,
    callback: EventCallback,
}

/// A dispatched event.
#[derive(Debug)]
pub struct MockEvent {
    event_type: String,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    immediate_stopped: Cell<bool>,
}

impl MockEvent {
    pub fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
            immediate_stopped: Cell::new(false),
        }
    }
}

impl DomEvent for MockEvent {
    fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_stopped.set(true);
    }
}

/// What happened during one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub listeners_invoked: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Capture,
    AtTarget,
    Bubble,
}

impl MockDocument {
    /// Register a page listener on an element.
    pub fn add_element_listener(
        &self,
        element: NodeId,
        event_type: &str,
        options: ListenerOptions,
        callback: EventCallback,
    ) -> ListenerId {
        self.register(EventTarget::Element(element), event_type, options, callback)
    }

    /// Number of live listeners for a target and event type.
    pub fn listener_count(&self, target: EventTarget, event_type: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|r| r.target == target && r.event_type == event_type)
            .count()
    }

    /// Dispatch a bubbling event at an element, as a user click would.
    pub fn click(&self, element: NodeId) -> DispatchReport {
        self.dispatch_event(EventTarget::Element(element), "click", true)
    }

    /// Dispatch an event through the capture, target and bubble phases.
    pub fn dispatch_event(
        &self,
        target: EventTarget,
        event_type: &str,
        bubbles: bool,
    ) -> DispatchReport {
        let path = self.propagation_path(target);
        let event = MockEvent::new(event_type);
        let mut invoked = 0;

        let (ancestors, _) = path.split_at(path.len() - 1);

        'dispatch: {
            for &node in ancestors {
                invoked += self.invoke(node, Phase::Capture, &event);
                if event.propagation_stopped.get() {
                    break 'dispatch;
                }
            }

            invoked += self.invoke(target, Phase::AtTarget, &event);
            if event.propagation_stopped.get() || !bubbles {
                break 'dispatch;
            }

            for &node in ancestors.iter().rev() {
                invoked += self.invoke(node, Phase::Bubble, &event);
                if event.propagation_stopped.get() {
                    break 'dispatch;
                }
            }
        }

        DispatchReport {
            default_prevented: event.default_prevented.get(),
            propagation_stopped: event.propagation_stopped.get(),
            listeners_invoked: invoked,
        }
    }

    /// Scroll the window, shifting every element below `<body>`, and fire
    /// `scroll` at the window.
    pub fn scroll_by(&self, dx: f64, dy: f64) -> DispatchReport {
        self.shift_subtree(self.body_id(), dx, dy, false);
        self.dispatch_event(EventTarget::Window, "scroll", false)
    }

    /// Scroll a nested container, shifting its contents, and fire a
    /// non-bubbling `scroll` at it.
    pub fn scroll_element(&self, container: NodeId, dx: f64, dy: f64) -> DispatchReport {
        self.shift_subtree(container, dx, dy, false);
        self.dispatch_event(EventTarget::Element(container), "scroll", false)
    }

    fn register(
        &self,
        target: EventTarget,
        event_type: &str,
        options: ListenerOptions,
        callback: EventCallback,
    ) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.borrow_mut().push(Registration {
            id,
            target,
            event_type: event_type.to_string(),
            capture: options.capture,
            callback,
        });
        id
    }

    fn propagation_path(&self, target: EventTarget) -> Vec<EventTarget> {
        let mut path = vec![EventTarget::Window];
        match target {
            EventTarget::Window => {}
            EventTarget::Document => path.push(EventTarget::Document),
            EventTarget::Element(node) => {
                path.push(EventTarget::Document);
                path.extend(self.ancestors(node).into_iter().map(EventTarget::Element));
                path.push(target);
            }
        }
        path
    }

    /// Run the matching listeners on one node. Returns how many ran.
    fn invoke(&self, node: EventTarget, phase: Phase, event: &MockEvent) -> usize {
        let snapshot: Vec<(ListenerId, EventCallback)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|r| r.target == node && r.event_type == event.event_type)
            .filter(|r| match phase {
                Phase::Capture => r.capture,
                Phase::AtTarget => true,
                Phase::Bubble => !r.capture,
            })
            .map(|r| (r.id, r.callback.clone()))
            .collect();

        let mut ran = 0;
        for (id, callback) in snapshot {
            // Listeners removed earlier in this dispatch do not run.
            if !self.listeners.borrow().iter().any(|r| r.id == id) {
                continue;
            }
            callback(event);
            ran += 1;
            if event.immediate_stopped.get() {
                break;
            }
        }
        ran
    }
}

impl EventHost for MockDocument {
    fn add_listener(
        &self,
        target: ListenerTarget,
        event_type: &str,
        options: ListenerOptions,
        callback: EventCallback,
    ) -> BridgeResult<ListenerId> {
        if self.faults.borrow().listener_event.as_deref() == Some(event_type) {
            return Err(BridgeError::Dom(format!(
                "addEventListener({}) failed",
                event_type
            )));
        }
        Ok(self.register(target.into(), event_type, options, callback))
    }

    fn remove_listener(&self, id: ListenerId) -> BridgeResult<()> {
        if self.faults.borrow().remove_listener {
            return Err(BridgeError::Dom("removeEventListener failed".to_string()));
        }
        self.listeners.borrow_mut().retain(|r| r.id != id);
        self.message_handlers
            .borrow_mut()
            .retain(|(handler_id, _)| *handler_id != id);
        Ok(())
    }
}
