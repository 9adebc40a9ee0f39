//! Interaction lock.
//!
//! While active, user interaction events are swallowed in the document's
//! capture phase before any page handler sees them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::BridgeConfig;
use crate::error::BridgeResult;
use crate::host::{DomEvent, EventCallback, Host, ListenerId, ListenerOptions, ListenerTarget};
use crate::logging::StructuredLogger;

/// Event types suppressed while the lock is active.
pub const MONITORED_EVENTS: [&str; 5] = ["click", "mousedown", "mouseup", "submit", "dragstart"];

/// Lock state. `Active` owns the listener registrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    Inactive,
    Active { listeners: Vec<ListenerId> },
}

/// Suppresses page interaction while the editor is in control.
pub struct InteractionLock<H: Host> {
    host: Rc<H>,
    cursor: String,
    logger: StructuredLogger,
    state: RefCell<LockState>,
    /// Read by the suppressor at dispatch time.
    active: Rc<Cell<bool>>,
    suppressor: EventCallback,
}

impl<H: Host> InteractionLock<H> {
    pub fn new(host: Rc<H>, config: &BridgeConfig, logger: StructuredLogger) -> Self {
        let active = Rc::new(Cell::new(false));
        let flag = active.clone();
        let suppressor: EventCallback = Rc::new(move |event: &dyn DomEvent| {
            if flag.get() {
                event.prevent_default();
                event.stop_propagation();
                event.stop_immediate_propagation();
            }
        });

        Self {
            host,
            cursor: config.edit_cursor.clone(),
            logger,
            state: RefCell::new(LockState::Inactive),
            active,
            suppressor,
        }
    }

    /// Engage the lock. No-op when already active.
    pub fn activate(&self) {
        if self.is_active() {
            return;
        }

        let listeners = match self.register_all() {
            Ok(listeners) => listeners,
            Err(e) => {
                self.logger
                    .error_builder("Failed to activate edit mode")
                    .field("error", e.to_string())
                    .emit();
                return;
            }
        };

        self.active.set(true);
        *self.state.borrow_mut() = LockState::Active { listeners };
        self.set_body_style(&self.cursor, "none");
        self.logger
            .info("Visual Edit Mode ACTIVATED - All interactions blocked");
    }

    /// Release the lock. No-op when inactive.
    pub fn deactivate(&self) {
        let listeners = match &*self.state.borrow() {
            LockState::Inactive => return,
            LockState::Active { listeners } => listeners.clone(),
        };

        self.active.set(false);
        for id in listeners {
            self.release(id);
        }
        *self.state.borrow_mut() = LockState::Inactive;
        self.set_body_style("", "");
        self.logger
            .info("Visual Edit Mode DEACTIVATED - Interactions restored");
    }

    pub fn is_active(&self) -> bool {
        matches!(*self.state.borrow(), LockState::Active { .. })
    }

    pub fn state(&self) -> LockState {
        self.state.borrow().clone()
    }

    /// Register the suppressor for every monitored event, rolling back on failure.
    fn register_all(&self) -> BridgeResult<Vec<ListenerId>> {
        let mut listeners = Vec::with_capacity(MONITORED_EVENTS.len());
        for event_type in MONITORED_EVENTS {
            match self.host.add_listener(
                ListenerTarget::Document,
                event_type,
                ListenerOptions::capture(),
                self.suppressor.clone(),
            ) {
                Ok(id) => listeners.push(id),
                Err(e) => {
                    for id in listeners {
                        self.release(id);
                    }
                    return Err(e);
                }
            }
        }
        Ok(listeners)
    }

    /// Remove one suppressor. A listener left behind is inert once `active` is false.
    fn release(&self, id: ListenerId) {
        if let Err(e) = self.host.remove_listener(id) {
            self.logger
                .error_builder("Error removing interaction listener")
                .field("error", e.to_string())
                .emit();
        }
    }

    fn set_body_style(&self, cursor: &str, user_select: &str) {
        let Some(body) = self.host.body() else {
            self.logger.warn("Document has no body; cursor not changed");
            return;
        };

        let result = self
            .host
            .set_style(&body, "cursor", cursor)
            .and_then(|_| self.host.set_style(&body, "user-select", user_select));
        if let Err(e) = result {
            self.logger
                .error_builder("Error updating body style")
                .field("error", e.to_string())
                .emit();
        }
    }
}
