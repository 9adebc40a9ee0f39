//! Message router.
//!
//! The single entry point for editor commands. Every handler catches and
//! logs its own failures so one bad command never disables the bridge.

use std::rc::Rc;

use crate::config::BridgeConfig;
use crate::error::BridgeResult;
use crate::highlight::{HighlightOverlay, HighlightPhase};
use crate::host::{Host, ListenerId};
use crate::inspect::element_info;
use crate::lock::{InteractionLock, LockState};
use crate::logging::StructuredLogger;
use crate::protocol::{is_known_tag, DetectAction, InboundMessage, OutboundMessage};
use crate::selector::SelectorGenerator;

/// One bridge per frame. Owns all edit-mode and highlight state.
pub struct Bridge<H: Host> {
    host: Rc<H>,
    text_preview_chars: usize,
    selectors: SelectorGenerator,
    highlight: HighlightOverlay<H>,
    lock: InteractionLock<H>,
    logger: StructuredLogger,
}

impl<H: Host> Bridge<H> {
    pub fn new(host: Rc<H>, config: &BridgeConfig, logger: StructuredLogger) -> Self {
        Self {
            selectors: SelectorGenerator::new(config, logger.child("selector")),
            highlight: HighlightOverlay::new(host.clone(), config, logger.child("highlight")),
            lock: InteractionLock::new(host.clone(), config, logger.child("lock")),
            text_preview_chars: config.text_preview_chars,
            host,
            logger,
        }
    }

    /// Start receiving messages from the parent frame.
    pub fn attach(self: &Rc<Self>) -> BridgeResult<ListenerId> {
        let bridge = Rc::downgrade(self);
        let id = self.host.on_message(Rc::new(move |data: &serde_json::Value| {
            if let Some(bridge) = bridge.upgrade() {
                bridge.handle_message(data);
            }
        }))?;
        self.logger.info("Visual Edit Bridge initialized");
        Ok(id)
    }

    /// Snapshot of the edit-mode state.
    pub fn lock_state(&self) -> LockState {
        self.lock.state()
    }

    pub fn is_edit_mode_active(&self) -> bool {
        self.lock.is_active()
    }

    /// Snapshot of the highlight state.
    pub fn highlight_phase(&self) -> HighlightPhase<H::Element> {
        self.highlight.phase()
    }

    /// Decode and dispatch one raw message. Never fails.
    pub fn handle_message(&self, data: &serde_json::Value) {
        match InboundMessage::from_wire(data) {
            Ok(message) => self.dispatch(message),
            Err(e) => {
                // Only known tags with bad payloads are worth reporting.
                if is_known_tag(data) {
                    self.logger
                        .warn_builder("Malformed message dropped")
                        .field("error", e.to_string())
                        .emit();
                }
            }
        }
    }

    /// Run one decoded command.
    pub fn dispatch(&self, message: InboundMessage) {
        match message {
            InboundMessage::Activate => self.lock.activate(),
            InboundMessage::Deactivate => {
                self.lock.deactivate();
                self.highlight.clear();
            }
            InboundMessage::DetectElement { x, y, action } => self.detect_element(x, y, action),
            InboundMessage::Highlight { selector } => {
                if let Some(selector) = selector.filter(|s| !s.is_empty()) {
                    self.highlight.highlight(&selector);
                }
            }
            InboundMessage::ClearHighlight => self.highlight.clear(),
            InboundMessage::RequestInfo { selector } => self.request_info(&selector),
            InboundMessage::Unknown => {}
        }
    }

    fn detect_element(&self, x: f64, y: f64, action: DetectAction) {
        self.logger
            .debug_builder("Detecting element")
            .field_f64("x", x)
            .field_f64("y", y)
            .field("action", action.as_str())
            .emit();

        let host = self.host.as_ref();
        let hit = host.element_from_point(x, y).filter(|element| {
            host.document_element().as_ref() != Some(element) && host.body().as_ref() != Some(element)
        });

        let Some(selector) = self.selectors.generate(host, hit.as_ref()) else {
            self.reply(OutboundMessage::NoElementDetected { action });
            return;
        };

        self.logger
            .debug_builder("Generated selector")
            .field("selector", selector.clone())
            .emit();

        match action {
            DetectAction::Hover => {
                self.highlight.highlight(&selector);
                self.reply(OutboundMessage::ElementHovered { selector });
            }
            DetectAction::Click => self.reply(OutboundMessage::ElementClicked { selector }),
        }
    }

    fn request_info(&self, selector: &str) {
        let element = match self.host.query_selector(selector) {
            Ok(Some(element)) => element,
            Ok(None) => {
                self.logger
                    .warn_builder("Element not found for info request")
                    .field("selector", selector)
                    .emit();
                return;
            }
            Err(e) => {
                self.logger
                    .error_builder("Error getting element info")
                    .field("selector", selector)
                    .field("error", e.to_string())
                    .emit();
                return;
            }
        };

        let info = element_info(self.host.as_ref(), &element, self.text_preview_chars);
        self.reply(OutboundMessage::ElementInfo {
            selector: selector.to_string(),
            info,
        });
    }

    fn reply(&self, message: OutboundMessage) {
        let tag = message.tag();
        let result = message
            .to_wire()
            .and_then(|wire| self.host.post_to_parent(&wire));
        if let Err(e) = result {
            self.logger
                .error_builder("Failed to post reply")
                .field("type", tag)
                .field("error", e.to_string())
                .emit();
        }
    }
}
