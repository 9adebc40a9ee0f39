//! Highlight overlay controller.
//!
//! Owns one overlay element, created on first use and reused for the
//! lifetime of the page. The overlay tracks the highlighted element's
//! viewport rectangle and follows it on scroll through a single
//! capturing listener, debounced to bound reflow cost.
//!
//! The highlighted element is held weakly: removing it from the page
//! releases it even while the highlight is still set.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{BridgeConfig, OverlayStyle};
use crate::debounce::Debouncer;
use crate::error::BridgeResult;
use crate::host::{DomEvent, Host, ListenerId, ListenerOptions, ListenerTarget, Rect};
use crate::logging::StructuredLogger;

/// Overlay z-index: the largest 32-bit signed value browsers accept.
pub const OVERLAY_Z_INDEX: &str = "2147483647";

/// Whether an element is currently highlighted.
#[derive(Debug, Clone, PartialEq)]
pub enum HighlightPhase<E> {
    Cleared,
    Highlighted { target: E },
}

/// The registered scroll listener and the reposition it drives.
struct ScrollSync<H: Host> {
    listener: ListenerId,
    debouncer: Rc<Debouncer<H>>,
}

struct HighlightState<H: Host> {
    phase: HighlightPhase<H::WeakElement>,
    overlay: Option<H::Element>,
    scroll: Option<ScrollSync<H>>,
}

/// Draws and tracks the highlight overlay.
pub struct HighlightOverlay<H: Host> {
    host: Rc<H>,
    style: OverlayStyle,
    debounce: std::time::Duration,
    logger: StructuredLogger,
    state: Rc<RefCell<HighlightState<H>>>,
}

impl<H: Host> HighlightOverlay<H> {
    pub fn new(host: Rc<H>, config: &BridgeConfig, logger: StructuredLogger) -> Self {
        Self {
            host,
            style: config.overlay.clone(),
            debounce: config.scroll_debounce(),
            logger,
            state: Rc::new(RefCell::new(HighlightState {
                phase: HighlightPhase::Cleared,
                overlay: None,
                scroll: None,
            })),
        }
    }

    /// Highlight the first element matching `selector`.
    ///
    /// Lookup failures and DOM errors are logged; prior state is kept.
    pub fn highlight(&self, selector: &str) {
        let target = match self.host.query_selector(selector) {
            Ok(Some(target)) => target,
            Ok(None) => {
                self.logger
                    .warn_builder("Cannot highlight: element not found")
                    .field("selector", selector)
                    .emit();
                return;
            }
            Err(e) => {
                self.logger
                    .error_builder("Error highlighting element")
                    .field("selector", selector)
                    .field("error", e.to_string())
                    .emit();
                return;
            }
        };

        if let Err(e) = self.show(target) {
            self.logger
                .error_builder("Error highlighting element")
                .field("selector", selector)
                .field("error", e.to_string())
                .emit();
        }
    }

    fn show(&self, target: H::Element) -> BridgeResult<()> {
        let overlay = self.ensure_overlay()?;
        let rect = self.host.bounding_rect(&target);
        apply_rect(self.host.as_ref(), &overlay, rect, &self.logger)?;

        let target = self.host.downgrade(&target);
        self.state.borrow_mut().phase = HighlightPhase::Highlighted { target };

        if let Err(e) = self.ensure_scroll_sync() {
            self.logger
                .warn_builder("Scroll tracking unavailable")
                .field("error", e.to_string())
                .emit();
        }
        Ok(())
    }

    /// Hide the overlay and stop tracking. No-op when nothing is highlighted.
    pub fn clear(&self) {
        let (overlay, scroll) = {
            let mut state = self.state.borrow_mut();
            if matches!(state.phase, HighlightPhase::Cleared) && state.scroll.is_none() {
                return;
            }
            state.phase = HighlightPhase::Cleared;
            (state.overlay.clone(), state.scroll.take())
        };

        if let Some(overlay) = overlay {
            if let Err(e) = self.host.set_style(&overlay, "display", "none") {
                self.logger
                    .error_builder("Error hiding overlay")
                    .field("error", e.to_string())
                    .emit();
            }
        }

        if let Some(scroll) = scroll {
            scroll.debouncer.cancel();
            if let Err(e) = self.host.remove_listener(scroll.listener) {
                self.logger
                    .error_builder("Error removing scroll listener")
                    .field("error", e.to_string())
                    .emit();
            }
        }
    }

    /// Current phase. A target the host has already collected reads as
    /// `Cleared`: there is nothing left to outline.
    pub fn phase(&self) -> HighlightPhase<H::Element> {
        match &self.state.borrow().phase {
            HighlightPhase::Highlighted { target } => match self.host.upgrade(target) {
                Some(target) => HighlightPhase::Highlighted { target },
                None => HighlightPhase::Cleared,
            },
            HighlightPhase::Cleared => HighlightPhase::Cleared,
        }
    }

    fn ensure_overlay(&self) -> BridgeResult<H::Element> {
        if let Some(overlay) = self.state.borrow().overlay.clone() {
            return Ok(overlay);
        }

        let host = self.host.as_ref();
        let overlay = host.create_element("div")?;
        let fixed = [
            ("position", "fixed"),
            ("pointer-events", "none"),
            ("z-index", OVERLAY_Z_INDEX),
            ("display", "none"),
        ];
        for (property, value) in fixed {
            host.set_style(&overlay, property, value)?;
        }
        host.set_style(&overlay, "border", &self.style.border)?;
        host.set_style(&overlay, "background", &self.style.background)?;
        host.set_style(&overlay, "box-shadow", &self.style.box_shadow)?;
        host.set_style(&overlay, "transition", &self.style.transition)?;
        host.append_to_body(&overlay)?;

        self.logger.debug("Highlight overlay created");
        self.state.borrow_mut().overlay = Some(overlay.clone());
        Ok(overlay)
    }

    fn ensure_scroll_sync(&self) -> BridgeResult<()> {
        if self.state.borrow().scroll.is_some() {
            return Ok(());
        }

        let weak_host = Rc::downgrade(&self.host);
        let weak_state = Rc::downgrade(&self.state);
        let logger = self.logger.clone();
        let debouncer = Rc::new(Debouncer::new(self.host.clone(), self.debounce, move || {
            if let (Some(host), Some(state)) = (weak_host.upgrade(), weak_state.upgrade()) {
                reposition(host.as_ref(), &state, &logger);
            }
        }));

        let trigger = Rc::downgrade(&debouncer);
        let logger = self.logger.clone();
        let listener = self.host.add_listener(
            ListenerTarget::Window,
            "scroll",
            ListenerOptions::capture(),
            Rc::new(move |_event: &dyn DomEvent| {
                if let Some(debouncer) = trigger.upgrade() {
                    if let Err(e) = debouncer.trigger() {
                        logger
                            .error_builder("Error scheduling overlay reposition")
                            .field("error", e.to_string())
                            .emit();
                    }
                }
            }),
        )?;

        self.state.borrow_mut().scroll = Some(ScrollSync {
            listener,
            debouncer,
        });
        Ok(())
    }
}

/// Move the overlay to the highlighted element's current rectangle.
fn reposition<H: Host>(host: &H, state: &RefCell<HighlightState<H>>, logger: &StructuredLogger) {
    let (target, overlay) = {
        let state = state.borrow();
        match (&state.phase, &state.overlay) {
            (HighlightPhase::Highlighted { target }, Some(overlay)) => {
                (target.clone(), overlay.clone())
            }
            _ => return,
        }
    };

    let Some(target) = host.upgrade(&target).filter(|target| host.is_connected(target)) else {
        logger.debug("Highlighted element left the document; overlay not moved");
        return;
    };

    let rect = host.bounding_rect(&target);
    if let Err(e) = apply_rect(host, &overlay, rect, logger) {
        logger
            .error_builder("Error repositioning overlay")
            .field("error", e.to_string())
            .emit();
    }
}

/// Place and show the overlay. The geometry is applied as a unit: when a
/// write fails, the properties already written get their previous values
/// back and the overlay keeps showing what it showed before.
fn apply_rect<H: Host>(
    host: &H,
    overlay: &H::Element,
    rect: Rect,
    logger: &StructuredLogger,
) -> BridgeResult<()> {
    let geometry = [
        ("top", px(rect.top)),
        ("left", px(rect.left)),
        ("width", px(rect.width)),
        ("height", px(rect.height)),
        ("display", "block".to_string()),
    ];

    let mut previous = Vec::with_capacity(geometry.len());
    for (property, _) in &geometry {
        previous.push((*property, host.style_property(overlay, property)?));
    }

    for (written, (property, value)) in geometry.iter().enumerate() {
        if let Err(e) = host.set_style(overlay, property, value) {
            for (property, value) in previous[..written].iter().rev() {
                if let Err(restore) = host.set_style(overlay, property, value) {
                    logger
                        .error_builder("Error restoring overlay geometry")
                        .field("property", *property)
                        .field("error", restore.to_string())
                        .emit();
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

fn px(value: f64) -> String {
    format!("{}px", value)
}
