//! Visual-edit bridge for TurboCommerce storefront previews.
//!
//! The bridge runs inside a preview iframe and lets the embedding editor:
//!
//! - **Detect**: resolve viewport coordinates to a reproducible CSS selector
//! - **Highlight**: outline an element and keep the outline in place on scroll
//! - **Lock**: suppress page interaction while the editor is in control
//! - **Inspect**: report tag, classes, text, styles and geometry of an element
//!
//! All DOM access goes through the traits in [`host`], so the same logic
//! runs in the browser (`turbo-bridge-web`) and on the in-memory document
//! used by the test suite (`turbo-bridge-testkit`).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use turbo_bridge::prelude::*;
//!
//! let config = BridgeConfig::default();
//! let logger = StructuredLogger::new("visual-edit").with_min_level(config.log_level);
//! let bridge = Rc::new(Bridge::new(host, &config, logger));
//! bridge.attach()?;
//! ```

pub mod config;
pub mod debounce;
pub mod error;
pub mod escape;
pub mod highlight;
pub mod host;
pub mod inspect;
pub mod lock;
pub mod logging;
pub mod protocol;
pub mod router;
pub mod selector;

pub use config::{BridgeConfig, OverlayStyle};
pub use error::{BridgeError, BridgeResult};
pub use router::Bridge;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{BridgeConfig, OverlayStyle};
    pub use crate::debounce::Debouncer;
    pub use crate::error::{BridgeError, BridgeResult};
    pub use crate::escape::css_escape;
    pub use crate::highlight::{HighlightOverlay, HighlightPhase};
    pub use crate::host::{
        DomAccess, DomEvent, EventCallback, EventHost, Host, ListenerId, ListenerOptions,
        ListenerTarget, MessageHandler, ParentChannel, Rect, TimerHost, TimerId,
    };
    pub use crate::inspect::element_info;
    pub use crate::lock::{InteractionLock, LockState, MONITORED_EVENTS};
    pub use crate::logging::{
        LogEntry, LogFormat, LogLevel, LogSink, MemorySink, StderrSink, StructuredLogger,
    };
    pub use crate::protocol::{
        ComputedStyles, DetectAction, ElementInfo, InboundMessage, OutboundMessage,
    };
    pub use crate::router::Bridge;
    pub use crate::selector::SelectorGenerator;
}
