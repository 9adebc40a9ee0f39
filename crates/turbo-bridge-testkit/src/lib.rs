//! Test support for the visual-edit bridge.
//!
//! [`MockDocument`] implements every host trait over an in-memory DOM with
//! explicit geometry, scripted event dispatch, a virtual clock and a
//! parent-frame outbox. [`BridgeHarness`] wires a bridge to one.
//!
//! ```rust,ignore
//! use turbo_bridge::host::Rect;
//! use turbo_bridge_testkit::{BridgeHarness, MockDocument};
//!
//! let doc = MockDocument::new();
//! doc.element("button")
//!     .id("buy")
//!     .rect(Rect::new(10.0, 10.0, 80.0, 30.0))
//!     .append_to(doc.body_id());
//!
//! let harness = BridgeHarness::new(doc)?;
//! harness.send(json!({"type": "VISUAL_EDIT_DETECT_ELEMENT", "x": 20, "y": 20, "action": "click"}));
//! assert_eq!(harness.replies(), vec![json!({"type": "ELEMENT_CLICKED", "selector": "#buy"})]);
//! ```

mod channel;
mod document;
mod events;
mod harness;
pub mod selector_engine;
mod timers;

pub use document::{ElementBuilder, Faults, MockDocument, NodeId};
pub use events::{DispatchReport, EventTarget, MockEvent};
pub use harness::BridgeHarness;
