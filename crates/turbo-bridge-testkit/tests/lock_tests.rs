//! Interaction lock behavior.

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;
use turbo_bridge::prelude::*;
use turbo_bridge_testkit::{BridgeHarness, EventTarget, Faults, MockDocument, NodeId};

fn page_with_button() -> (MockDocument, NodeId) {
    let doc = MockDocument::new();
    let button = doc
        .element("button")
        .id("buy")
        .rect(Rect::new(100.0, 100.0, 120.0, 40.0))
        .append_to(doc.body_id());
    (doc, button)
}

fn counting_listener(doc: &MockDocument, node: NodeId, event_type: &str) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let seen = count.clone();
    doc.add_element_listener(
        node,
        event_type,
        ListenerOptions::bubble(),
        Rc::new(move |_event: &dyn DomEvent| seen.set(seen.get() + 1)),
    );
    count
}

fn suppressor_count(doc: &MockDocument) -> usize {
    MONITORED_EVENTS
        .iter()
        .map(|event_type| doc.listener_count(EventTarget::Document, event_type))
        .sum()
}

#[test]
fn test_activate_blocks_page_handlers() {
    let (doc, button) = page_with_button();
    let clicks = counting_listener(&doc, button, "click");
    let harness = BridgeHarness::new(doc).unwrap();

    harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));
    let report = harness.doc.click(button);

    assert_eq!(clicks.get(), 0);
    assert!(report.default_prevented);
    assert!(report.propagation_stopped);
    assert!(harness.bridge.is_edit_mode_active());
}

#[test]
fn test_every_monitored_event_is_suppressed() {
    let (doc, button) = page_with_button();
    let counts: Vec<Rc<Cell<u32>>> = MONITORED_EVENTS
        .iter()
        .map(|event_type| counting_listener(&doc, button, event_type))
        .collect();
    let harness = BridgeHarness::new(doc).unwrap();

    harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));
    for event_type in MONITORED_EVENTS {
        let report = harness
            .doc
            .dispatch_event(EventTarget::Element(button), event_type, true);
        assert!(report.default_prevented, "{event_type} was not prevented");
    }

    assert!(counts.iter().all(|count| count.get() == 0));
}

#[test]
fn test_unmonitored_events_pass_through() {
    let (doc, button) = page_with_button();
    let moves = counting_listener(&doc, button, "mousemove");
    let harness = BridgeHarness::new(doc).unwrap();

    harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));
    let report = harness
        .doc
        .dispatch_event(EventTarget::Element(button), "mousemove", true);

    assert_eq!(moves.get(), 1);
    assert!(!report.default_prevented);
}

#[test]
fn test_activate_sets_body_styles() {
    let harness = BridgeHarness::new(MockDocument::new()).unwrap();
    let body = harness.doc.body_id();

    harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));
    assert_eq!(
        harness.doc.inline_style(body, "cursor"),
        Some("crosshair".to_string())
    );
    assert_eq!(
        harness.doc.inline_style(body, "user-select"),
        Some("none".to_string())
    );

    harness.send(json!({"type": "VISUAL_EDIT_MODE_DEACTIVATE"}));
    assert_eq!(harness.doc.inline_style(body, "cursor"), None);
    assert_eq!(harness.doc.inline_style(body, "user-select"), None);
}

#[test]
fn test_configured_cursor() {
    let config = BridgeConfig::new().with_edit_cursor("cell");
    let harness = BridgeHarness::with_config(MockDocument::new(), config).unwrap();

    harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));

    assert_eq!(
        harness.doc.inline_style(harness.doc.body_id(), "cursor"),
        Some("cell".to_string())
    );
}

#[test]
fn test_activate_is_idempotent() {
    let harness = BridgeHarness::new(MockDocument::new()).unwrap();

    harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));
    harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));

    assert_eq!(suppressor_count(&harness.doc), MONITORED_EVENTS.len());
    for event_type in MONITORED_EVENTS {
        assert_eq!(
            harness.doc.listener_count(EventTarget::Document, event_type),
            1
        );
    }
    assert_eq!(
        harness
            .logs
            .entries()
            .iter()
            .filter(|e| e.message.contains("ACTIVATED"))
            .count(),
        1
    );
}

#[test]
fn test_deactivate_restores_interaction() {
    let (doc, button) = page_with_button();
    let clicks = counting_listener(&doc, button, "click");
    let harness = BridgeHarness::new(doc).unwrap();

    harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));
    harness.send(json!({"type": "VISUAL_EDIT_MODE_DEACTIVATE"}));
    let report = harness.doc.click(button);

    assert_eq!(clicks.get(), 1);
    assert!(!report.default_prevented);
    assert_eq!(suppressor_count(&harness.doc), 0);
    assert_eq!(harness.bridge.lock_state(), LockState::Inactive);
}

#[test]
fn test_deactivate_when_inactive_is_noop() {
    let harness = BridgeHarness::new(MockDocument::new()).unwrap();

    harness.send(json!({"type": "VISUAL_EDIT_MODE_DEACTIVATE"}));
    harness.send(json!({"type": "VISUAL_EDIT_MODE_DEACTIVATE"}));

    assert!(!harness.bridge.is_edit_mode_active());
    assert!(!harness.logs.contains("DEACTIVATED"));
    assert_eq!(
        harness.doc.inline_style(harness.doc.body_id(), "cursor"),
        None
    );
}

#[test]
fn test_reactivation_cycle() {
    let (doc, button) = page_with_button();
    let clicks = counting_listener(&doc, button, "click");
    let harness = BridgeHarness::new(doc).unwrap();

    for _ in 0..3 {
        harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));
        harness.doc.click(button);
        harness.send(json!({"type": "VISUAL_EDIT_MODE_DEACTIVATE"}));
        harness.doc.click(button);
    }

    assert_eq!(clicks.get(), 3);
    assert_eq!(suppressor_count(&harness.doc), 0);
}

#[test]
fn test_failed_activation_rolls_back() {
    let (doc, button) = page_with_button();
    let clicks = counting_listener(&doc, button, "click");
    doc.set_faults(Faults {
        listener_event: Some("submit".to_string()),
        ..Faults::default()
    });
    let harness = BridgeHarness::new(doc).unwrap();

    harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));

    assert!(!harness.bridge.is_edit_mode_active());
    assert_eq!(suppressor_count(&harness.doc), 0);
    assert_eq!(
        harness.doc.inline_style(harness.doc.body_id(), "cursor"),
        None
    );
    assert!(harness.logs.contains("Failed to activate edit mode"));

    harness.doc.click(button);
    assert_eq!(clicks.get(), 1);

    harness.doc.set_faults(Faults::default());
    harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));
    assert!(harness.bridge.is_edit_mode_active());
}

#[test]
fn test_lock_state_tracks_listener_ids() {
    let harness = BridgeHarness::new(MockDocument::new()).unwrap();

    harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));

    match harness.bridge.lock_state() {
        LockState::Active { listeners } => assert_eq!(listeners.len(), MONITORED_EVENTS.len()),
        LockState::Inactive => panic!("lock should be active"),
    }
}

#[test]
fn test_listener_removal_failure_still_deactivates() {
    let (doc, button) = page_with_button();
    let clicks = counting_listener(&doc, button, "click");
    let harness = BridgeHarness::new(doc).unwrap();

    harness.send(json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"}));
    harness.doc.set_faults(Faults {
        remove_listener: true,
        ..Faults::default()
    });
    harness.send(json!({"type": "VISUAL_EDIT_MODE_DEACTIVATE"}));

    assert!(!harness.bridge.is_edit_mode_active());
    assert_eq!(
        harness
            .logs
            .entries()
            .iter()
            .filter(|e| e.message == "Error removing interaction listener")
            .count(),
        MONITORED_EVENTS.len()
    );

    let report = harness.doc.click(button);
    assert_eq!(clicks.get(), 1);
    assert!(!report.default_prevented);
}
