//! Cross-frame message protocol.
//!
//! Messages are JSON objects tagged by a `type` field. Inbound tags the
//! bridge does not know decode to [`InboundMessage::Unknown`] so newer
//! editors can talk to older bridges.

use serde::{Deserialize, Serialize};

use crate::error::BridgeResult;
use crate::host::Rect;

/// What the editor wants done with a detected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectAction {
    Hover,
    Click,
}

impl DetectAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectAction::Hover => "hover",
            DetectAction::Click => "click",
        }
    }
}

/// Every inbound tag this bridge understands.
pub const KNOWN_TAGS: [&str; 6] = [
    "VISUAL_EDIT_MODE_ACTIVATE",
    "VISUAL_EDIT_MODE_DEACTIVATE",
    "VISUAL_EDIT_DETECT_ELEMENT",
    "VISUAL_EDIT_HIGHLIGHT",
    "VISUAL_EDIT_CLEAR_HIGHLIGHT",
    "VISUAL_EDIT_REQUEST_INFO",
];

/// Whether a raw message carries one of [`KNOWN_TAGS`].
pub fn is_known_tag(data: &serde_json::Value) -> bool {
    data.get("type")
        .and_then(|t| t.as_str())
        .is_some_and(|t| KNOWN_TAGS.contains(&t))
}

/// Commands sent by the editor frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "VISUAL_EDIT_MODE_ACTIVATE")]
    Activate,

    #[serde(rename = "VISUAL_EDIT_MODE_DEACTIVATE")]
    Deactivate,

    #[serde(rename = "VISUAL_EDIT_DETECT_ELEMENT")]
    DetectElement { x: f64, y: f64, action: DetectAction },

    #[serde(rename = "VISUAL_EDIT_HIGHLIGHT")]
    Highlight {
        #[serde(default)]
        selector: Option<String>,
    },

    #[serde(rename = "VISUAL_EDIT_CLEAR_HIGHLIGHT")]
    ClearHighlight,

    #[serde(rename = "VISUAL_EDIT_REQUEST_INFO")]
    RequestInfo { selector: String },

    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Decode a message from its wire form.
    pub fn from_wire(value: &serde_json::Value) -> BridgeResult<Self> {
        Ok(InboundMessage::deserialize(value)?)
    }

    /// Wire tag, or `None` for unknown messages.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            InboundMessage::Activate => Some("VISUAL_EDIT_MODE_ACTIVATE"),
            InboundMessage::Deactivate => Some("VISUAL_EDIT_MODE_DEACTIVATE"),
            InboundMessage::DetectElement { .. } => Some("VISUAL_EDIT_DETECT_ELEMENT"),
            InboundMessage::Highlight { .. } => Some("VISUAL_EDIT_HIGHLIGHT"),
            InboundMessage::ClearHighlight => Some("VISUAL_EDIT_CLEAR_HIGHLIGHT"),
            InboundMessage::RequestInfo { .. } => Some("VISUAL_EDIT_REQUEST_INFO"),
            InboundMessage::Unknown => None,
        }
    }
}

/// Fixed subset of computed styles reported for an element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedStyles {
    pub color: String,
    pub background_color: String,
    pub font_size: String,
    pub padding: String,
    pub margin: String,
    pub width: String,
    pub height: String,
}

impl ComputedStyles {
    /// CSS property names, in field order.
    pub const PROPERTIES: [&'static str; 7] = [
        "color",
        "background-color",
        "font-size",
        "padding",
        "margin",
        "width",
        "height",
    ];
}

/// Structural and style metadata about one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    pub tag_name: String,
    pub class_name: String,
    pub text_content: String,
    pub computed_styles: ComputedStyles,
    pub bounding_rect: Rect,
}

/// Replies posted to the editor frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "NO_ELEMENT_DETECTED")]
    NoElementDetected { action: DetectAction },

    #[serde(rename = "ELEMENT_HOVERED")]
    ElementHovered { selector: String },

    #[serde(rename = "ELEMENT_CLICKED")]
    ElementClicked { selector: String },

    #[serde(rename = "ELEMENT_INFO")]
    ElementInfo {
        selector: String,
        #[serde(flatten)]
        info: ElementInfo,
    },
}

impl OutboundMessage {
    /// Encode for posting.
    pub fn to_wire(&self) -> BridgeResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            OutboundMessage::NoElementDetected { .. } => "NO_ELEMENT_DETECTED",
            OutboundMessage::ElementHovered { .. } => "ELEMENT_HOVERED",
            OutboundMessage::ElementClicked { .. } => "ELEMENT_CLICKED",
            OutboundMessage::ElementInfo { .. } => "ELEMENT_INFO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decode_unit_commands() {
        let msg = InboundMessage::from_wire(&json!({"type": "VISUAL_EDIT_MODE_ACTIVATE"})).unwrap();
        assert_eq!(msg, InboundMessage::Activate);

        let msg =
            InboundMessage::from_wire(&json!({"type": "VISUAL_EDIT_CLEAR_HIGHLIGHT", "extra": 1}))
                .unwrap();
        assert_eq!(msg, InboundMessage::ClearHighlight);
    }

    #[test]
    fn test_decode_detect() {
        let msg = InboundMessage::from_wire(&json!({
            "type": "VISUAL_EDIT_DETECT_ELEMENT",
            "x": 12,
            "y": 40.5,
            "action": "hover"
        }))
        .unwrap();

        assert_eq!(
            msg,
            InboundMessage::DetectElement {
                x: 12.0,
                y: 40.5,
                action: DetectAction::Hover
            }
        );
    }

    #[test]
    fn test_decode_detect_rejects_unknown_action() {
        let result = InboundMessage::from_wire(&json!({
            "type": "VISUAL_EDIT_DETECT_ELEMENT",
            "x": 1,
            "y": 1,
            "action": "drag"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_highlight_without_selector() {
        let msg = InboundMessage::from_wire(&json!({"type": "VISUAL_EDIT_HIGHLIGHT"})).unwrap();
        assert_eq!(msg, InboundMessage::Highlight { selector: None });
    }

    #[test]
    fn test_decode_request_info_requires_selector() {
        let result = InboundMessage::from_wire(&json!({"type": "VISUAL_EDIT_REQUEST_INFO"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let msg = InboundMessage::from_wire(&json!({"type": "VISUAL_EDIT_FUTURE_THING", "a": 1}))
            .unwrap();
        assert_eq!(msg, InboundMessage::Unknown);
        assert_eq!(msg.tag(), None);
    }

    #[test]
    fn test_missing_type_is_an_error() {
        assert!(InboundMessage::from_wire(&json!({"selector": "#a"})).is_err());
        assert!(InboundMessage::from_wire(&json!("VISUAL_EDIT_MODE_ACTIVATE")).is_err());
    }

    #[test]
    fn test_is_known_tag() {
        assert!(is_known_tag(&json!({"type": "VISUAL_EDIT_HIGHLIGHT"})));
        assert!(!is_known_tag(&json!({"type": "SOMETHING_ELSE"})));
        assert!(!is_known_tag(&json!({"selector": "#a"})));
        assert!(!is_known_tag(&json!(42)));
    }

    #[test]
    fn test_tags_round_trip_through_known_list() {
        let messages = [
            InboundMessage::Activate,
            InboundMessage::Deactivate,
            InboundMessage::DetectElement {
                x: 0.0,
                y: 0.0,
                action: DetectAction::Click,
            },
            InboundMessage::Highlight { selector: None },
            InboundMessage::ClearHighlight,
            InboundMessage::RequestInfo {
                selector: "#a".to_string(),
            },
        ];
        for message in messages {
            let tag = message.tag().unwrap();
            assert!(KNOWN_TAGS.contains(&tag));
        }
    }

    #[test]
    fn test_encode_no_element() {
        let wire = OutboundMessage::NoElementDetected {
            action: DetectAction::Click,
        }
        .to_wire()
        .unwrap();

        assert_eq!(wire, json!({"type": "NO_ELEMENT_DETECTED", "action": "click"}));
    }

    #[test]
    fn test_encode_hovered() {
        let wire = OutboundMessage::ElementHovered {
            selector: "#buy".to_string(),
        }
        .to_wire()
        .unwrap();

        assert_eq!(wire, json!({"type": "ELEMENT_HOVERED", "selector": "#buy"}));
    }

    #[test]
    fn test_encode_element_info_is_flat() {
        let msg = OutboundMessage::ElementInfo {
            selector: "div.card".to_string(),
            info: ElementInfo {
                tag_name: "DIV".to_string(),
                class_name: "card".to_string(),
                text_content: "Hello World".to_string(),
                computed_styles: ComputedStyles {
                    color: "rgb(0, 0, 0)".to_string(),
                    background_color: "rgba(0, 0, 0, 0)".to_string(),
                    font_size: "16px".to_string(),
                    padding: "8px".to_string(),
                    margin: "0px".to_string(),
                    width: "200px".to_string(),
                    height: "40px".to_string(),
                },
                bounding_rect: Rect::new(10.0, 20.0, 200.0, 40.0),
            },
        };

        assert_eq!(
            msg.to_wire().unwrap(),
            json!({
                "type": "ELEMENT_INFO",
                "selector": "div.card",
                "tagName": "DIV",
                "className": "card",
                "textContent": "Hello World",
                "computedStyles": {
                    "color": "rgb(0, 0, 0)",
                    "backgroundColor": "rgba(0, 0, 0, 0)",
                    "fontSize": "16px",
                    "padding": "8px",
                    "margin": "0px",
                    "width": "200px",
                    "height": "40px"
                },
                "boundingRect": {"top": 10.0, "left": 20.0, "width": 200.0, "height": 40.0}
            })
        );
        assert_eq!(msg.tag(), "ELEMENT_INFO");
    }
}
