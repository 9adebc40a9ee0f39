//! Element metadata reported to the editor.

use crate::host::DomAccess;
use crate::protocol::{ComputedStyles, ElementInfo};

/// Collect tag, class, text preview, styles and rectangle for `element`.
///
/// The text preview keeps the first `text_chars` characters of the
/// element's text content.
pub fn element_info<D: DomAccess>(dom: &D, element: &D::Element, text_chars: usize) -> ElementInfo {
    let text_content = dom
        .text_content(element)
        .map(|text| text.chars().take(text_chars).collect())
        .unwrap_or_default();

    ElementInfo {
        tag_name: dom.tag_name(element),
        class_name: dom.class_attribute(element).unwrap_or_default(),
        text_content,
        computed_styles: computed_styles(dom, element),
        bounding_rect: dom.bounding_rect(element),
    }
}

fn computed_styles<D: DomAccess>(dom: &D, element: &D::Element) -> ComputedStyles {
    let [color, background_color, font_size, padding, margin, width, height] =
        ComputedStyles::PROPERTIES.map(|property| dom.computed_style(element, property));

    ComputedStyles {
        color,
        background_color,
        font_size,
        padding,
        margin,
        width,
        height,
    }
}
