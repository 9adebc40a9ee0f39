//! Selector generation.
//!
//! Maps an element to a CSS selector that resolves back to it. Elements
//! with an `id` get `#id`; everything else gets a `tag.class:nth-child(n)`
//! path joined with `>`, capped in depth so selectors survive small DOM
//! changes. The result is best effort: it is checked against the live
//! document at generation time and nothing more.

use crate::config::BridgeConfig;
use crate::escape::css_escape;
use crate::host::DomAccess;
use crate::logging::StructuredLogger;

/// Generates selectors for elements.
#[derive(Debug, Clone)]
pub struct SelectorGenerator {
    max_depth: usize,
    max_classes: usize,
    logger: StructuredLogger,
}

impl SelectorGenerator {
    pub fn new(config: &BridgeConfig, logger: StructuredLogger) -> Self {
        Self {
            max_depth: config.max_selector_depth,
            max_classes: config.max_selector_classes,
            logger,
        }
    }

    /// Generate a selector for `element`, or `None` when no selector
    /// resolving to exactly that element can be produced.
    pub fn generate<D: DomAccess>(&self, dom: &D, element: Option<&D::Element>) -> Option<String> {
        let element = element?;
        if dom.document_element().as_ref() == Some(element) {
            return None;
        }

        let id = dom.id(element);
        if !id.is_empty() {
            return Some(format!("#{}", css_escape(&id)));
        }

        let selector = self.build_path(dom, element);
        self.validate(dom, element, selector)
    }

    fn build_path<D: DomAccess>(&self, dom: &D, element: &D::Element) -> String {
        let body = dom.body();
        let mut path = Vec::new();
        let mut current = Some(element.clone());

        while let Some(node) = current {
            if body.as_ref() == Some(&node) || path.len() >= self.max_depth {
                break;
            }
            path.push(self.fragment(dom, &node));
            current = dom.parent_element(&node);
        }

        path.reverse();
        path.join(" > ")
    }

    /// One path level: `tag`, up to `max_classes` classes, then the
    /// sibling position when the parent has more than one child.
    fn fragment<D: DomAccess>(&self, dom: &D, node: &D::Element) -> String {
        let mut fragment = dom.tag_name(node).to_lowercase();

        if let Some(class_name) = dom.class_name(node) {
            let classes: Vec<String> = class_name
                .split_whitespace()
                .take(self.max_classes)
                .map(css_escape)
                .collect();
            if !classes.is_empty() {
                fragment.push('.');
                fragment.push_str(&classes.join("."));
            }
        }

        if let Some(parent) = dom.parent_element(node) {
            let siblings = dom.children(&parent);
            if siblings.len() > 1 {
                if let Some(index) = siblings.iter().position(|s| s == node) {
                    fragment.push_str(&format!(":nth-child({})", index + 1));
                }
            }
        }

        fragment
    }

    fn validate<D: DomAccess>(
        &self,
        dom: &D,
        element: &D::Element,
        selector: String,
    ) -> Option<String> {
        match dom.query_selector(&selector) {
            Ok(Some(found)) if &found == element => Some(selector),
            Ok(_) => {
                self.logger
                    .warn_builder("Generated selector does not resolve to the element")
                    .field("selector", selector)
                    .emit();
                None
            }
            Err(e) => {
                self.logger
                    .error_builder("Invalid selector generated")
                    .field("selector", selector)
                    .field("error", e.to_string())
                    .emit();
                None
            }
        }
    }
}
