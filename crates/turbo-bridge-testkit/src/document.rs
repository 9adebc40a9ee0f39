//! In-memory document.
//!
//! An arena of element nodes rooted at `<html>` with a `<body>` child.
//! Geometry is explicit: every element carries the viewport rectangle it
//! would report from `getBoundingClientRect`, and hit testing walks the
//! tree in paint order (later in document order paints on top).

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use serde_json::Value;
use turbo_bridge::host::{DomAccess, ListenerId, MessageHandler, Rect};
use turbo_bridge::{BridgeError, BridgeResult};

use crate::events::Registration;
use crate::selector_engine::{self, SelectorTree};
use crate::timers::VirtualClock;

/// Handle to an element in a [`MockDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Namespace {
    Html,
    Svg,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    namespace: Namespace,
    id: String,
    class: Option<String>,
    text: String,
    rect: Rect,
    computed: BTreeMap<String, String>,
    inline: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Set once nothing but weak handles could still reach the node.
    collected: bool,
}

impl Node {
    fn new(tag: &str, namespace: Namespace) -> Self {
        Self {
            tag: tag.to_string(),
            namespace,
            id: String::new(),
            class: None,
            text: String::new(),
            rect: Rect::default(),
            computed: BTreeMap::new(),
            inline: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
            collected: false,
        }
    }

    fn style(&self, property: &str) -> Option<&str> {
        self.inline
            .get(property)
            .or_else(|| self.computed.get(property))
            .map(String::as_str)
    }
}

const ROOT: NodeId = NodeId(0);
const BODY: NodeId = NodeId(1);

#[derive(Debug)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn new(viewport: Rect) -> Self {
        let mut html = Node::new("html", Namespace::Html);
        html.rect = viewport;
        html.children.push(BODY);

        let mut body = Node::new("body", Namespace::Html);
        body.rect = viewport;
        body.parent = Some(ROOT);

        Self {
            nodes: vec![html, body],
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn insert(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|&child| child != id);
        }
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ROOT {
                return true;
            }
            current = self.node(node).parent;
        }
        false
    }

    /// Connected elements in document order.
    fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev());
        }
        order
    }

    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            found.push(next);
            stack.extend(self.node(next).children.iter().rev());
        }
        found
    }

    fn text_content(&self, id: NodeId) -> String {
        let node = self.node(id);
        let mut text = node.text.clone();
        for &child in &node.children {
            text.push_str(&self.text_content(child));
        }
        text
    }

    fn hit_testable(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.style("pointer-events") != Some("none") && node.style("display") != Some("none")
    }
}

impl SelectorTree for Tree {
    type Node = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn local_name(&self, node: NodeId) -> String {
        self.node(node).tag.to_ascii_lowercase()
    }

    fn id(&self, node: NodeId) -> String {
        self.node(node).id.clone()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node)
            .class
            .as_deref()
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn child_index(&self, node: NodeId) -> usize {
        match self.node(node).parent {
            Some(parent) => self
                .node(parent)
                .children
                .iter()
                .position(|&child| child == node)
                .map_or(0, |index| index + 1),
            None => 1,
        }
    }
}

/// Failures the document can be told to produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Faults {
    pub create_element: bool,
    pub set_style: bool,
    /// Style writes to this one property fail.
    pub style_property: Option<String>,
    pub post_message: bool,
    pub timers: bool,
    /// Listener registrations for this event type fail.
    pub listener_event: Option<String>,
    pub remove_listener: bool,
}

/// A scriptable stand-in for the browser.
///
/// Implements every host trait the bridge needs. Callbacks are always
/// invoked with no internal borrow held, so they may call back into the
/// document freely.
pub struct MockDocument {
    pub(crate) tree: RefCell<Tree>,
    pub(crate) listeners: RefCell<Vec<Registration>>,
    pub(crate) message_handlers: RefCell<Vec<(ListenerId, MessageHandler)>>,
    pub(crate) clock: RefCell<VirtualClock>,
    pub(crate) outbox: RefCell<Vec<Value>>,
    pub(crate) faults: RefCell<Faults>,
    next_id: Cell<u64>,
    viewport: Rect,
}

impl Default for MockDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDocument {
    /// An empty 1280x800 document.
    pub fn new() -> Self {
        Self::with_viewport(1280.0, 800.0)
    }

    pub fn with_viewport(width: f64, height: f64) -> Self {
        let viewport = Rect::new(0.0, 0.0, width, height);
        Self {
            tree: RefCell::new(Tree::new(viewport)),
            listeners: RefCell::new(Vec::new()),
            message_handlers: RefCell::new(Vec::new()),
            clock: RefCell::new(VirtualClock::default()),
            outbox: RefCell::new(Vec::new()),
            faults: RefCell::new(Faults::default()),
            next_id: Cell::new(1),
            viewport,
        }
    }

    pub(crate) fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Start building an HTML element.
    pub fn element(&self, tag: &str) -> ElementBuilder<'_> {
        ElementBuilder {
            doc: self,
            node: Node::new(&tag.to_ascii_lowercase(), Namespace::Html),
        }
    }

    /// Start building an SVG element. Its `className` is not a string.
    pub fn svg_element(&self, tag: &str) -> ElementBuilder<'_> {
        ElementBuilder {
            doc: self,
            node: Node::new(tag, Namespace::Svg),
        }
    }

    pub fn root_id(&self) -> NodeId {
        ROOT
    }

    pub fn body_id(&self) -> NodeId {
        BODY
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Make later calls fail as described.
    pub fn set_faults(&self, faults: Faults) {
        *self.faults.borrow_mut() = faults;
    }

    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.borrow().node(node).children.clone()
    }

    /// Inline style value, if set.
    pub fn inline_style(&self, node: NodeId, property: &str) -> Option<String> {
        self.tree.borrow().node(node).inline.get(property).cloned()
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        self.tree.borrow_mut().node_mut(node).rect = rect;
    }

    pub fn set_class(&self, node: NodeId, class: &str) {
        self.tree.borrow_mut().node_mut(node).class = Some(class.to_string());
    }

    /// Detach an element and its subtree from the document.
    pub fn remove(&self, node: NodeId) {
        self.tree.borrow_mut().detach(node);
    }

    /// Collect every element outside the document. Weak handles to them
    /// stop upgrading.
    pub fn collect_garbage(&self) {
        let mut tree = self.tree.borrow_mut();
        let detached: Vec<NodeId> = (0..tree.nodes.len())
            .map(NodeId)
            .filter(|&node| !tree.is_connected(node))
            .collect();
        for node in detached {
            tree.node_mut(node).collected = true;
        }
    }

    /// Shift an element subtree's rectangles.
    pub(crate) fn shift_subtree(&self, node: NodeId, dx: f64, dy: f64, include_self: bool) {
        let mut tree = self.tree.borrow_mut();
        let mut targets = tree.descendants(node);
        if include_self {
            targets.push(node);
        }
        for id in targets {
            let rect = &mut tree.node_mut(id).rect;
            rect.left -= dx;
            rect.top -= dy;
        }
    }

    /// Ancestors from the root down to `node`'s parent.
    pub(crate) fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        let mut chain = Vec::new();
        let mut current = tree.node(node).parent;
        while let Some(id) = current {
            chain.push(id);
            current = tree.node(id).parent;
        }
        chain.reverse();
        chain
    }

    fn dom_fault(&self, operation: &str) -> BridgeError {
        BridgeError::Dom(format!("{} failed", operation))
    }
}

impl DomAccess for MockDocument {
    type Element = NodeId;
    type WeakElement = NodeId;

    fn downgrade(&self, element: &NodeId) -> NodeId {
        *element
    }

    fn upgrade(&self, weak: &NodeId) -> Option<NodeId> {
        (!self.tree.borrow().node(*weak).collected).then_some(*weak)
    }

    fn document_element(&self) -> Option<NodeId> {
        Some(ROOT)
    }

    fn body(&self) -> Option<NodeId> {
        Some(BODY)
    }

    fn query_selector(&self, selector: &str) -> BridgeResult<Option<NodeId>> {
        let parts = selector_engine::parse(selector)?;
        let tree = self.tree.borrow();
        Ok(tree
            .preorder()
            .into_iter()
            .find(|&node| selector_engine::matches(&*tree, &parts, node)))
    }

    fn element_from_point(&self, x: f64, y: f64) -> Option<NodeId> {
        if !self.viewport.contains(x, y) {
            return None;
        }
        let tree = self.tree.borrow();
        tree.preorder()
            .into_iter()
            .filter(|&node| tree.hit_testable(node) && tree.node(node).rect.contains(x, y))
            .last()
    }

    fn id(&self, element: &NodeId) -> String {
        self.tree.borrow().node(*element).id.clone()
    }

    fn tag_name(&self, element: &NodeId) -> String {
        let tree = self.tree.borrow();
        let node = tree.node(*element);
        match node.namespace {
            Namespace::Html => node.tag.to_ascii_uppercase(),
            Namespace::Svg => node.tag.clone(),
        }
    }

    fn class_name(&self, element: &NodeId) -> Option<String> {
        let tree = self.tree.borrow();
        let node = tree.node(*element);
        match node.namespace {
            Namespace::Html => Some(node.class.clone().unwrap_or_default()),
            Namespace::Svg => None,
        }
    }

    fn class_attribute(&self, element: &NodeId) -> Option<String> {
        self.tree.borrow().node(*element).class.clone()
    }

    fn parent_element(&self, element: &NodeId) -> Option<NodeId> {
        self.tree.borrow().node(*element).parent
    }

    fn children(&self, element: &NodeId) -> Vec<NodeId> {
        self.children_of(*element)
    }

    fn text_content(&self, element: &NodeId) -> Option<String> {
        Some(self.tree.borrow().text_content(*element))
    }

    fn bounding_rect(&self, element: &NodeId) -> Rect {
        let tree = self.tree.borrow();
        if tree.is_connected(*element) {
            tree.node(*element).rect
        } else {
            Rect::default()
        }
    }

    fn computed_style(&self, element: &NodeId, property: &str) -> String {
        let tree = self.tree.borrow();
        let node = tree.node(*element);
        if let Some(value) = node.style(property) {
            return value.to_string();
        }
        match property {
            "width" => format!("{}px", node.rect.width),
            "height" => format!("{}px", node.rect.height),
            "display" => "block".to_string(),
            _ => String::new(),
        }
    }

    fn is_connected(&self, element: &NodeId) -> bool {
        self.tree.borrow().is_connected(*element)
    }

    fn create_element(&self, tag: &str) -> BridgeResult<NodeId> {
        if self.faults.borrow().create_element {
            return Err(self.dom_fault("createElement"));
        }
        let node = Node::new(&tag.to_ascii_lowercase(), Namespace::Html);
        Ok(self.tree.borrow_mut().insert(node))
    }

    fn append_to_body(&self, element: &NodeId) -> BridgeResult<()> {
        self.tree.borrow_mut().append(BODY, *element);
        Ok(())
    }

    fn style_property(&self, element: &NodeId, property: &str) -> BridgeResult<String> {
        Ok(self.inline_style(*element, property).unwrap_or_default())
    }

    fn set_style(&self, element: &NodeId, property: &str, value: &str) -> BridgeResult<()> {
        let fails = {
            let faults = self.faults.borrow();
            faults.set_style || faults.style_property.as_deref() == Some(property)
        };
        if fails {
            return Err(self.dom_fault(&format!("style.setProperty({})", property)));
        }
        let mut tree = self.tree.borrow_mut();
        let inline = &mut tree.node_mut(*element).inline;
        if value.is_empty() {
            inline.remove(property);
        } else {
            inline.insert(property.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// Builds one element and attaches it to the document.
pub struct ElementBuilder<'a> {
    doc: &'a MockDocument,
    node: Node,
}

impl<'a> ElementBuilder<'a> {
    pub fn id(mut self, id: &str) -> Self {
        self.node.id = id.to_string();
        self
    }

    /// Set the raw `class` attribute.
    pub fn class(mut self, class: &str) -> Self {
        self.node.class = Some(class.to_string());
        self
    }

    /// Own text, rendered before any children.
    pub fn text(mut self, text: &str) -> Self {
        self.node.text = text.to_string();
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.node.rect = rect;
        self
    }

    /// Set a computed style value.
    pub fn style(mut self, property: &str, value: &str) -> Self {
        self.node
            .computed
            .insert(property.to_string(), value.to_string());
        self
    }

    /// Attach as the last child of `parent`.
    pub fn append_to(self, parent: NodeId) -> NodeId {
        let mut tree = self.doc.tree.borrow_mut();
        let id = tree.insert(self.node);
        tree.append(parent, id);
        id
    }

    /// Insert without attaching.
    pub fn detached(self) -> NodeId {
        self.doc.tree.borrow_mut().insert(self.node)
    }
}
