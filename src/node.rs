//! Output Node - the unit every render step produces.
//!
//! A node is a tag/identity, a property bag, event bindings and ordered
//! children. Nodes are shared (`Rc`) and immutable: a render step builds a new
//! tree every time, it never edits the previous one.
//!
//! # Identity
//!
//! ```text
//! Element("button")   plain platform element, realized by the adapter
//! Text("0")           plain leaf carrying text content
//! Component("Child")  reference resolved against the rendering definition's registry
//! ```
//!
//! # Example
//!
//! ```ignore
//! let node = Node::element("div")
//!     .prop("class", "parent")
//!     .child(Node::text("title"))
//!     .child(Node::component("Child").prop("data", 1).on("event", on_child).build()?)
//!     .build()?;
//! ```
//!
//! # Slots
//!
//! A component reference can hand named, pre-built content to the child it
//! produces. The child places it with [`Emitter::slot`](crate::Emitter::slot);
//! from then on it is part of the child's output, so handlers bound inside it
//! run in the child's context. Slot content is plain: component references
//! inside it are rejected at build time.
//!
//! ```ignore
//! Node::component("Card")
//!     .slot("header", Node::element("h2").text("Title").build()?)
//!     .build()?;
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::error::InvalidNodeError;
use crate::event::Handler;
use crate::types::{PropMap, Value};

/// Index path from an instance's output root to one of its nodes.
pub type NodePath = [usize];

/// Named content a component reference passes to its child.
pub type Slots = BTreeMap<String, Node>;

// =============================================================================
// NodeKind
// =============================================================================

/// What a node is: a plain platform node or a component reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Platform-level element identified by tag.
    Element(String),
    /// Text leaf.
    Text(String),
    /// Reference to a child definition by registry name.
    Component(String),
}

impl NodeKind {
    pub fn is_plain(&self) -> bool {
        !matches!(self, NodeKind::Component(_))
    }

    fn label(&self) -> &str {
        match self {
            NodeKind::Element(tag) => tag,
            NodeKind::Text(_) => "#text",
            NodeKind::Component(name) => name,
        }
    }
}

// =============================================================================
// Node
// =============================================================================

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    key: Option<String>,
    props: PropMap,
    events: BTreeMap<String, Handler>,
    slots: Slots,
    children: Vec<Node>,
}

/// Immutable output node. Cloning shares the same tree.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

impl Node {
    /// Start building a platform element.
    pub fn element(tag: impl Into<String>) -> NodeBuilder {
        NodeBuilder::new(NodeKind::Element(tag.into()))
    }

    /// Start building a component reference.
    pub fn component(name: impl Into<String>) -> NodeBuilder {
        NodeBuilder::new(NodeKind::Component(name.into()))
    }

    /// A text leaf. Cannot be malformed, so no builder is needed.
    pub fn text(content: impl Into<String>) -> Node {
        Node(Rc::new(NodeData {
            kind: NodeKind::Text(content.into()),
            key: None,
            props: PropMap::new(),
            events: BTreeMap::new(),
            slots: Slots::new(),
            children: Vec::new(),
        }))
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    pub fn is_component(&self) -> bool {
        !self.0.kind.is_plain()
    }

    /// Registry name, for component references.
    pub fn component_name(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Component(name) => Some(name),
            _ => None,
        }
    }

    /// Tag, for elements.
    pub fn tag(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    /// Content, for text leaves.
    pub fn text_content(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Text(content) => Some(content),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.0.key.as_deref()
    }

    pub fn props(&self) -> &PropMap {
        &self.0.props
    }

    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.0.props.get(name)
    }

    pub fn handler(&self, event: &str) -> Option<&Handler> {
        self.0.events.get(event)
    }

    /// Bound event names, sorted.
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.0.events.keys().map(String::as_str)
    }

    pub fn children(&self) -> &[Node] {
        &self.0.children
    }

    /// Slot content carried by a component reference.
    pub fn slots(&self) -> &Slots {
        &self.0.slots
    }

    /// Node at `path` below this one (`[]` is this node).
    pub fn at(&self, path: &NodePath) -> Option<&Node> {
        let mut node = self;
        for &i in path {
            node = node.0.children.get(i)?;
        }
        Some(node)
    }

    /// True when both handles share the same allocation.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Copy of this node with different children. Already validated, so no builder.
    pub(crate) fn with_children(&self, children: Vec<Node>) -> Node {
        Node(Rc::new(NodeData {
            kind: self.0.kind.clone(),
            key: self.0.key.clone(),
            props: self.0.props.clone(),
            events: self.0.events.clone(),
            slots: self.0.slots.clone(),
            children,
        }))
    }

    /// Component references in pre-order, including `self` when it is one.
    pub fn component_refs(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        collect_refs(self, &mut out);
        out
    }
}

fn collect_refs<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    if node.is_component() {
        out.push(node);
        return;
    }
    for child in node.children() {
        collect_refs(child, out);
    }
}

/// Structural equality. Handlers compare by event name only: closures have no
/// meaningful equality, and a re-render always rebuilds them.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (&*self.0, &*other.0);
        a.kind == b.kind
            && a.key == b.key
            && a.props == b.props
            && a.events.keys().eq(b.events.keys())
            && a.slots == b.slots
            && a.children == b.children
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = &*self.0;
        let mut s = f.debug_struct("Node");
        s.field("kind", &data.kind);
        if let Some(key) = &data.key {
            s.field("key", key);
        }
        if !data.props.is_empty() {
            s.field("props", &data.props);
        }
        if !data.events.is_empty() {
            s.field("events", &data.events.keys().collect::<Vec<_>>());
        }
        if !data.slots.is_empty() {
            s.field("slots", &data.slots);
        }
        if !data.children.is_empty() {
            s.field("children", &data.children);
        }
        s.finish()
    }
}

// =============================================================================
// NodeBuilder
// =============================================================================

/// Collects node parts; [`NodeBuilder::build`] validates and freezes them.
#[must_use]
pub struct NodeBuilder {
    kind: NodeKind,
    key: Option<String>,
    props: PropMap,
    events: Vec<(String, Handler)>,
    slots: Vec<(String, Node)>,
    children: Vec<Node>,
}

impl NodeBuilder {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            key: None,
            props: PropMap::new(),
            events: Vec::new(),
            slots: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.set(name, value);
        self
    }

    /// Merge a whole property bag (later values win).
    pub fn props(mut self, props: PropMap) -> Self {
        for (name, value) in props.iter() {
            self.props.set(name, value.clone());
        }
        self
    }

    pub fn on(mut self, event: impl Into<String>, handler: Handler) -> Self {
        self.events.push((event.into(), handler));
        self
    }

    /// Stable identity for a component reference across reorders.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Named content for the child a component reference produces.
    pub fn slot(mut self, name: impl Into<String>, content: Node) -> Self {
        self.slots.push((name.into(), content));
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Shorthand for `.child(Node::text(content))`.
    pub fn text(self, content: impl Into<String>) -> Self {
        self.child(Node::text(content))
    }

    /// Validate and freeze the node.
    pub fn build(self) -> Result<Node, InvalidNodeError> {
        let label = self.kind.label().to_string();

        match &self.kind {
            NodeKind::Element(tag) if tag.is_empty() => return Err(InvalidNodeError::EmptyIdentity),
            NodeKind::Component(name) if name.is_empty() => {
                return Err(InvalidNodeError::EmptyIdentity);
            }
            NodeKind::Text(_) if !self.children.is_empty() => {
                return Err(InvalidNodeError::TextWithChildren);
            }
            NodeKind::Component(_) if !self.children.is_empty() => {
                return Err(InvalidNodeError::ComponentWithChildren { node: label });
            }
            _ => {}
        }

        if let Some(key) = &self.key {
            if self.kind.is_plain() {
                return Err(InvalidNodeError::KeyOnPlainNode { node: label, key: key.clone() });
            }
        }

        let mut seen = HashSet::new();
        let mut events = BTreeMap::new();
        for (event, handler) in self.events {
            if !seen.insert(event.clone()) {
                return Err(InvalidNodeError::DuplicateEvent { node: label, event });
            }
            events.insert(event, handler);
        }

        let mut slots = Slots::new();
        for (slot, content) in self.slots {
            if self.kind.is_plain() {
                return Err(InvalidNodeError::SlotOnPlainNode { node: label, slot });
            }
            if !content.component_refs().is_empty() {
                return Err(InvalidNodeError::ComponentInSlot { node: label, slot });
            }
            if slots.contains_key(&slot) {
                return Err(InvalidNodeError::DuplicateSlot { node: label, slot });
            }
            slots.insert(slot, content);
        }

        Ok(Node(Rc::new(NodeData {
            kind: self.kind,
            key: self.key,
            props: self.props,
            events,
            slots,
            children: self.children,
        })))
    }
}

// =============================================================================
// Tests
// =============================================================================
