//! Text Adapter - realizes output nodes into markup strings.
//!
//! Useful for tests, snapshots and headless hosts. Component references
//! render as `<Name/>` placeholders; render [`Engine::resolve`] output with
//! [`to_markup`] to see the fully composed tree.
//!
//! [`Engine::resolve`]: crate::engine::Engine::resolve

use std::collections::HashSet;

use super::PlatformAdapter;
use crate::node::{Node, NodeKind};

/// One realized surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSurface {
    pub id: usize,
    pub markup: String,
}

/// Markup-producing adapter with call counters.
#[derive(Debug, Default)]
pub struct TextAdapter {
    next_id: usize,
    live: HashSet<usize>,
    realized: usize,
    updated: usize,
    released: usize,
}

impl TextAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surfaces realized and not yet released.
    pub fn live_surfaces(&self) -> usize {
        self.live.len()
    }

    pub fn realize_count(&self) -> usize {
        self.realized
    }

    pub fn update_count(&self) -> usize {
        self.updated
    }

    pub fn release_count(&self) -> usize {
        self.released
    }
}

impl PlatformAdapter for TextAdapter {
    type Handle = TextSurface;
    type Target = String;

    fn realize(&mut self, node: &Node) -> TextSurface {
        let id = self.next_id;
        self.next_id += 1;
        self.realized += 1;
        self.live.insert(id);
        TextSurface { id, markup: to_markup(node) }
    }

    fn update(&mut self, mut existing: TextSurface, old: &Node, new: &Node) -> TextSurface {
        self.updated += 1;
        if old != new {
            existing.markup = to_markup(new);
        }
        existing
    }

    fn release(&mut self, existing: TextSurface) {
        self.released += 1;
        self.live.remove(&existing.id);
    }
}

// =============================================================================
// Markup
// =============================================================================

/// Render a node tree as markup.
///
/// Properties are written in name order, text is escaped, events are omitted.
pub fn to_markup(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node.kind() {
        NodeKind::Text(content) => escape_into(content, out),
        NodeKind::Component(name) => {
            out.push('<');
            out.push_str(name);
            write_props(node, out);
            out.push_str("/>");
        }
        NodeKind::Element(tag) => {
            out.push('<');
            out.push_str(tag);
            write_props(node, out);
            out.push('>');
            for child in node.children() {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn write_props(node: &Node, out: &mut String) {
    for (name, value) in node.props().iter() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(&value.to_string(), out);
        out.push('"');
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}
