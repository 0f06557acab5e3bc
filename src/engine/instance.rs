//! Instance - runtime binding of a definition to one tree position.
//!
//! ```text
//! Instance 0: App      (parent=None, children=[1, 2], realized=<div>)
//! Instance 1: Counter  (parent=0,    children=[],     realized=<button>)
//! Instance 2: Counter  (parent=0,    children=[],     realized=<button>)
//! ```
//!
//! The parent exclusively owns its children through `children`; `parent` is
//! a plain handle used only to route emits upward.

use std::rc::Rc;

use crate::definition::Definition;
use crate::node::{Node, Slots};
use crate::types::{InstanceId, Props, State};

// =============================================================================
// Lifecycle Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Lifecycle state of one instance.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InstanceFlags: u8 {
        /// At least one composition pass completed.
        const RENDERED = 1 << 0;
        /// Bound to a mount target.
        const ROOT = 1 << 1;
        /// Created with an explicit parent, outside that parent's reconciliation.
        const DETACHED = 1 << 2;
    }
}

// =============================================================================
// Child Slots
// =============================================================================

/// How a child is matched across passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SlotKey {
    /// Index among the parent's component references, pre-order.
    Position(usize),
    /// Explicit key on the component reference.
    Keyed(String),
}

/// One component reference in the parent's current output.
#[derive(Debug, Clone)]
pub(crate) struct ChildSlot {
    pub(crate) key: SlotKey,
    pub(crate) definition: Rc<Definition>,
    /// `None` when creation failed; the next pass retries.
    pub(crate) instance: Option<InstanceId>,
    /// Index of the reference in `output.component_refs()`.
    pub(crate) position: usize,
}

// =============================================================================
// Instance
// =============================================================================

/// Live component instance. `H` is the platform adapter's handle type.
#[derive(Debug)]
pub struct Instance<H> {
    pub(crate) id: InstanceId,
    pub(crate) definition: Rc<Definition>,
    pub(crate) props: Props,
    pub(crate) slots: Slots,
    pub(crate) state: State,
    pub(crate) output: Option<Node>,
    pub(crate) realized: Option<H>,
    pub(crate) parent: Option<InstanceId>,
    pub(crate) children: Vec<ChildSlot>,
    pub(crate) detached: Vec<InstanceId>,
    pub(crate) flags: InstanceFlags,
    pub(crate) render_count: usize,
}

impl<H> Instance<H> {
    pub(crate) fn new(
        id: InstanceId,
        definition: Rc<Definition>,
        props: Props,
        slots: Slots,
        state: State,
        parent: Option<InstanceId>,
    ) -> Self {
        Self {
            id,
            definition,
            props,
            slots,
            state,
            output: None,
            realized: None,
            parent,
            children: Vec::new(),
            detached: Vec::new(),
            flags: InstanceFlags::empty(),
            render_count: 0,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn definition(&self) -> &Rc<Definition> {
        &self.definition
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Slot content from the parent's component reference.
    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Output of the last successful render step.
    pub fn output(&self) -> Option<&Node> {
        self.output.as_ref()
    }

    /// Adapter handle, present when the output root is a plain node.
    pub fn realized(&self) -> Option<&H> {
        self.realized.as_ref()
    }

    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    /// Child instances in position order.
    pub fn children(&self) -> Vec<InstanceId> {
        self.children.iter().filter_map(|slot| slot.instance).collect()
    }

    /// Child created for the `position`-th component reference of the output.
    pub fn child_at(&self, position: usize) -> Option<InstanceId> {
        self.children
            .iter()
            .find(|slot| slot.position == position)
            .and_then(|slot| slot.instance)
    }

    /// Instances created with this one as explicit parent.
    pub fn detached_children(&self) -> &[InstanceId] {
        &self.detached
    }

    pub fn flags(&self) -> InstanceFlags {
        self.flags
    }

    /// Completed composition passes.
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    /// Every owned instance: reconciled children first, then detached ones.
    pub(crate) fn owned(&self) -> Vec<InstanceId> {
        let mut owned = self.children();
        owned.extend_from_slice(&self.detached);
        owned
    }
}
