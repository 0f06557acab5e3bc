//! Platform Adapter - the one collaborator the core consumes.
//!
//! The engine hands plain output nodes to an adapter and gets back an opaque
//! handle it stores on the instance. It never looks inside the handle.
//!
//! ```text
//! first pass        realize(node)               → Handle
//! later passes      update(handle, old, new)    → Handle
//! destroy           release(handle)
//! ```
//!
//! - [`TextAdapter`] - reference adapter that realizes nodes into markup strings

mod text;

pub use text::{to_markup, TextAdapter, TextSurface};

use std::fmt::Debug;
use std::hash::Hash;

use crate::node::Node;

/// Turns output nodes into concrete external representations.
///
/// Only instances whose output root is a plain node are realized. Component
/// references inside a realized tree belong to child instances; adapters may
/// treat them as placeholders.
pub trait PlatformAdapter {
    /// Realized representation owned by one instance.
    type Handle;

    /// Where a root can be mounted. One root per target.
    type Target: Eq + Hash + Clone + Debug;

    fn realize(&mut self, node: &Node) -> Self::Handle;

    /// Bring `existing` from `old` to `new`. How much to rebuild is up to the adapter.
    fn update(&mut self, existing: Self::Handle, old: &Node, new: &Node) -> Self::Handle;

    fn release(&mut self, existing: Self::Handle);
}
