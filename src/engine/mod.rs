//! Composition Engine - instance tree, passes, events and mounting.
//!
//! The engine owns everything mutable:
//! - Registry: generational arena holding every live [`Instance`]
//! - Pass queue: FIFO of state transitions waiting for a composition pass
//! - Targets: which mount target each root is bound to
//! - The platform adapter realizing plain output nodes
//!
//! # Composition pass
//!
//! ```text
//! render(props, state, emit) → Output Node tree
//!   → resolve every component reference against the definition's registry
//!   → reconcile children by (position | key, definition identity)
//!        same definition   → keep instance, update(props)
//!        new / different   → destroy stale, create fresh
//!        gone              → destroy
//!   → realize-or-update the plain output through the adapter
//!   → commit output + children
//! ```
//!
//! Rendering and name resolution happen before anything is touched, so a pass
//! that fails there leaves the previous tree, state and realization intact.
//!
//! # Example
//!
//! ```ignore
//! let mut engine = Engine::new(TextAdapter::new());
//! let root = engine.mount(&app, Props::new(), "#app".to_string())?;
//!
//! engine.dispatch(root, &[0], "click", Value::Null)?;
//! println!("{}", to_markup(&engine.resolve(root)?));
//!
//! engine.unmount(root)?;
//! ```

mod compose;
mod config;
mod events;
mod instance;
mod mount;
mod queue;
mod registry;

pub use config::EngineConfig;
pub use instance::{Instance, InstanceFlags};

use std::collections::HashMap;

use tracing::error;

use crate::adapter::PlatformAdapter;
use crate::error::{ComposeError, Result};
use crate::types::InstanceId;
use queue::PassQueue;
use registry::Registry;

// =============================================================================
// Engine
// =============================================================================

/// Owner of the instance tree and entry point for hosts.
pub struct Engine<A: PlatformAdapter> {
    adapter: A,
    config: EngineConfig,
    registry: Registry<Instance<A::Handle>>,
    queue: PassQueue,
    targets: HashMap<A::Target, InstanceId>,
}

impl<A: PlatformAdapter> Engine<A> {
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, EngineConfig::default())
    }

    pub fn with_config(adapter: A, config: EngineConfig) -> Self {
        Self {
            adapter,
            queue: PassQueue::new(config.max_pending_passes),
            config,
            registry: Registry::new(),
            targets: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// Look up a live instance.
    ///
    /// A destroyed handle is a programming error: it is logged and returned
    /// as [`ComposeError::UseAfterDestroy`].
    pub fn instance(&self, id: InstanceId) -> Result<&Instance<A::Handle>> {
        self.registry.get(id).ok_or_else(|| use_after_destroy(id))
    }

    /// Whether `id` still names a live instance. Never logs.
    pub fn is_alive(&self, id: InstanceId) -> bool {
        self.registry.contains(id)
    }

    /// Number of live instances, across all roots and detached trees.
    pub fn live_instances(&self) -> usize {
        self.registry.len()
    }

    /// State passes queued and not yet run.
    pub fn pending_passes(&self) -> usize {
        self.queue.len()
    }

    /// Mounted roots with their targets.
    pub fn roots(&self) -> impl Iterator<Item = (&A::Target, InstanceId)> {
        self.targets.iter().map(|(target, id)| (target, *id))
    }

    fn instance_mut(&mut self, id: InstanceId) -> Result<&mut Instance<A::Handle>> {
        self.registry.get_mut(id).ok_or_else(|| use_after_destroy(id))
    }
}

impl<A: PlatformAdapter + std::fmt::Debug> std::fmt::Debug for Engine<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("adapter", &self.adapter)
            .field("config", &self.config)
            .field("live_instances", &self.registry.len())
            .field("slots", &self.registry.capacity())
            .field("pending_passes", &self.queue.len())
            .field("roots", &self.targets.len())
            .finish()
    }
}

pub(crate) fn use_after_destroy(id: InstanceId) -> ComposeError {
    error!(instance = %id, "operation on destroyed instance");
    ComposeError::UseAfterDestroy(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::TextAdapter;
    use crate::definition::Definition;
    use crate::node::Node;
    use crate::types::Props;
    use std::rc::Rc;

    fn leaf(tag: &'static str) -> Rc<Definition> {
        Definition::builder(tag)
            .render(move |_, _, _| Node::element(tag).build())
            .build()
            .unwrap()
    }

    #[test]
    fn test_stale_handle_never_aliases() {
        let mut engine = Engine::new(TextAdapter::new());
        let first = engine.create(leaf("a"), Props::new(), None).unwrap();
        engine.destroy(first).unwrap();

        let second = engine.create(leaf("b"), Props::new(), None).unwrap();
        assert_eq!(second.index(), first.index());
        assert!(!engine.is_alive(first));
        assert_eq!(engine.instance(second).unwrap().definition().name(), "b");
    }

    #[test]
    fn test_flags_and_roots() {
        let mut engine = Engine::new(TextAdapter::new());
        let root = engine.mount(&leaf("a"), Props::new(), "#a".to_string()).unwrap();
        let free = engine.create(leaf("b"), Props::new(), None).unwrap();

        let flags = engine.instance(root).unwrap().flags();
        assert_eq!(flags, InstanceFlags::RENDERED | InstanceFlags::ROOT);
        assert_eq!(engine.instance(free).unwrap().flags(), InstanceFlags::RENDERED);

        let roots: Vec<_> = engine.roots().collect();
        assert_eq!(roots, [(&"#a".to_string(), root)]);
    }

    #[test]
    fn test_destroyed_child_leaves_empty_slot() {
        let parent = Definition::builder("Parent")
            .render(|props, _, _| {
                let name = if props.get_str("mode") == "bad" { "Missing" } else { "Leaf" };
                Node::element("div").child(Node::component(name).build()?).build()
            })
            .child("Leaf", leaf("p"))
            .build()
            .unwrap();

        let mut engine = Engine::new(TextAdapter::new());
        let id = engine.create(parent, Props::new(), None).unwrap();
        let child = engine.instance(id).unwrap().child_at(0).unwrap();

        // Resolution happens before commit, so the whole pass is rejected
        assert!(engine.update(id, Props::new().with("mode", "bad")).is_err());
        assert_eq!(engine.instance(id).unwrap().child_at(0), Some(child));

        engine.destroy(child).unwrap();
        let slots = &engine.registry.get(id).unwrap().children;
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].instance, None);
        assert_eq!(slots[0].key, instance::SlotKey::Position(0));
    }

    #[test]
    fn test_queue_bound_comes_from_config() {
        let engine = Engine::with_config(
            TextAdapter::new(),
            EngineConfig::default().max_pending_passes(4),
        );
        assert_eq!(engine.config().max_pending_passes, 4);
        assert_eq!(engine.pending_passes(), 0);
        assert_eq!(engine.live_instances(), 0);
    }
}
