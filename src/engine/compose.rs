//! Composition pass and instance operations.
//!
//! `create`, `update`, `set_state` and `destroy` all funnel into two internal
//! routines: [`Engine::compose`] (one pass over one instance, recursing into
//! kept children) and [`Engine::destroy_subtree`] (post-order teardown).

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::instance::{ChildSlot, Instance, InstanceFlags, SlotKey};
use super::{use_after_destroy, Engine};
use crate::adapter::PlatformAdapter;
use crate::definition::Definition;
use crate::error::{ComposeError, InvalidNodeError, Result};
use crate::event::Mutator;
use crate::node::{Node, Slots};
use crate::types::{InstanceId, Props, State};

/// What a pass changes before it renders.
pub(super) enum Next {
    Current,
    Props(Props),
    /// Props and slot content from the parent's component reference.
    Child(Props, Slots),
    State(Mutator),
}

/// How child failures are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Mode {
    /// Any failure aborts and tears down what this pass created (`create`).
    Strict,
    /// Failing children keep their previous tree; the pass still commits.
    FailSafe,
}

/// A resolved component reference from the new output.
struct PlannedChild {
    key: SlotKey,
    definition: Rc<Definition>,
    props: Props,
    slots: Slots,
    position: usize,
}

// =============================================================================
// Public Operations
// =============================================================================

impl<A: PlatformAdapter> Engine<A> {
    /// Create and fully realize a new instance.
    ///
    /// With `Some(parent)`, the instance is owned by `parent` outside its
    /// reconciliation: it receives no props from the parent's output, its
    /// emits are unbound, and it is destroyed with the parent.
    ///
    /// All-or-nothing: on failure every instance created by this call has
    /// been destroyed again and nothing stays realized.
    pub fn create(
        &mut self,
        definition: Rc<Definition>,
        props: Props,
        parent: Option<InstanceId>,
    ) -> Result<InstanceId> {
        if let Some(parent) = parent {
            self.instance(parent)?;
        }

        let id = self.create_subtree(definition, props, Slots::new(), parent)?;

        if let Some(parent) = parent {
            if let Some(inst) = self.registry.get_mut(id) {
                inst.flags |= InstanceFlags::DETACHED;
            }
            if let Some(owner) = self.registry.get_mut(parent) {
                owner.detached.push(id);
            }
        }
        Ok(id)
    }

    /// Replace props and re-run this instance's composition pass.
    pub fn update(&mut self, id: InstanceId, props: Props) -> Result<()> {
        self.compose(id, Next::Props(props), Mode::FailSafe)
    }

    /// Queue a state transition for `id` and drain the pass queue.
    ///
    /// The transition is applied to a copy of the state; the copy is kept only
    /// if the resulting render resolves.
    pub fn set_state(
        &mut self,
        id: InstanceId,
        mutator: impl FnOnce(&mut State) + 'static,
    ) -> Result<()> {
        if !self.registry.contains(id) {
            return Err(use_after_destroy(id));
        }
        self.queue.push(id, Box::new(mutator))?;
        self.flush()
    }

    /// Destroy an instance and everything it owns, children first.
    ///
    /// A second call on the same handle fails with `UseAfterDestroy`.
    pub fn destroy(&mut self, id: InstanceId) -> Result<()> {
        let inst = self.instance(id)?;
        let parent = inst.parent;

        if inst.flags.contains(InstanceFlags::ROOT) {
            self.targets.retain(|_, root| *root != id);
        }

        // Clear the owner's slot so its next pass recreates the child
        if let Some(owner) = parent.and_then(|p| self.registry.get_mut(p)) {
            for slot in &mut owner.children {
                if slot.instance == Some(id) {
                    slot.instance = None;
                }
            }
            owner.detached.retain(|d| *d != id);
        }

        self.destroy_subtree(id);
        Ok(())
    }

    /// Fully expanded output: component references replaced by what their
    /// instances currently render, recursively.
    pub fn resolve(&self, id: InstanceId) -> Result<Node> {
        let inst = self.instance(id)?;
        let output = inst
            .output
            .as_ref()
            .ok_or_else(|| ComposeError::InvalidPath { instance: id, path: Vec::new() })?;
        let mut position = 0;
        Ok(self.expand(inst, output, &mut position))
    }

    fn expand(&self, inst: &Instance<A::Handle>, node: &Node, position: &mut usize) -> Node {
        if node.is_component() {
            let at = *position;
            *position += 1;
            return inst
                .child_at(at)
                .and_then(|child| self.registry.get(child))
                .and_then(|child| {
                    let output = child.output.as_ref()?;
                    let mut inner = 0;
                    Some(self.expand(child, output, &mut inner))
                })
                .unwrap_or_else(|| node.clone());
        }
        if node.children().is_empty() {
            return node.clone();
        }
        let children = node.children().iter().map(|c| self.expand(inst, c, position)).collect();
        node.with_children(children)
    }
}

// =============================================================================
// Composition Pass
// =============================================================================

impl<A: PlatformAdapter> Engine<A> {
    pub(super) fn create_subtree(
        &mut self,
        definition: Rc<Definition>,
        props: Props,
        slots: Slots,
        parent: Option<InstanceId>,
    ) -> Result<InstanceId> {
        let state = definition.initialize_state(&props);
        let def = Rc::clone(&definition);
        let id = self
            .registry
            .allocate(|id| Instance::new(id, definition, props, slots, state, parent));
        debug!(instance = %id, definition = def.name(), "creating instance");

        if let Err(err) = self.compose(id, Next::Current, Mode::Strict) {
            self.destroy_subtree(id);
            return Err(err);
        }
        Ok(id)
    }

    /// One composition pass for `id`.
    pub(super) fn compose(&mut self, id: InstanceId, next: Next, mode: Mode) -> Result<()> {
        // 1. RENDER + RESOLVE - nothing is mutated until both succeed
        let (output, plan, new_props, new_slots, new_state) = {
            let inst = self.instance(id)?;
            let definition = Rc::clone(&inst.definition);
            let (new_props, new_slots, new_state) = match next {
                Next::Current => (None, None, None),
                Next::Props(props) => (Some(props), None, None),
                Next::Child(props, slots) => (Some(props), Some(slots), None),
                Next::State(mutator) => {
                    let mut state = inst.state.clone();
                    mutator(&mut state);
                    (None, None, Some(state))
                }
            };
            let props = new_props.as_ref().unwrap_or(&inst.props);
            let slots = new_slots.as_ref().unwrap_or(&inst.slots);
            let state = new_state.as_ref().unwrap_or(&inst.state);

            let output = definition.render(props, state, slots).inspect_err(|err| {
                warn!(instance = %id, definition = definition.name(), %err, "render rejected");
            })?;
            let plan = plan_children(&definition, &output).inspect_err(|err| {
                warn!(instance = %id, definition = definition.name(), %err, "pass aborted");
            })?;
            (output, plan, new_props, new_slots, new_state)
        };

        // 2. COMMIT INPUTS
        let old_slots = {
            let inst = self.instance_mut(id)?;
            if let Some(props) = new_props {
                inst.props = props;
            }
            if let Some(slots) = new_slots {
                inst.slots = slots;
            }
            if let Some(state) = new_state {
                inst.state = state;
            }
            std::mem::take(&mut inst.children)
        };

        // 3. RECONCILE CHILDREN
        let (slots, child_error) = self.reconcile(id, old_slots, plan, mode)?;

        // 4. REALIZE + COMMIT OUTPUT
        let inst = self.registry.get_mut(id).ok_or_else(|| use_after_destroy(id))?;
        let previous = inst.output.take();
        let handle = inst.realized.take();

        inst.realized = if output.kind().is_plain() {
            Some(match (handle, &previous) {
                (Some(handle), Some(old)) if self.config.skip_identical_updates && *old == output => {
                    handle
                }
                (Some(handle), Some(old)) => self.adapter.update(handle, old, &output),
                (Some(handle), None) => {
                    self.adapter.release(handle);
                    self.adapter.realize(&output)
                }
                (None, _) => self.adapter.realize(&output),
            })
        } else {
            if let Some(handle) = handle {
                self.adapter.release(handle);
            }
            None
        };

        inst.output = Some(output);
        inst.children = slots;
        inst.flags |= InstanceFlags::RENDERED;
        inst.render_count += 1;
        trace!(
            instance = %id,
            definition = inst.definition.name(),
            passes = inst.render_count,
            "pass complete"
        );

        match child_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Match the new component references against the previous children.
    fn reconcile(
        &mut self,
        parent: InstanceId,
        old_slots: Vec<ChildSlot>,
        plan: Vec<PlannedChild>,
        mode: Mode,
    ) -> Result<(Vec<ChildSlot>, Option<ComposeError>)> {
        let index: HashMap<SlotKey, usize> = old_slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.key.clone(), i))
            .collect();
        let mut old: Vec<Option<ChildSlot>> = old_slots.into_iter().map(Some).collect();

        let mut slots: Vec<ChildSlot> = Vec::with_capacity(plan.len());
        let mut first_error = None;

        for planned in plan {
            let previous = index.get(&planned.key).and_then(|&i| old[i].take());

            let kept = match previous {
                Some(prev)
                    if prev.instance.is_some()
                        && Definition::same(&prev.definition, &planned.definition) =>
                {
                    prev.instance
                }
                Some(prev) => {
                    if let Some(stale) = prev.instance {
                        // The stale child stays until its replacement is known to compose
                        if let Err(err) =
                            preflight(&planned.definition, &planned.props, &planned.slots)
                        {
                            warn!(
                                parent = %parent,
                                stale = %stale,
                                to = planned.definition.name(),
                                %err,
                                "replacement rejected, previous child kept"
                            );
                            if first_error.is_none() {
                                first_error = Some(err);
                            }
                            slots.push(ChildSlot { position: planned.position, ..prev });
                            continue;
                        }
                        debug!(
                            parent = %parent,
                            stale = %stale,
                            from = prev.definition.name(),
                            to = planned.definition.name(),
                            "replacing child"
                        );
                        self.destroy_subtree(stale);
                    }
                    None
                }
                None => None,
            };

            let instance = match kept {
                Some(child) => {
                    let next = Next::Child(planned.props, planned.slots);
                    if let Err(err) = self.compose(child, next, Mode::FailSafe) {
                        warn!(parent = %parent, child = %child, %err, "child kept its previous tree");
                        if first_error.is_none() {
                            first_error = Some(err);
                        }
                    }
                    Some(child)
                }
                None => {
                    let created = self.create_subtree(
                        Rc::clone(&planned.definition),
                        planned.props,
                        planned.slots,
                        Some(parent),
                    );
                    match created {
                        Ok(child) => Some(child),
                        Err(err) if mode == Mode::Strict => {
                            for slot in &slots {
                                if let Some(child) = slot.instance {
                                    self.destroy_subtree(child);
                                }
                            }
                            return Err(err);
                        }
                        Err(err) => {
                            warn!(
                                parent = %parent,
                                definition = planned.definition.name(),
                                %err,
                                "child creation failed, slot left empty"
                            );
                            if first_error.is_none() {
                                first_error = Some(err);
                            }
                            None
                        }
                    }
                }
            };

            slots.push(ChildSlot {
                key: planned.key,
                definition: planned.definition,
                instance,
                position: planned.position,
            });
        }

        // Previous children with no counterpart
        for stale in old.into_iter().flatten() {
            if let Some(child) = stale.instance {
                self.destroy_subtree(child);
            }
        }

        Ok((slots, first_error))
    }

    /// Post-order teardown: owned instances first, then release self.
    pub(super) fn destroy_subtree(&mut self, id: InstanceId) {
        let Some(owned) = self.registry.get(id).map(Instance::owned) else {
            return;
        };

        for child in owned {
            self.destroy_subtree(child);
        }

        if let Some(inst) = self.registry.release(id) {
            if let Some(handle) = inst.realized {
                self.adapter.release(handle);
            }
            debug!(instance = %id, definition = inst.definition.name(), "destroyed instance");
        }
    }
}

/// Resolve every component reference in `output` against the registry.
fn plan_children(definition: &Definition, output: &Node) -> Result<Vec<PlannedChild>> {
    let mut keys = HashSet::new();
    output
        .component_refs()
        .into_iter()
        .enumerate()
        .map(|(position, node)| {
            let name = node.component_name().unwrap_or_default();
            let resolved = definition.resolve(name).cloned().ok_or_else(|| {
                ComposeError::DefinitionResolution {
                    definition: definition.name().to_string(),
                    name: name.to_string(),
                }
            })?;

            let key = match node.key() {
                Some(key) => {
                    if !keys.insert(key) {
                        return Err(InvalidNodeError::DuplicateKey { key: key.to_string() }.into());
                    }
                    SlotKey::Keyed(key.to_string())
                }
                None => SlotKey::Position(position),
            };

            Ok(PlannedChild {
                key,
                definition: resolved,
                props: node.props().clone(),
                slots: node.slots().clone(),
                position,
            })
        })
        .collect()
}

/// Render and resolve the subtree `definition` would create, without
/// creating anything.
fn preflight(definition: &Definition, props: &Props, slots: &Slots) -> Result<()> {
    let state = definition.initialize_state(props);
    let output = definition.render(props, &state, slots)?;
    for child in plan_children(definition, &output)? {
        preflight(&child.definition, &child.props, &child.slots)?;
    }
    Ok(())
}
