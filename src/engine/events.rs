//! Event dispatch, emit propagation and queue draining.
//!
//! ```text
//! dispatch(instance, path, "click")
//!   → handler bound on output.at(path), run with the instance's EventContext
//!   → effects applied in order:
//!        SetState → pass queue
//!        Emit     → binding on the parent's component reference → its handler → ...
//!   → flush: drain the pass queue, one pass per entry, FIFO
//! ```
//!
//! Handlers only ever see a settled tree: no pass runs while a handler chain
//! is executing.

use tracing::{debug, trace, warn};

use super::compose::{Mode, Next};
use super::Engine;
use crate::adapter::PlatformAdapter;
use crate::error::{ComposeError, Result};
use crate::event::{Effect, EventContext, Handler};
use crate::node::NodePath;
use crate::types::{InstanceId, Value};

impl<A: PlatformAdapter> Engine<A> {
    /// Fire `event` on the node at `path` in `id`'s current output.
    ///
    /// Unbound events are ignored. Returns the first error from applying the
    /// handler's effects or from the passes they queued.
    pub fn dispatch(
        &mut self,
        id: InstanceId,
        path: &NodePath,
        event: &str,
        payload: impl Into<Value>,
    ) -> Result<()> {
        let payload = payload.into();
        let inst = self.instance(id)?;
        let node = inst
            .output
            .as_ref()
            .and_then(|output| output.at(path))
            .ok_or_else(|| ComposeError::InvalidPath { instance: id, path: path.to_vec() })?;

        let Some(handler) = node.handler(event).cloned() else {
            trace!(instance = %id, event, "no binding");
            return Ok(());
        };
        debug!(instance = %id, event, "dispatch");

        let effects = self.run_handler(id, &handler, &payload);
        let applied = self.apply_effects(effects);
        let flushed = self.flush();
        applied.and(flushed)
    }

    /// Drain the pass queue.
    ///
    /// Every entry gets its own pass, in order. Entries whose instance was
    /// destroyed meanwhile are skipped. Returns the first failure; later ones
    /// are only logged.
    pub fn flush(&mut self) -> Result<()> {
        let mut first_error = None;

        while let Some(pass) = self.queue.pop() {
            if !self.registry.contains(pass.target) {
                debug!(instance = %pass.target, "skipping pass for destroyed instance");
                continue;
            }
            if let Err(err) = self.compose(pass.target, Next::State(pass.mutator), Mode::FailSafe) {
                warn!(instance = %pass.target, %err, "state pass failed");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn run_handler(&self, owner: InstanceId, handler: &Handler, payload: &Value) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(inst) = self.registry.get(owner) {
            let mut cx = EventContext::new(owner, &inst.props, &inst.state, &mut effects);
            handler.call(&mut cx, payload);
        }
        effects
    }

    /// Apply handler effects in order. Emits are handled depth-first, so a
    /// parent's reaction is fully recorded before the next sibling effect.
    fn apply_effects(&mut self, effects: Vec<Effect>) -> Result<()> {
        let mut first_error = None;

        for effect in effects {
            let result = match effect {
                Effect::SetState { target, mutator } => self.queue.push(target, mutator),
                Effect::Emit { from, event, payload } => self.propagate(from, &event, &payload),
            };
            if let Err(err) = result {
                warn!(%err, "event effect dropped");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Run the parent's binding for an emit from `child`.
    fn propagate(&mut self, child: InstanceId, event: &str, payload: &Value) -> Result<()> {
        let Some(parent) = self.registry.get(child).and_then(|inst| inst.parent) else {
            trace!(instance = %child, event, "emit from root dropped");
            return Ok(());
        };

        let binding = self.registry.get(parent).and_then(|owner| {
            let slot = owner.children.iter().find(|slot| slot.instance == Some(child))?;
            let output = owner.output.as_ref()?;
            let reference = output.component_refs().into_iter().nth(slot.position)?;
            reference.handler(event).cloned()
        });

        let Some(handler) = binding else {
            trace!(parent = %parent, child = %child, event, "unbound emit");
            return Ok(());
        };
        debug!(parent = %parent, child = %child, event, "emit");

        let effects = self.run_handler(parent, &handler, payload);
        self.apply_effects(effects)
    }
}
