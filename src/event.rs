//! Event handlers and the context they run in.
//!
//! Handlers never touch the instance tree. Everything they ask for
//! (`set_state`, `emit`) is recorded into an effect list that the engine
//! applies after the handler returns:
//!
//! ```text
//! dispatch(click) → handler(cx) → cx.set_state(..)  → pass queue (FIFO)
//!                               → cx.emit("saved")  → parent's binding handler → ...
//! drain queue: one composition pass per set_state, in order
//! ```

use std::fmt;
use std::rc::Rc;

use crate::types::{InstanceId, Props, State, Value};

/// State transition queued by `set_state`.
pub type Mutator = Box<dyn FnOnce(&mut State)>;

// =============================================================================
// Handler
// =============================================================================

/// Shared event callback bound to a node.
///
/// Rc so the same handler can be bound from several render passes without
/// re-allocating the closure.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&mut EventContext<'_>, &Value)>);

impl Handler {
    pub fn new(f: impl Fn(&mut EventContext<'_>, &Value) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Handler that re-emits the payload to the parent under `event`.
    pub fn forward(event: impl Into<String>) -> Self {
        let event = event.into();
        Self::new(move |cx, payload| cx.emit(event.clone(), payload.clone()))
    }

    pub fn call(&self, cx: &mut EventContext<'_>, payload: &Value) {
        (self.0)(cx, payload);
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

// =============================================================================
// Effects
// =============================================================================

/// Something a handler asked for, applied by the engine afterwards.
pub(crate) enum Effect {
    SetState { target: InstanceId, mutator: Mutator },
    Emit { from: InstanceId, event: String, payload: Value },
}

// =============================================================================
// EventContext
// =============================================================================

/// What a handler can see and request while it runs.
pub struct EventContext<'a> {
    instance: InstanceId,
    props: &'a Props,
    state: &'a State,
    effects: &'a mut Vec<Effect>,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(
        instance: InstanceId,
        props: &'a Props,
        state: &'a State,
        effects: &'a mut Vec<Effect>,
    ) -> Self {
        Self { instance, props, state, effects }
    }

    /// The instance that rendered the node this handler is bound to.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn props(&self) -> &Props {
        self.props
    }

    /// State as of the last settled pass.
    pub fn state(&self) -> &State {
        self.state
    }

    /// Queue a state transition for the owning instance.
    ///
    /// Runs after the current handler chain, one composition pass per call.
    pub fn set_state(&mut self, mutator: impl FnOnce(&mut State) + 'static) {
        self.effects.push(Effect::SetState { target: self.instance, mutator: Box::new(mutator) });
    }

    /// Notify the parent through the binding on this instance's component reference.
    pub fn emit(&mut self, event: impl Into<String>, payload: impl Into<Value>) {
        self.effects.push(Effect::Emit {
            from: self.instance,
            event: event.into(),
            payload: payload.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_records_effects_in_order() {
        let props = Props::new();
        let state = State::new().with("count", 1);
        let mut effects = Vec::new();
        let id = InstanceId::new(0, 0);

        let handler = Handler::new(|cx, payload| {
            assert_eq!(cx.state().get_int("count"), 1);
            cx.set_state(|s| {
                s.set("count", 2);
            });
            cx.emit("changed", payload.clone());
        });

        let mut cx = EventContext::new(id, &props, &state, &mut effects);
        handler.call(&mut cx, &Value::from(5));

        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[0], Effect::SetState { target, .. } if target == id));
        assert!(matches!(
            &effects[1],
            Effect::Emit { event, payload, .. } if event == "changed" && *payload == Value::Int(5)
        ));
    }

    #[test]
    fn test_forward_reemits_payload() {
        let props = Props::new();
        let state = State::new();
        let mut effects = Vec::new();

        let mut cx = EventContext::new(InstanceId::new(1, 0), &props, &state, &mut effects);
        Handler::forward("select").call(&mut cx, &Value::from("row-3"));

        assert!(matches!(
            &effects[0],
            Effect::Emit { event, payload, .. } if event == "select" && payload.as_str() == Some("row-3")
        ));
    }
}
