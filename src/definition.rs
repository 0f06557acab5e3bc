//! Component Definition - stateless declarative template.
//!
//! A definition knows how to render given props and state, how to build its
//! initial state, which named handlers it offers its render step, and which
//! child definitions its output may reference by name.
//!
//! The child registry is local to each definition and frozen at `build()`.
//! Children have to exist before the parent is built, so a definition can
//! never (directly or indirectly) register itself.
//!
//! # Example
//!
//! ```ignore
//! let counter = Definition::builder("Counter")
//!     .state(|_props| State::new().with("count", 0))
//!     .handler("increment", Handler::new(|cx, _| {
//!         cx.set_state(|s| { s.set("count", s.get_int("count") + 1); });
//!     }))
//!     .render(|_props, state, emit| {
//!         Node::element("button")
//!             .on("click", emit.handler("increment").unwrap_or_else(|| Handler::new(|_, _| {})))
//!             .text(state.get_int("count").to_string())
//!             .build()
//!     })
//!     .build()?;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{DefinitionError, InvalidNodeError};
use crate::event::Handler;
use crate::node::{Node, Slots};
use crate::types::{Props, State, Value};

/// Render step: pure function of `(props, state)`.
pub type RenderFn = Box<dyn Fn(&Props, &State, &Emitter<'_>) -> Result<Node, InvalidNodeError>>;

/// State initializer, called once per instance.
pub type StateFn = Box<dyn Fn(&Props) -> State>;

// =============================================================================
// Emitter
// =============================================================================

/// Handed to a render step for building the handlers its nodes bind and
/// reading the slot content its parent passed in.
pub struct Emitter<'a> {
    handlers: &'a BTreeMap<String, Handler>,
    slots: &'a Slots,
}

impl Emitter<'_> {
    /// Handler that notifies the parent with `event`, passing the payload through.
    pub fn emit(&self, event: impl Into<String>) -> Handler {
        Handler::forward(event)
    }

    /// Handler that notifies the parent with `event` and a payload derived from the raw one.
    pub fn emit_with(
        &self,
        event: impl Into<String>,
        map: impl Fn(&Value) -> Value + 'static,
    ) -> Handler {
        let event = event.into();
        Handler::new(move |cx, payload| cx.emit(event.clone(), map(payload)))
    }

    /// A handler declared on the definition.
    pub fn handler(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).cloned()
    }

    /// Content the parent passed under `name`, ready to place in the output.
    pub fn slot(&self, name: &str) -> Option<Node> {
        self.slots.get(name).cloned()
    }

    /// Slot content, or `fallback` when the parent passed none.
    pub fn slot_or(&self, name: &str, fallback: Node) -> Node {
        self.slot(name).unwrap_or(fallback)
    }
}

// =============================================================================
// Definition
// =============================================================================

/// Stateless component template. Identity is `Rc` pointer identity.
pub struct Definition {
    name: String,
    render: RenderFn,
    init_state: Option<StateFn>,
    handlers: BTreeMap<String, Handler>,
    registry: BTreeMap<String, Rc<Definition>>,
}

impl Definition {
    pub fn builder(name: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder {
            name: name.into(),
            render: None,
            init_state: None,
            handlers: BTreeMap::new(),
            registry: BTreeMap::new(),
            duplicate: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initial state for a new instance. Empty when no initializer was given.
    pub fn initialize_state(&self, props: &Props) -> State {
        self.init_state.as_ref().map_or_else(State::new, |init| init(props))
    }

    /// Run the render step.
    pub fn render(
        &self,
        props: &Props,
        state: &State,
        slots: &Slots,
    ) -> Result<Node, InvalidNodeError> {
        let emit = Emitter { handlers: &self.handlers, slots };
        (self.render)(props, state, &emit)
    }

    /// Look up a child definition in this definition's registry.
    pub fn resolve(&self, name: &str) -> Option<&Rc<Definition>> {
        self.registry.get(name)
    }

    /// Registered child names, sorted.
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.registry.keys().map(String::as_str)
    }

    /// Definition identity.
    pub fn same(a: &Rc<Definition>, b: &Rc<Definition>) -> bool {
        Rc::ptr_eq(a, b)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("stateful", &self.init_state.is_some())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("registry", &self.registry.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

#[must_use]
pub struct DefinitionBuilder {
    name: String,
    render: Option<RenderFn>,
    init_state: Option<StateFn>,
    handlers: BTreeMap<String, Handler>,
    registry: BTreeMap<String, Rc<Definition>>,
    duplicate: Option<String>,
}

impl DefinitionBuilder {
    pub fn render(
        mut self,
        render: impl Fn(&Props, &State, &Emitter<'_>) -> Result<Node, InvalidNodeError> + 'static,
    ) -> Self {
        self.render = Some(Box::new(render));
        self
    }

    pub fn state(mut self, init: impl Fn(&Props) -> State + 'static) -> Self {
        self.init_state = Some(Box::new(init));
        self
    }

    /// Declare a named handler the render step can bind via [`Emitter::handler`].
    pub fn handler(mut self, name: impl Into<String>, handler: Handler) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    /// Register a child definition under `name`.
    pub fn child(mut self, name: impl Into<String>, definition: Rc<Definition>) -> Self {
        let name = name.into();
        if self.registry.insert(name.clone(), definition).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(name);
        }
        self
    }

    pub fn build(self) -> Result<Rc<Definition>, DefinitionError> {
        if let Some(name) = self.duplicate {
            return Err(DefinitionError::DuplicateChild { definition: self.name, name });
        }
        let Some(render) = self.render else {
            return Err(DefinitionError::MissingRender(self.name));
        };
        Ok(Rc::new(Definition {
            name: self.name,
            render,
            init_state: self.init_state,
            handlers: self.handlers,
            registry: self.registry,
        }))
    }
}

// =============================================================================
// Tests
// =============================================================================
