//! # spark-compose
//!
//! Component instantiation and tree-composition core.
//!
//! Turns a root component definition plus initial props into a live tree of
//! instances, asks a platform adapter to realize each instance's plain output,
//! and re-composes subtrees when props or state change.
//!
//! ## Architecture
//!
//! ```text
//! Definition ──render(props, state, emit)──▶ Node tree
//!      ▲                                       │
//!      │ registry lookup                       │ component refs → child instances
//!      │                                       ▼ plain nodes    → PlatformAdapter
//! Instance (engine arena) ◀── reconcile by (position | key, definition identity)
//! ```
//!
//! Passes are synchronous and single-threaded. State changes requested by
//! event handlers are queued and drained in order after the handler chain
//! returns, one composition pass per request.
//!
//! No reactivity, no DOM diffing, no template compiler: definitions render
//! explicit node trees and the adapter decides how much to rebuild.
//!
//! ## Modules
//!
//! - [`types`] - Values, props/state maps, instance handles
//! - [`node`] - Immutable output nodes and their builder
//! - [`definition`] - Component definitions and the render-time emitter
//! - [`event`] - Handlers and the context they run in
//! - [`engine`] - Instance tree, composition passes, pass queue, mounting
//! - [`adapter`] - Platform adapter trait and a markup reference adapter
//!
//! ## Tracing
//!
//! Everything is logged through [`tracing`]. The library never installs a
//! subscriber; hosts pick their own.

pub mod adapter;
pub mod definition;
pub mod engine;
pub mod error;
pub mod event;
pub mod node;
pub mod types;

pub use types::*;

pub use adapter::{to_markup, PlatformAdapter, TextAdapter, TextSurface};
pub use definition::{Definition, DefinitionBuilder, Emitter};
pub use engine::{Engine, EngineConfig, Instance, InstanceFlags};
pub use error::{ComposeError, DefinitionError, InvalidNodeError, Result};
pub use event::{EventContext, Handler, Mutator};
pub use node::{Node, NodeBuilder, NodeKind, NodePath, Slots};
