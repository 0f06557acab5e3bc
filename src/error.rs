//! Error taxonomy for composition.
//!
//! - [`InvalidNodeError`] - malformed Output Node, rejected at construction
//! - [`DefinitionError`] - malformed Component Definition, rejected at `build()`
//! - [`ComposeError`] - everything an engine operation can fail with

use thiserror::Error;

use crate::types::InstanceId;

/// An Output Node was rejected at construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidNodeError {
    #[error("duplicate event binding '{event}' on <{node}>")]
    DuplicateEvent { node: String, event: String },

    #[error("text node cannot have children")]
    TextWithChildren,

    #[error("component reference <{node}> cannot have children")]
    ComponentWithChildren { node: String },

    #[error("node identity cannot be empty")]
    EmptyIdentity,

    #[error("key '{key}' set on <{node}>, only component references can be keyed")]
    KeyOnPlainNode { node: String, key: String },

    #[error("slot '{slot}' set on <{node}>, only component references take slots")]
    SlotOnPlainNode { node: String, slot: String },

    #[error("slot '{slot}' on <{node}> contains a component reference")]
    ComponentInSlot { node: String, slot: String },

    #[error("duplicate slot '{slot}' on <{node}>")]
    DuplicateSlot { node: String, slot: String },

    #[error("duplicate component key '{key}' in one render output")]
    DuplicateKey { key: String },
}

/// A Component Definition was rejected at `build()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("definition '{0}' has no render step")]
    MissingRender(String),

    #[error("definition '{definition}' registers child '{name}' twice")]
    DuplicateChild { definition: String, name: String },
}

/// Failure of an engine operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error(transparent)]
    InvalidNode(#[from] InvalidNodeError),

    #[error("definition '{definition}' renders unregistered child '{name}'")]
    DefinitionResolution { definition: String, name: String },

    #[error("instance {0} has been destroyed")]
    UseAfterDestroy(InstanceId),

    #[error("mount target {target} is already bound to another root")]
    MountTarget { target: String },

    #[error("instance {0} is not a mounted root")]
    NotMounted(InstanceId),

    #[error("pass queue is full ({limit} pending passes)")]
    PassQueueFull { limit: usize },

    #[error("no node at path {path:?} in the output of instance {instance}")]
    InvalidPath { instance: InstanceId, path: Vec<usize> },
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, ComposeError>;
