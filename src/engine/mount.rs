//! Mount API - root lifecycle.
//!
//! The engine is the entry and exit point for hosts: it binds one root
//! instance per platform target and tears the root down on unmount.
//!
//! # Example
//!
//! ```ignore
//! let mut engine = Engine::new(TextAdapter::new());
//! let root = engine.mount(&app, Props::new(), "#app".to_string())?;
//! // ... dispatch events, update props ...
//! engine.unmount(root)?;
//! ```

use std::rc::Rc;

use tracing::{info, instrument};

use super::instance::InstanceFlags;
use super::{use_after_destroy, Engine};
use crate::adapter::PlatformAdapter;
use crate::definition::Definition;
use crate::error::{ComposeError, Result};
use crate::types::{InstanceId, Props};

impl<A: PlatformAdapter> Engine<A> {
    /// Create a root instance and bind it to `target`.
    ///
    /// Fails with `MountTarget` if `target` already has a root; nothing is
    /// created in that case.
    #[instrument(skip_all, fields(definition = definition.name(), target = ?target))]
    pub fn mount(
        &mut self,
        definition: &Rc<Definition>,
        props: Props,
        target: A::Target,
    ) -> Result<InstanceId> {
        if self.targets.contains_key(&target) {
            return Err(ComposeError::MountTarget { target: format!("{target:?}") });
        }

        let id = self.create(Rc::clone(definition), props, None)?;
        if let Some(inst) = self.registry.get_mut(id) {
            inst.flags |= InstanceFlags::ROOT;
        }
        self.targets.insert(target, id);
        info!(instance = %id, "mounted");
        Ok(id)
    }

    /// Destroy a mounted root and free its target.
    pub fn unmount(&mut self, id: InstanceId) -> Result<()> {
        let Some(inst) = self.registry.get(id) else {
            return Err(use_after_destroy(id));
        };
        if !inst.flags.contains(InstanceFlags::ROOT) {
            return Err(ComposeError::NotMounted(id));
        }

        self.destroy(id)?;
        info!(instance = %id, "unmounted");
        Ok(())
    }

    /// Root currently bound to `target`.
    pub fn root_at(&self, target: &A::Target) -> Option<InstanceId> {
        self.targets.get(target).copied()
    }
}
