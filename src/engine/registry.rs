//! Instance Registry - slot allocation for the instance arena.
//!
//! Manages the lifecycle of instance slots:
//! - Free slot pool for O(1) reuse
//! - Generation per slot so stale handles never alias a reused slot
//! - Live count for leak checks

use crate::types::InstanceId;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational arena. The engine owns every instance through this.
pub(crate) struct Registry<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    live: usize,
}

impl<T> Registry<T> {
    pub(crate) fn new() -> Self {
        Self { slots: Vec::new(), free: Vec::new(), live: 0 }
    }

    /// Allocate a slot, building the value with the id it will live under.
    pub(crate) fn allocate(&mut self, make: impl FnOnce(InstanceId) -> T) -> InstanceId {
        // Reuse free slot or grow
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot { generation: 0, value: None });
                self.slots.len() - 1
            }
        };

        let slot = &mut self.slots[index];
        let id = InstanceId::new(index, slot.generation);
        slot.value = Some(make(id));
        self.live += 1;
        id
    }

    /// Free a slot, returning its value. Bumps the generation.
    pub(crate) fn release(&mut self, id: InstanceId) -> Option<T> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(value)
    }

    pub(crate) fn get(&self, id: InstanceId) -> Option<&T> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: InstanceId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub(crate) fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live values.
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    /// Slots ever allocated (live + free).
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}
