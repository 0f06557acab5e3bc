//! Pass Queue - serialized state passes.
//!
//! Every `set_state` becomes one queued pass. Passes run strictly in the
//! order they were queued, one at a time, after whatever is currently running
//! has finished. A pass whose target was destroyed in the meantime is skipped.

use std::collections::VecDeque;
use std::fmt;

use crate::error::{ComposeError, Result};
use crate::event::Mutator;
use crate::types::InstanceId;

/// One queued state transition.
pub(crate) struct PendingPass {
    pub(crate) target: InstanceId,
    pub(crate) mutator: Mutator,
}

impl fmt::Debug for PendingPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingPass").field("target", &self.target).finish_non_exhaustive()
    }
}

/// Bounded FIFO of pending passes.
#[derive(Debug)]
pub(crate) struct PassQueue {
    items: VecDeque<PendingPass>,
    limit: usize,
}

impl PassQueue {
    pub(crate) fn new(limit: usize) -> Self {
        Self { items: VecDeque::new(), limit }
    }

    pub(crate) fn push(&mut self, target: InstanceId, mutator: Mutator) -> Result<()> {
        if self.items.len() >= self.limit {
            return Err(ComposeError::PassQueueFull { limit: self.limit });
        }
        self.items.push_back(PendingPass { target, mutator });
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<PendingPass> {
        self.items.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Mutator {
        Box::new(|_| {})
    }

    #[test]
    fn test_fifo() {
        let mut queue = PassQueue::new(8);
        let a = InstanceId::new(0, 0);
        let b = InstanceId::new(1, 0);
        queue.push(a, noop()).unwrap();
        queue.push(b, noop()).unwrap();
        queue.push(a, noop()).unwrap();

        let order: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|p| p.target).collect();
        assert_eq!(order, [a, b, a]);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_limit() {
        let mut queue = PassQueue::new(1);
        let id = InstanceId::new(0, 0);
        queue.push(id, noop()).unwrap();
        assert_eq!(queue.push(id, noop()).unwrap_err(), ComposeError::PassQueueFull { limit: 1 });
    }
}
