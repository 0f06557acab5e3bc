//! Engine configuration.

/// Tunables for an [`Engine`](super::Engine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Skip `PlatformAdapter::update` when a re-render produced an equal node.
    pub skip_identical_updates: bool,
    /// Upper bound on queued state passes. Enqueueing past it fails.
    pub max_pending_passes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            skip_identical_updates: true,
            max_pending_passes: 1024,
        }
    }
}

impl EngineConfig {
    pub fn skip_identical_updates(mut self, skip: bool) -> Self {
        self.skip_identical_updates = skip;
        self
    }

    pub fn max_pending_passes(mut self, limit: usize) -> Self {
        self.max_pending_passes = limit;
        self
    }
}
