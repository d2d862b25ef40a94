use std::sync::Arc;

use arbor_primitives::B256;

/// Collects the state nodes touched while processing a block, preserved for
/// later proofs.
pub trait WitnessCollector: Send + Sync {
    /// Starts collecting on the calling thread.
    fn begin_tracking(&self);

    /// Stops collecting on the calling thread.
    fn end_tracking(&self);

    /// Clears the collected set.
    fn reset(&self);

    /// Persists the collected set against the provided block hash.
    fn persist(&self, block_hash: B256);
}

/// A collector that records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopWitnessCollector;

impl WitnessCollector for NoopWitnessCollector {
    fn begin_tracking(&self) {}

    fn end_tracking(&self) {}

    fn reset(&self) {}

    fn persist(&self, _block_hash: B256) {}
}

/// A tracking scope bound to the current thread.
///
/// Collection stops when the scope is dropped, on every exit path.
pub struct WitnessScope {
    collector: Arc<dyn WitnessCollector>,
}

impl WitnessScope {
    /// Starts collecting on the calling thread until the returned scope is
    /// dropped.
    pub fn enter(collector: Arc<dyn WitnessCollector>) -> Self {
        collector.begin_tracking();
        Self { collector }
    }
}

impl Drop for WitnessScope {
    fn drop(&mut self) {
        self.collector.end_tracking();
    }
}
