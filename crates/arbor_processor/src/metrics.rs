use std::sync::atomic::{AtomicU64, Ordering};

/// Counters exposed by the processor.
#[derive(Debug, Default)]
pub struct ProcessorMetrics {
    reorganizations: AtomicU64,
}

impl ProcessorMetrics {
    /// Records a reorganization: the active branch was switched to one that
    /// diverges from the current head.
    pub(crate) fn record_reorganization(&self) {
        self.reorganizations.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of reorganizations recorded so far.
    pub fn reorganizations(&self) -> u64 {
        self.reorganizations.load(Ordering::Relaxed)
    }
}
