use std::sync::Arc;

use arbor_eth::Block;
use arbor_primitives::{Address, U256};
use arbor_state::StateChangeTracer;
use parking_lot::Mutex;

/// Kind of a block reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardKind {
    /// Reward for producing the block.
    Block,
    /// Reward for an included ommer.
    Uncle,
}

/// A caller-supplied tracer observing block processing.
///
/// All hooks are infallible; tracing never participates in control flow and
/// tracing failures are the tracer's own concern. Hooks default to no-ops.
pub trait BlockTracer: Send + Sync {
    /// Whether reward application should be traced.
    fn is_tracing_rewards(&self) -> bool {
        false
    }

    /// A reward is about to be applied. Only invoked when
    /// [`BlockTracer::is_tracing_rewards`] returns true.
    fn report_reward(&self, _beneficiary: Address, _kind: RewardKind, _value: U256) {}

    /// Whether state changes should be traced. When true, reward-induced
    /// state deltas are committed under [`BlockTracer::state_tracer`] so they
    /// are observable.
    fn is_tracing_state(&self) -> bool {
        false
    }

    /// The state-change tracer to commit under when tracing state.
    fn state_tracer(&self) -> Option<&dyn StateChangeTracer> {
        None
    }

    /// A new block trace begins.
    fn start_new_block_trace(&self, _block: &Block) {}

    /// The current block trace ends.
    fn end_block_trace(&self) {}
}

/// A no-op tracer.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopBlockTracer;

impl BlockTracer for NoopBlockTracer {}

/// The single long-lived tracing sink of the processor.
///
/// One instance lives for the whole lifetime of the processor and is reused
/// across blocks; the caller's tracer is swapped in at the start of each
/// block trace and out at its end.
#[derive(Default)]
pub struct ReceiptsTracer {
    other: Mutex<Option<Arc<dyn BlockTracer>>>,
}

impl ReceiptsTracer {
    /// Binds the caller's tracer for the next block trace.
    pub fn set_other_tracer(&self, tracer: Arc<dyn BlockTracer>) {
        *self.other.lock() = Some(tracer);
    }

    /// Returns the currently bound tracer, if any.
    pub fn other_tracer(&self) -> Option<Arc<dyn BlockTracer>> {
        self.other.lock().clone()
    }

    /// Whether the bound tracer wants reward tracing.
    pub fn is_tracing_rewards(&self) -> bool {
        self.other_tracer()
            .is_some_and(|tracer| tracer.is_tracing_rewards())
    }

    /// Forwards a reward report to the bound tracer.
    pub fn report_reward(&self, beneficiary: Address, kind: RewardKind, value: U256) {
        if let Some(tracer) = self.other_tracer() {
            tracer.report_reward(beneficiary, kind, value);
        }
    }

    /// Begins a new block trace on the bound tracer.
    pub fn start_new_block_trace(&self, block: &Block) {
        if let Some(tracer) = self.other_tracer() {
            tracer.start_new_block_trace(block);
        }
    }

    /// Ends the current block trace and unbinds the caller's tracer.
    pub fn end_block_trace(&self) {
        if let Some(tracer) = self.other.lock().take() {
            tracer.end_block_trace();
        }
    }
}
