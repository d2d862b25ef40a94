use std::sync::Arc;

use arbor_eth::Block;
use arbor_primitives::B256;
use arbor_state::StateError;

/// An error raised by an event observer. Any observer error aborts the
/// branch being processed and triggers a rollback.
#[derive(Debug, thiserror::Error)]
#[error("observer failed: {0}")]
pub struct ObserverError(pub String);

/// An error that occurred while executing the transactions of a block, or
/// while applying rewards, withdrawals or pre-execution contract state.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// A world-state operation failed during execution.
    #[error(transparent)]
    State(#[from] StateError),
    /// A transaction could not be executed.
    #[error("transaction {index} in block {block_number} failed: {reason}")]
    Transaction {
        /// Number of the containing block.
        block_number: u64,
        /// Index of the transaction within the block.
        index: usize,
        /// Description of the failure.
        reason: String,
    },
}

/// An error that occurred while processing a branch of blocks.
#[derive(Debug, thiserror::Error)]
pub enum BlockProcessorError {
    /// The validator rejected a processed block.
    #[error("suggested block {block_hash} failed post-processing validation")]
    InvalidBlock {
        /// Hash of the rejected suggested block.
        block_hash: B256,
        /// The rejected suggested block.
        suggested: Arc<Block>,
    },
    /// Execution of a block's transactions or post-execution steps failed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    /// A world-state operation failed.
    #[error(transparent)]
    State(#[from] StateError),
    /// The suggested blocks do not form a parent-linked sequence.
    #[error("suggested branch is not contiguous at index {index}")]
    NonContiguousBranch {
        /// Index of the first block whose parent hash does not match its
        /// predecessor.
        index: usize,
    },
    /// An event observer failed.
    #[error(transparent)]
    Observer(#[from] ObserverError),
}
