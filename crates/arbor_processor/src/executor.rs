use arbor_eth::{Block, Receipt, Spec};
use arbor_state::WorldState;

use crate::{error::ExecutionError, options::ProcessingOptions, tracer::ReceiptsTracer};

/// The transaction execution sub-engine consumed by the block processor.
///
/// Given a block and the active rules, executes the block's transactions
/// against the provided world state and returns their receipts in
/// transaction order. Implementations mutate state through the same façade
/// the processor drives and must not commit the trie themselves.
pub trait TransactionsExecutor: Send + Sync {
    /// Executes the block's transactions, returning one receipt per
    /// transaction, ordered identically to the block's transaction vector.
    fn process_transactions(
        &self,
        block: &Block,
        options: ProcessingOptions,
        tracer: &ReceiptsTracer,
        spec: &Spec,
        state: &mut dyn WorldState,
    ) -> Result<Vec<Receipt>, ExecutionError>;
}
