use std::sync::Arc;

use arbor_eth::Block;

/// Dispatches a fire-and-forget task that computes the hash of every
/// transaction in the branch, walking blocks and transactions contiguously.
///
/// The task shares nothing with the pipeline beyond each transaction's
/// single-shot hash cell, so the foreground may race it safely: whichever
/// side publishes first wins and both observe the same value. Completion is
/// never awaited; a consumer that outruns the worker computes hashes on
/// demand.
pub(crate) fn precompute_transaction_hashes(blocks: &[Arc<Block>]) {
    let blocks = blocks.to_vec();
    rayon::spawn(move || {
        for block in &blocks {
            for transaction in block.transactions() {
                let _ = transaction.transaction_hash();
            }
        }
    });
}
