use std::sync::Arc;

use arbor_eth::{receipt, BlobGas, Block, Receipt, Spec, Withdrawal};
use arbor_primitives::{Bloom, B256};
use arbor_state::WorldState;

use crate::{
    beacon::BeaconRootsHandler,
    dao,
    error::{BlockProcessorError, ExecutionError},
    events::Events,
    executor::TransactionsExecutor,
    options::ProcessingOptions,
    rewards::{apply_rewards, RewardCalculator},
    spec::SpecProvider,
    storage::ReceiptStorage,
    tracer::{BlockTracer, ReceiptsTracer},
    validator::BlockValidator,
    withdrawals::apply_withdrawals,
};

/// Computes the receipts root a processed header carries.
pub trait ReceiptsRootCalculator: Send + Sync {
    /// Returns the receipts root for the provided receipts. The suggested
    /// value may be used when the rules allow deriving it legally.
    fn receipts_root(&self, receipts: &[Receipt], spec: &Spec, suggested_root: B256) -> B256;
}

/// The standard calculator: the ordered trie root of the RLP-encoded
/// receipts, deferring to the suggested value when receipt validation is
/// disabled by the rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrieReceiptsRootCalculator;

impl ReceiptsRootCalculator for TrieReceiptsRootCalculator {
    fn receipts_root(&self, receipts: &[Receipt], spec: &Spec, suggested_root: B256) -> B256 {
        if spec.validate_receipts {
            receipt::receipts_root(receipts)
        } else {
            suggested_root
        }
    }
}

/// The per-block pipeline: re-executes one suggested block against the world
/// state and produces its processed counterpart together with the receipts.
pub struct BlockProcessor {
    spec_provider: Arc<dyn SpecProvider>,
    executor: Box<dyn TransactionsExecutor>,
    validator: Box<dyn BlockValidator>,
    reward_calculator: Box<dyn RewardCalculator>,
    receipts_root_calculator: Box<dyn ReceiptsRootCalculator>,
    receipt_storage: Arc<dyn ReceiptStorage>,
    beacon_roots: BeaconRootsHandler,
    receipts_tracer: ReceiptsTracer,
}

impl BlockProcessor {
    /// Constructs a pipeline over the provided collaborators.
    pub fn new(
        spec_provider: Arc<dyn SpecProvider>,
        executor: Box<dyn TransactionsExecutor>,
        validator: Box<dyn BlockValidator>,
        reward_calculator: Box<dyn RewardCalculator>,
        receipts_root_calculator: Box<dyn ReceiptsRootCalculator>,
        receipt_storage: Arc<dyn ReceiptStorage>,
    ) -> Self {
        Self {
            spec_provider,
            executor,
            validator,
            reward_calculator,
            receipts_root_calculator,
            receipt_storage,
            beacon_roots: BeaconRootsHandler,
            receipts_tracer: ReceiptsTracer::default(),
        }
    }

    /// Processes a single suggested block. The suggested block is never
    /// mutated; all outputs land on a fresh sibling.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub(crate) fn process_one(
        &self,
        suggested: &Arc<Block>,
        options: ProcessingOptions,
        tracer: &Arc<dyn BlockTracer>,
        state: &mut dyn WorldState,
        events: &Events,
    ) -> Result<(Arc<Block>, Vec<Receipt>), BlockProcessorError> {
        let suggested_header = suggested.header();

        if let Some(dao_fork) = self.spec_provider.dao_fork() {
            // Fires only on the exact activation height.
            if suggested_header.number == dao_fork.activation_block {
                let spec = self.spec_provider.spec_for(suggested_header);
                dao::apply_dao_transition(dao_fork, &spec, state)
                    .map_err(ExecutionError::State)?;
            }
        }

        let should_compute_state_root =
            suggested_header.number != 0 || !self.spec_provider.genesis_state_unavailable();
        let header = suggested_header.for_processing(!should_compute_state_root);
        let spec = self.spec_provider.spec_for(&header);

        let mut block = Block::new(
            header,
            suggested.transactions().to_vec(),
            suggested.ommers().to_vec(),
            suggested.withdrawals().map(<[Withdrawal]>::to_vec),
        );

        self.receipts_tracer.set_other_tracer(tracer.clone());
        self.receipts_tracer.start_new_block_trace(&block);

        self.beacon_roots
            .apply_contract_state_changes(block.header(), &spec, state)
            .map_err(ExecutionError::State)?;
        state.commit(&spec)?;

        let receipts = self.executor.process_transactions(
            &block,
            options,
            &self.receipts_tracer,
            &spec,
            state,
        )?;

        for (index, (transaction, receipt)) in
            block.transactions().iter().zip(&receipts).enumerate()
        {
            events.transaction_processed(index, *transaction.transaction_hash(), receipt)?;
        }

        let blob_gas_used = block
            .transactions()
            .iter()
            .filter_map(|transaction| transaction.total_blob_gas())
            .sum();
        let gas_used = receipts
            .last()
            .map_or(0, |receipt| receipt.cumulative_gas_used);
        let logs_bloom = receipts.iter().fold(Bloom::ZERO, |mut bloom, receipt| {
            bloom.accrue_bloom(&receipt.logs_bloom);
            bloom
        });
        let receipts_root = self.receipts_root_calculator.receipts_root(
            &receipts,
            &spec,
            suggested_header.receipts_root,
        );

        {
            let header = block.header_mut();
            if spec.eip4844 {
                let excess_gas = header.blob_gas.map_or(0, |blob_gas| blob_gas.excess_gas);
                header.blob_gas = Some(BlobGas {
                    gas_used: blob_gas_used,
                    excess_gas,
                });
            }
            header.gas_used = gas_used;
            header.logs_bloom = logs_bloom;
            header.receipts_root = receipts_root;
        }

        let rewards = self.reward_calculator.calculate_rewards(&block);
        apply_rewards(&rewards, &spec, state, &self.receipts_tracer)?;

        apply_withdrawals(block.withdrawals(), &spec, state).map_err(ExecutionError::State)?;

        self.receipts_tracer.end_block_trace();
        state.commit(&spec)?;

        if should_compute_state_root {
            block.header_mut().state_root = state.recalculate_state_root();
        }

        let processed_hash = block.hash();
        log::debug!(
            "processed block {} ({processed_hash})",
            block.header().number
        );
        let processed = Arc::new(block);

        if !options.contains(ProcessingOptions::NO_VALIDATION)
            && !self
                .validator
                .validate_processed_block(&processed, &receipts, suggested)
        {
            return Err(BlockProcessorError::InvalidBlock {
                block_hash: suggested.hash(),
                suggested: suggested.clone(),
            });
        }

        if options.contains(ProcessingOptions::STORE_RECEIPTS) {
            self.receipt_storage.insert(&processed, &receipts, false);
        }

        Ok((processed, receipts))
    }
}

#[cfg(test)]
mod tests {
    use arbor_eth::Hardfork;

    use super::*;

    #[test]
    fn receipts_root_defers_when_validation_is_off() {
        let spec = Spec::new(Hardfork::London);
        let relaxed = spec.clone().without_receipts_validation();
        let suggested_root = B256::repeat_byte(0xaa);
        let receipts = [Receipt::success(21_000, Vec::new(), &spec)];

        let computed =
            TrieReceiptsRootCalculator.receipts_root(&receipts, &spec, suggested_root);
        let deferred =
            TrieReceiptsRootCalculator.receipts_root(&receipts, &relaxed, suggested_root);

        assert_eq!(computed, receipt::receipts_root(&receipts));
        assert_eq!(deferred, suggested_root);
        assert_ne!(computed, deferred);
    }
}
