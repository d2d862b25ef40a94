use std::sync::Arc;

use arbor_eth::Block;
use arbor_primitives::B256;
use arbor_state::{StateError, WorldState};

use crate::{
    block::BlockProcessor,
    error::BlockProcessorError,
    events::Events,
    hash_task,
    metrics::ProcessorMetrics,
    options::ProcessingOptions,
    tracer::BlockTracer,
    witness::{WitnessCollector, WitnessScope},
};

/// Number of blocks processed between commits of a long branch. Bounds the
/// work redone when a late block fails.
const MAX_UNCOMMITTED_BLOCKS: usize = 64;

/// The branch driver: re-executes a contiguous sequence of suggested blocks
/// against the world state, atomically.
///
/// Either every returned block is fully processed and the world state
/// reflects the last one (unless
/// [`ProcessingOptions::DO_NOT_UPDATE_HEAD`] is set), or the world state is
/// restored to the active checkpoint and the failure is surfaced.
pub struct BranchProcessor {
    block_processor: BlockProcessor,
    state: Box<dyn WorldState>,
    witness: Arc<dyn WitnessCollector>,
    events: Arc<Events>,
    metrics: Arc<ProcessorMetrics>,
}

impl BranchProcessor {
    /// Constructs a driver over the provided pipeline and world state.
    ///
    /// The world state is exclusively driven by this processor while
    /// [`BranchProcessor::process`] runs; no concurrent mutator is allowed.
    pub fn new(
        block_processor: BlockProcessor,
        state: Box<dyn WorldState>,
        witness: Arc<dyn WitnessCollector>,
        events: Arc<Events>,
        metrics: Arc<ProcessorMetrics>,
    ) -> Self {
        Self {
            block_processor,
            state,
            witness,
            events,
            metrics,
        }
    }

    /// The processor's counters.
    pub fn metrics(&self) -> &ProcessorMetrics {
        &self.metrics
    }

    /// The current state root of the driven world state.
    pub fn state_root(&self) -> B256 {
        self.state.state_root()
    }

    /// Read-only view of the driven world state.
    pub fn state(&self) -> &dyn WorldState {
        self.state.as_ref()
    }

    /// Processes a branch of suggested blocks.
    ///
    /// `branch_state_root` names the root the branch begins at; when it
    /// differs from the current root the world state is switched there and
    /// the switch is counted as a reorganization. `None` is a documented
    /// no-init mode: processing starts from the current root as-is.
    ///
    /// Blocks are processed strictly in the order supplied. Any failure
    /// restores the active checkpoint and is re-surfaced.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn process(
        &mut self,
        branch_state_root: Option<B256>,
        suggested: Vec<Arc<Block>>,
        options: ProcessingOptions,
        tracer: Arc<dyn BlockTracer>,
    ) -> Result<Vec<Arc<Block>>, BlockProcessorError> {
        if suggested.is_empty() {
            return Ok(Vec::new());
        }

        for index in 1..suggested.len() {
            if suggested[index].header().parent_hash != suggested[index - 1].hash() {
                return Err(BlockProcessorError::NonContiguousBranch { index });
            }
        }

        // Best-effort hash precomputation; never awaited.
        hash_task::precompute_transaction_hashes(&suggested);

        log::debug!(
            "processing branch of {} blocks starting at {}",
            suggested.len(),
            suggested[0].header().number
        );
        self.events.branch_starting(&suggested)?;

        let entry_checkpoint = self.state.state_root();
        let mut restore_root = entry_checkpoint;

        let result =
            self.process_blocks(branch_state_root, &suggested, options, &tracer, &mut restore_root);

        match result {
            Ok(processed) => {
                if options.contains(ProcessingOptions::DO_NOT_UPDATE_HEAD) {
                    self.restore_branch(restore_root)?;
                }
                Ok(processed)
            }
            Err(error) => {
                log::warn!(
                    "branch processing failed, reverting to state root {restore_root}: {error}"
                );
                if let Err(restore_error) = self.restore_branch(restore_root) {
                    log::error!(
                        "could not restore state root {restore_root}: {restore_error}"
                    );
                }
                Err(error)
            }
        }
    }

    fn process_blocks(
        &mut self,
        branch_state_root: Option<B256>,
        suggested: &[Arc<Block>],
        options: ProcessingOptions,
        tracer: &Arc<dyn BlockTracer>,
        restore_root: &mut B256,
    ) -> Result<Vec<Arc<Block>>, BlockProcessorError> {
        // Witness collection is bound to this thread for the whole branch
        // and released on every exit path.
        let _witness_scope = WitnessScope::enter(self.witness.clone());

        self.init_branch(branch_state_root, true)?;

        let mut processed_blocks = Vec::with_capacity(suggested.len());
        for (index, suggested_block) in suggested.iter().enumerate() {
            self.witness.reset();

            let (processed, receipts) = self.block_processor.process_one(
                suggested_block,
                options,
                tracer,
                self.state.as_mut(),
                &self.events,
            )?;

            self.state.commit_tree(suggested_block.header().number)?;

            if !options.contains(ProcessingOptions::READ_ONLY_CHAIN) {
                self.witness.persist(processed.hash());
                self.events.block_processed(&processed, &receipts)?;
            }

            processed_blocks.push(processed);

            // Long branches are committed periodically; the restore point
            // moves forward so a late failure does not redo the prefix. The
            // re-init targets the just-computed root, not the suggested
            // header's (which need not be live under NO_VALIDATION), and is
            // not counted as a reorganization.
            if index > 0
                && index < suggested.len() - 1
                && index % MAX_UNCOMMITTED_BLOCKS == 0
            {
                *restore_root = self.state.state_root();
                self.init_branch(Some(*restore_root), false)?;
            }
        }

        Ok(processed_blocks)
    }

    fn init_branch(
        &mut self,
        branch_state_root: Option<B256>,
        counted: bool,
    ) -> Result<(), StateError> {
        if let Some(root) = branch_state_root {
            if self.state.state_root() != root {
                if counted {
                    log::debug!(
                        "reorganization: switching state root {} to {root}",
                        self.state.state_root()
                    );
                    self.metrics.record_reorganization();
                }
                self.state.reset();
                self.state.set_state_root(root)?;
            }
        }
        Ok(())
    }

    fn restore_branch(&mut self, root: B256) -> Result<(), StateError> {
        self.state.reset();
        self.state.set_state_root(root)
    }
}
