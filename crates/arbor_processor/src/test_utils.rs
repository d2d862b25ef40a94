//! Test doubles and fixtures for exercising the processor.

use std::sync::{Arc, OnceLock};

use arbor_eth::{
    Block, BlockHeader, ExecutionLog, Receipt, SignedTransaction, Spec, Withdrawal,
};
use arbor_primitives::{Address, Bytes, TxKind, B256, U256};
use arbor_state::{TrieState, WorldState};
use parking_lot::Mutex;

use crate::{
    error::{ExecutionError, ObserverError},
    events::{BranchObserver, Events},
    executor::TransactionsExecutor,
    metrics::ProcessorMetrics,
    options::ProcessingOptions,
    rewards::ClassicRewardCalculator,
    spec::SpecProvider,
    storage::{NoopReceiptStorage, ReceiptStorage},
    tracer::{BlockTracer, NoopBlockTracer, ReceiptsTracer, RewardKind},
    validator::SuggestedHeaderValidator,
    witness::{NoopWitnessCollector, WitnessCollector},
    BlockProcessor, BranchProcessor, TrieReceiptsRootCalculator,
};

/// A well-funded test account.
pub const ALICE: Address = Address::repeat_byte(0xaa);
/// A well-funded test account.
pub const BOB: Address = Address::repeat_byte(0xbb);
/// The beneficiary every template block pays fees to.
pub const BENEFICIARY: Address = Address::repeat_byte(0xbe);

/// Gas charged per transfer by the [`TransferExecutor`].
pub const TRANSFER_GAS: u64 = 21_000;

/// One ether, in wei.
pub const ETHER: u64 = 1_000_000_000_000_000_000;

/// A state funding [`ALICE`] and [`BOB`] with one ether each.
pub fn funded_state() -> TrieState {
    TrieState::with_accounts([(ALICE, U256::from(ETHER)), (BOB, U256::from(ETHER))])
}

/// Builds a plain value transfer.
pub fn transfer(caller: Address, to: Address, value: U256, nonce: u64) -> SignedTransaction {
    SignedTransaction {
        nonce,
        gas_price: U256::from(10),
        gas_limit: TRANSFER_GAS,
        kind: TxKind::Call(to),
        value,
        input: Bytes::new(),
        caller,
        blob_hashes: Vec::new(),
        hash: OnceLock::new(),
        rlp_encoding: OnceLock::new(),
    }
}

/// Builds a value transfer carrying the provided number of blobs.
pub fn blob_transfer(
    caller: Address,
    to: Address,
    value: U256,
    nonce: u64,
    blobs: usize,
) -> SignedTransaction {
    let mut transaction = transfer(caller, to, value, nonce);
    transaction.blob_hashes = (0..blobs)
        .map(|index| B256::repeat_byte(index as u8 + 1))
        .collect();
    transaction
}

/// A deterministic executor: every transaction is a plain value transfer
/// charging [`TRANSFER_GAS`] gas, paying the fee to the block's beneficiary
/// and emitting one transfer log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransferExecutor;

impl TransactionsExecutor for TransferExecutor {
    fn process_transactions(
        &self,
        block: &Block,
        _options: ProcessingOptions,
        _tracer: &ReceiptsTracer,
        spec: &Spec,
        state: &mut dyn WorldState,
    ) -> Result<Vec<Receipt>, ExecutionError> {
        let beneficiary = block.header().beneficiary;
        let mut cumulative_gas_used = 0;
        let mut receipts = Vec::with_capacity(block.transactions().len());

        for (index, transaction) in block.transactions().iter().enumerate() {
            let fee = transaction.gas_price * U256::from(TRANSFER_GAS);
            let cost = transaction.value + fee;

            state
                .subtract_from_balance(transaction.caller, cost, spec)
                .map_err(|error| ExecutionError::Transaction {
                    block_number: block.header().number,
                    index,
                    reason: error.to_string(),
                })?;

            if let TxKind::Call(to) = transaction.kind {
                if state.account_exists(&to) {
                    state.add_to_balance(to, transaction.value, spec);
                } else {
                    state.create_account(to, transaction.value);
                }
            }

            if state.account_exists(&beneficiary) {
                state.add_to_balance(beneficiary, fee, spec);
            } else {
                state.create_account(beneficiary, fee);
            }

            cumulative_gas_used += TRANSFER_GAS;

            let log_address = match transaction.kind {
                TxKind::Call(to) => to,
                TxKind::Create => transaction.caller,
            };
            let log = ExecutionLog::new(
                log_address,
                vec![B256::left_padding_from(transaction.caller.as_slice())],
                Bytes::from(transaction.value.to_be_bytes::<32>().to_vec()),
            );
            receipts.push(Receipt::success(cumulative_gas_used, vec![log], spec));
        }

        Ok(receipts)
    }
}

/// Events observed by a [`RecordingObserver`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObservedEvent {
    /// A branch was announced.
    BranchStarting {
        /// Number of suggested blocks in the branch.
        blocks: usize,
    },
    /// A block was fully processed.
    BlockProcessed {
        /// The processed block's number.
        number: u64,
        /// Number of produced receipts.
        receipts: usize,
    },
    /// A transaction was processed.
    TransactionProcessed {
        /// Index of the transaction within its block.
        index: usize,
    },
}

/// An observer recording every notification in arrival order.
#[derive(Default)]
pub struct RecordingObserver {
    observed: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    /// Returns everything observed so far.
    pub fn observed(&self) -> Vec<ObservedEvent> {
        self.observed.lock().clone()
    }
}

impl BranchObserver for RecordingObserver {
    fn branch_starting(&self, blocks: &[Arc<Block>]) -> Result<(), ObserverError> {
        self.observed.lock().push(ObservedEvent::BranchStarting {
            blocks: blocks.len(),
        });
        Ok(())
    }

    fn block_processed(
        &self,
        block: &Arc<Block>,
        receipts: &[Receipt],
    ) -> Result<(), ObserverError> {
        self.observed.lock().push(ObservedEvent::BlockProcessed {
            number: block.header().number,
            receipts: receipts.len(),
        });
        Ok(())
    }

    fn transaction_processed(
        &self,
        index: usize,
        _transaction_hash: B256,
        _receipt: &Receipt,
    ) -> Result<(), ObserverError> {
        self.observed
            .lock()
            .push(ObservedEvent::TransactionProcessed { index });
        Ok(())
    }
}

/// An observer failing the branch when a specific block is reported.
pub struct FailingObserver {
    /// The block number whose `block_processed` notification fails.
    pub fail_on_block_number: u64,
}

impl BranchObserver for FailingObserver {
    fn block_processed(
        &self,
        block: &Arc<Block>,
        _receipts: &[Receipt],
    ) -> Result<(), ObserverError> {
        if block.header().number == self.fail_on_block_number {
            Err(ObserverError(format!(
                "rejecting block {}",
                self.fail_on_block_number
            )))
        } else {
            Ok(())
        }
    }
}

/// A receipt sink retaining every insert.
#[derive(Default)]
pub struct MemoryReceiptStorage {
    inserts: Mutex<Vec<(u64, B256, usize, bool)>>,
}

impl MemoryReceiptStorage {
    /// Block numbers inserted so far, in insertion order.
    pub fn inserted_blocks(&self) -> Vec<u64> {
        self.inserts
            .lock()
            .iter()
            .map(|(number, _, _, _)| *number)
            .collect()
    }

    /// Number of inserts made so far.
    pub fn len(&self) -> usize {
        self.inserts.lock().len()
    }

    /// Whether nothing was inserted.
    pub fn is_empty(&self) -> bool {
        self.inserts.lock().is_empty()
    }
}

impl ReceiptStorage for MemoryReceiptStorage {
    fn insert(&self, block: &Block, receipts: &[Receipt], is_canonical: bool) {
        self.inserts.lock().push((
            block.header().number,
            block.hash(),
            receipts.len(),
            is_canonical,
        ));
    }
}

/// Operations recorded by a [`RecordingWitness`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WitnessOp {
    /// Tracking started on a thread.
    Begin,
    /// Tracking stopped on a thread.
    End,
    /// The collected set was cleared.
    Reset,
    /// The collected set was persisted for a block hash.
    Persist(B256),
}

/// A witness collector recording its call sequence.
#[derive(Default)]
pub struct RecordingWitness {
    ops: Mutex<Vec<WitnessOp>>,
}

impl RecordingWitness {
    /// Returns the recorded operations in call order.
    pub fn ops(&self) -> Vec<WitnessOp> {
        self.ops.lock().clone()
    }
}

impl WitnessCollector for RecordingWitness {
    fn begin_tracking(&self) {
        self.ops.lock().push(WitnessOp::Begin);
    }

    fn end_tracking(&self) {
        self.ops.lock().push(WitnessOp::End);
    }

    fn reset(&self) {
        self.ops.lock().push(WitnessOp::Reset);
    }

    fn persist(&self, block_hash: B256) {
        self.ops.lock().push(WitnessOp::Persist(block_hash));
    }
}

/// A tracer opting into reward tracing and recording reported rewards.
#[derive(Default)]
pub struct RecordingTracer {
    rewards: Mutex<Vec<(Address, RewardKind, U256)>>,
    block_traces: Mutex<Vec<u64>>,
    ended: Mutex<usize>,
}

impl RecordingTracer {
    /// Rewards reported so far.
    pub fn rewards(&self) -> Vec<(Address, RewardKind, U256)> {
        self.rewards.lock().clone()
    }

    /// Numbers of the blocks whose traces started.
    pub fn block_traces(&self) -> Vec<u64> {
        self.block_traces.lock().clone()
    }

    /// Number of block traces that ended.
    pub fn ended(&self) -> usize {
        *self.ended.lock()
    }
}

impl BlockTracer for RecordingTracer {
    fn is_tracing_rewards(&self) -> bool {
        true
    }

    fn report_reward(&self, beneficiary: Address, kind: RewardKind, value: U256) {
        self.rewards.lock().push((beneficiary, kind, value));
    }

    fn start_new_block_trace(&self, block: &Block) {
        self.block_traces.lock().push(block.header().number);
    }

    fn end_block_trace(&self) {
        *self.ended.lock() += 1;
    }
}

/// A template for a suggested block that is yet to be sealed.
pub struct TemplateBlock {
    /// Transactions of the block.
    pub transactions: Vec<SignedTransaction>,
    /// Withdrawals of the block, for post-Shanghai rules.
    pub withdrawals: Option<Vec<Withdrawal>>,
    /// Parent beacon block root, for post-Cancun rules.
    pub parent_beacon_block_root: Option<B256>,
}

impl TemplateBlock {
    /// A template carrying only transactions.
    pub fn new(transactions: Vec<SignedTransaction>) -> Self {
        Self {
            transactions,
            withdrawals: None,
            parent_beacon_block_root: None,
        }
    }

    /// Attaches withdrawals.
    pub fn with_withdrawals(mut self, withdrawals: Vec<Withdrawal>) -> Self {
        self.withdrawals = Some(withdrawals);
        self
    }

    /// Attaches a parent beacon block root.
    pub fn with_parent_beacon_root(mut self, root: B256) -> Self {
        self.parent_beacon_block_root = Some(root);
        self
    }
}

/// Constructs a processor over the standard test collaborators: the
/// transfer executor, the suggested-header validator, the classic reward
/// calculator and the trie receipts-root calculator.
pub fn test_processor(
    state: TrieState,
    spec_provider: Arc<dyn SpecProvider>,
    receipt_storage: Arc<dyn ReceiptStorage>,
    witness: Arc<dyn WitnessCollector>,
    events: Arc<Events>,
) -> BranchProcessor {
    let block_processor = BlockProcessor::new(
        spec_provider.clone(),
        Box::new(TransferExecutor),
        Box::new(SuggestedHeaderValidator),
        Box::new(ClassicRewardCalculator::new(spec_provider)),
        Box::new(TrieReceiptsRootCalculator),
        receipt_storage,
    );

    BranchProcessor::new(
        block_processor,
        Box::new(state),
        witness,
        events,
        Arc::new(ProcessorMetrics::default()),
    )
}

fn template_header(
    number: u64,
    parent_hash: B256,
    template: &TemplateBlock,
    spec: &Spec,
) -> BlockHeader {
    // Fork-dependent optional fields are populated so the header's trailing
    // RLP fields stay contiguous.
    BlockHeader {
        parent_hash,
        number,
        gas_limit: 8_000_000,
        timestamp: number * 12,
        beneficiary: BENEFICIARY,
        extra_data: Bytes::from_static(b"arbor-test"),
        base_fee_per_gas: spec.eip1559.then_some(0),
        withdrawals_root: spec
            .eip4895
            .then_some(arbor_primitives::KECCAK_NULL_RLP),
        parent_beacon_block_root: template.parent_beacon_block_root,
        ..BlockHeader::default()
    }
}

/// Seals a branch of templates into valid suggested blocks by processing
/// them once, without validation, against a clone of the provided state.
///
/// The returned blocks carry the state roots, receipts roots and hashes a
/// validating re-execution reproduces, and are parent-linked starting at
/// `parent_hash`.
pub fn seal_branch(
    state: &TrieState,
    spec_provider: Arc<dyn SpecProvider>,
    start_number: u64,
    parent_hash: B256,
    templates: Vec<TemplateBlock>,
) -> Vec<Arc<Block>> {
    let mut processor = test_processor(
        state.clone(),
        spec_provider.clone(),
        Arc::new(NoopReceiptStorage),
        Arc::new(NoopWitnessCollector),
        Arc::new(Events::default()),
    );

    let mut sealed = Vec::with_capacity(templates.len());
    let mut parent_hash = parent_hash;
    for (offset, template) in templates.into_iter().enumerate() {
        let number = start_number + offset as u64;
        let probe = BlockHeader {
            number,
            timestamp: number * 12,
            ..BlockHeader::default()
        };
        let spec = spec_provider.spec_for(&probe);
        let header = template_header(number, parent_hash, &template, &spec);
        let block = Arc::new(Block::new(
            header,
            template.transactions,
            Vec::new(),
            template.withdrawals,
        ));

        let processed = processor
            .process(
                None,
                vec![block],
                ProcessingOptions::NO_VALIDATION,
                Arc::new(NoopBlockTracer),
            )
            .expect("sealing a template block must succeed")
            .pop()
            .expect("one template in, one sealed block out");

        parent_hash = processed.hash();
        sealed.push(processed);
    }

    sealed
}
