//! End-to-end branch processing scenarios.

use std::sync::Arc;

use arbor_eth::{BlobGas, Block, Hardfork, Withdrawal};
use arbor_primitives::{Address, B256, GWEI_TO_WEI, U256};
use arbor_processor::{
    beacon::{BEACON_ROOTS_ADDRESS, BEACON_ROOTS_HISTORY_BUFFER_LENGTH},
    test_utils::{
        blob_transfer, funded_state, seal_branch, test_processor, transfer, FailingObserver,
        MemoryReceiptStorage, ObservedEvent, RecordingObserver, RecordingTracer, RecordingWitness,
        TemplateBlock, WitnessOp, ALICE, BENEFICIARY, BOB, TRANSFER_GAS,
    },
    BlockProcessorError, BranchProcessor, DaoForkConfig, Events, NoopBlockTracer,
    NoopReceiptStorage, NoopWitnessCollector, ProcessingOptions, ScheduleSpecProvider,
    SpecProvider,
};
use arbor_state::{TrieState, WorldState as _};

const GENESIS_HASH: B256 = B256::repeat_byte(0x11);

fn london_provider() -> Arc<dyn SpecProvider> {
    Arc::new(ScheduleSpecProvider::with_hardfork(Hardfork::London))
}

fn provider_for(hardfork: Hardfork) -> Arc<dyn SpecProvider> {
    Arc::new(ScheduleSpecProvider::with_hardfork(hardfork))
}

struct Scenario {
    state: TrieState,
    provider: Arc<dyn SpecProvider>,
    blocks: Vec<Arc<Block>>,
    storage: Arc<MemoryReceiptStorage>,
    witness: Arc<RecordingWitness>,
    observer: Arc<RecordingObserver>,
    events: Arc<Events>,
}

impl Scenario {
    /// Seals `block_count` single-transfer blocks on top of the funded
    /// genesis state.
    fn transfers(provider: Arc<dyn SpecProvider>, block_count: u64) -> Self {
        let state = funded_state();
        let templates = (0..block_count)
            .map(|offset| {
                TemplateBlock::new(vec![transfer(ALICE, BOB, U256::from(1_000), offset)])
            })
            .collect();
        let blocks = seal_branch(&state, provider.clone(), 1, GENESIS_HASH, templates);

        Self::with_blocks(state, provider, blocks)
    }

    fn with_blocks(
        state: TrieState,
        provider: Arc<dyn SpecProvider>,
        blocks: Vec<Arc<Block>>,
    ) -> Self {
        let events = Arc::new(Events::default());
        let observer = Arc::new(RecordingObserver::default());
        events.subscribe(observer.clone());

        Self {
            state,
            provider,
            blocks,
            storage: Arc::new(MemoryReceiptStorage::default()),
            witness: Arc::new(RecordingWitness::default()),
            observer,
            events,
        }
    }

    fn entry_root(&self) -> B256 {
        self.state.state_root()
    }

    fn processor(&self) -> BranchProcessor {
        test_processor(
            self.state.clone(),
            self.provider.clone(),
            self.storage.clone(),
            self.witness.clone(),
            self.events.clone(),
        )
    }
}

#[test]
fn single_valid_block() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 1);
    let entry_root = scenario.entry_root();
    let mut processor = scenario.processor();

    let processed = processor.process(
        Some(entry_root),
        scenario.blocks.clone(),
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    )?;

    assert_eq!(processed.len(), 1);
    assert_eq!(processed[0], scenario.blocks[0]);
    assert_eq!(processor.state_root(), processed[0].header().state_root);
    assert_ne!(processor.state_root(), entry_root);

    let observed = scenario.observer.observed();
    assert_eq!(
        observed,
        vec![
            ObservedEvent::BranchStarting { blocks: 1 },
            ObservedEvent::TransactionProcessed { index: 0 },
            ObservedEvent::BlockProcessed {
                number: 1,
                receipts: 1
            },
        ]
    );

    Ok(())
}

#[test]
fn round_trip_headers_match_the_suggested_blocks() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 3);
    let mut processor = scenario.processor();

    let processed = processor.process(
        Some(scenario.entry_root()),
        scenario.blocks.clone(),
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    )?;

    for (processed, suggested) in processed.iter().zip(&scenario.blocks) {
        assert_eq!(processed.header().state_root, suggested.header().state_root);
        assert_eq!(
            processed.header().receipts_root,
            suggested.header().receipts_root
        );
        assert_eq!(processed.header().gas_used, suggested.header().gas_used);
        assert_eq!(processed.hash(), suggested.hash());
    }

    Ok(())
}

#[test]
fn long_branch_commits_periodically_and_reorganizes_once() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 200);
    let entry_root = scenario.entry_root();
    let mut processor = scenario.processor();

    // Park the state on a side branch so switching back counts as a
    // reorganization.
    let side = seal_branch(
        &scenario.state,
        scenario.provider.clone(),
        1,
        GENESIS_HASH,
        vec![TemplateBlock::new(vec![transfer(
            BOB,
            ALICE,
            U256::from(7),
            0,
        )])],
    );
    processor.process(
        None,
        side,
        ProcessingOptions::NO_VALIDATION,
        Arc::new(NoopBlockTracer),
    )?;
    assert_ne!(processor.state_root(), entry_root);

    let processed = processor.process(
        Some(entry_root),
        scenario.blocks.clone(),
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    )?;

    assert_eq!(processed.len(), 200);
    assert_eq!(
        processor.state_root(),
        scenario.blocks[199].header().state_root
    );
    // One counted reorganization; the periodic mid-branch re-inits at blocks
    // 65 and 129 are suppressed.
    assert_eq!(processor.metrics().reorganizations(), 1);

    Ok(())
}

#[test]
fn long_unvalidated_branch_of_templates_survives_the_commit_interval() -> anyhow::Result<()> {
    let state = funded_state();
    let entry_root = state.state_root();

    // Raw templates whose headers carry no live state roots, parent-linked
    // by their own template hashes. Without validation the periodic
    // mid-branch re-init must target the computed root, never these.
    let mut blocks = Vec::with_capacity(70);
    let mut parent_hash = GENESIS_HASH;
    for number in 1..=70u64 {
        let header = arbor_eth::BlockHeader {
            parent_hash,
            number,
            gas_limit: 8_000_000,
            timestamp: number * 12,
            beneficiary: BENEFICIARY,
            base_fee_per_gas: Some(0),
            ..arbor_eth::BlockHeader::default()
        };
        let block = Arc::new(Block::new(
            header,
            vec![transfer(ALICE, BOB, U256::from(1), number - 1)],
            Vec::new(),
            None,
        ));
        parent_hash = block.hash();
        blocks.push(block);
    }

    let mut processor = test_processor(
        state,
        london_provider(),
        Arc::new(NoopReceiptStorage),
        Arc::new(NoopWitnessCollector),
        Arc::new(Events::default()),
    );
    let processed = processor.process(
        Some(entry_root),
        blocks,
        ProcessingOptions::NO_VALIDATION,
        Arc::new(NoopBlockTracer),
    )?;

    assert_eq!(processed.len(), 70);
    // The re-init past block 64 is benign: not a reorganization.
    assert_eq!(processor.metrics().reorganizations(), 0);
    assert_eq!(processor.state_root(), processed[69].header().state_root);

    Ok(())
}

#[test]
fn invalid_middle_block_rolls_back_and_keeps_stored_receipts() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 5);
    let entry_root = scenario.entry_root();

    // Corrupt the fifth block's state root and re-link a successor so the
    // bad block sits mid-branch.
    let mut blocks = scenario.blocks.clone();
    let tampered = {
        let good = &blocks[4];
        let mut header = good.header().clone();
        header.state_root = B256::repeat_byte(0xde);
        Arc::new(Block::new(
            header,
            good.transactions().to_vec(),
            good.ommers().to_vec(),
            good.withdrawals().map(<[Withdrawal]>::to_vec),
        ))
    };
    let successor = {
        let mut header = blocks[4].header().clone();
        header.parent_hash = tampered.hash();
        header.number = 6;
        Arc::new(Block::new(header, Vec::new(), Vec::new(), None))
    };
    blocks[4] = tampered.clone();
    blocks.push(successor);

    let mut processor = scenario.processor();
    let result = processor.process(
        Some(entry_root),
        blocks,
        ProcessingOptions::STORE_RECEIPTS,
        Arc::new(NoopBlockTracer),
    );

    match result {
        Err(BlockProcessorError::InvalidBlock { block_hash, .. }) => {
            assert_eq!(block_hash, tampered.hash());
        }
        other => panic!("expected InvalidBlock, got {other:?}"),
    }

    // Atomicity: the world state is back at the entry checkpoint.
    assert_eq!(processor.state_root(), entry_root);
    // Receipt persistence is incremental and not rolled back.
    assert_eq!(scenario.storage.inserted_blocks(), vec![1, 2, 3, 4]);

    Ok(())
}

#[test]
fn execution_failure_restores_the_entry_checkpoint() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 2);
    let entry_root = scenario.entry_root();

    // A third block whose transfer exceeds the sender's funds.
    let mut blocks = scenario.blocks.clone();
    let broke = {
        let mut header = blocks[1].header().clone();
        header.parent_hash = blocks[1].hash();
        header.number = 3;
        Arc::new(Block::new(
            header,
            vec![transfer(ALICE, BOB, U256::from(u128::MAX), 2)],
            Vec::new(),
            None,
        ))
    };
    blocks.push(broke);

    let mut processor = scenario.processor();
    let result = processor.process(
        Some(entry_root),
        blocks,
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    );

    assert!(matches!(result, Err(BlockProcessorError::Execution(_))));
    assert_eq!(processor.state_root(), entry_root);

    Ok(())
}

#[test]
fn read_only_chain_skips_witnesses_and_block_events() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 2);
    let mut processor = scenario.processor();

    let processed = processor.process(
        Some(scenario.entry_root()),
        scenario.blocks.clone(),
        ProcessingOptions::READ_ONLY_CHAIN,
        Arc::new(NoopBlockTracer),
    )?;

    assert_eq!(processed.len(), 2);
    assert!(scenario
        .observer
        .observed()
        .iter()
        .all(|event| !matches!(event, ObservedEvent::BlockProcessed { .. })));
    assert!(scenario
        .witness
        .ops()
        .iter()
        .all(|op| !matches!(op, WitnessOp::Persist(_))));

    Ok(())
}

#[test]
fn do_not_update_head_restores_the_entry_checkpoint() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 3);
    let entry_root = scenario.entry_root();
    let mut processor = scenario.processor();

    let processed = processor.process(
        Some(entry_root),
        scenario.blocks.clone(),
        ProcessingOptions::DO_NOT_UPDATE_HEAD | ProcessingOptions::STORE_RECEIPTS,
        Arc::new(NoopBlockTracer),
    )?;

    assert_eq!(processed.len(), 3);
    assert_eq!(processor.state_root(), entry_root);
    // Receipts were still produced and written.
    assert_eq!(scenario.storage.inserted_blocks(), vec![1, 2, 3]);

    Ok(())
}

#[test]
fn processing_is_deterministic() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 4);
    let entry_root = scenario.entry_root();

    let run = || -> anyhow::Result<(Vec<Arc<Block>>, B256)> {
        let mut processor = test_processor(
            scenario.state.clone(),
            scenario.provider.clone(),
            Arc::new(NoopReceiptStorage),
            Arc::new(NoopWitnessCollector),
            Arc::new(Events::default()),
        );
        let processed = processor.process(
            Some(entry_root),
            scenario.blocks.clone(),
            ProcessingOptions::empty(),
            Arc::new(NoopBlockTracer),
        )?;
        Ok((processed, processor.state_root()))
    };

    let (first, first_root) = run()?;
    let (second, second_root) = run()?;

    assert_eq!(first, second);
    assert_eq!(first_root, second_root);

    Ok(())
}

#[test]
fn events_are_ordered_per_block() -> anyhow::Result<()> {
    let state = funded_state();
    let provider = london_provider();
    let templates = vec![
        TemplateBlock::new(vec![
            transfer(ALICE, BOB, U256::from(1), 0),
            transfer(BOB, ALICE, U256::from(2), 0),
        ]),
        TemplateBlock::new(vec![transfer(ALICE, BOB, U256::from(3), 1)]),
    ];
    let blocks = seal_branch(&state, provider.clone(), 1, GENESIS_HASH, templates);
    let scenario = Scenario::with_blocks(state, provider, blocks);

    let mut processor = scenario.processor();
    processor.process(
        Some(scenario.entry_root()),
        scenario.blocks.clone(),
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    )?;

    assert_eq!(
        scenario.observer.observed(),
        vec![
            ObservedEvent::BranchStarting { blocks: 2 },
            ObservedEvent::TransactionProcessed { index: 0 },
            ObservedEvent::TransactionProcessed { index: 1 },
            ObservedEvent::BlockProcessed {
                number: 1,
                receipts: 2
            },
            ObservedEvent::TransactionProcessed { index: 0 },
            ObservedEvent::BlockProcessed {
                number: 2,
                receipts: 1
            },
        ]
    );

    Ok(())
}

#[test]
fn observer_failure_aborts_the_branch_and_rolls_back() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 3);
    let entry_root = scenario.entry_root();
    scenario.events.subscribe(Arc::new(FailingObserver {
        fail_on_block_number: 2,
    }));

    let mut processor = scenario.processor();
    let result = processor.process(
        Some(entry_root),
        scenario.blocks.clone(),
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    );

    assert!(matches!(result, Err(BlockProcessorError::Observer(_))));
    assert_eq!(processor.state_root(), entry_root);

    Ok(())
}

#[test]
fn non_contiguous_branches_are_rejected() {
    let scenario = Scenario::transfers(london_provider(), 3);
    let mut blocks = scenario.blocks.clone();
    blocks.swap(1, 2);

    let mut processor = scenario.processor();
    let result = processor.process(
        Some(scenario.entry_root()),
        blocks,
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    );

    assert!(matches!(
        result,
        Err(BlockProcessorError::NonContiguousBranch { index: 1 })
    ));
    // Nothing ran: not even the branch-starting event.
    assert!(scenario.observer.observed().is_empty());
}

#[test]
fn empty_branches_are_a_no_op() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 1);
    let mut processor = scenario.processor();

    let processed = processor.process(
        Some(scenario.entry_root()),
        Vec::new(),
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    )?;

    assert!(processed.is_empty());
    assert!(scenario.observer.observed().is_empty());

    Ok(())
}

#[test]
fn witness_scope_wraps_the_branch() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 2);
    let mut processor = scenario.processor();

    processor.process(
        Some(scenario.entry_root()),
        scenario.blocks.clone(),
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    )?;

    let ops = scenario.witness.ops();
    assert_eq!(
        ops,
        vec![
            WitnessOp::Begin,
            WitnessOp::Reset,
            WitnessOp::Persist(scenario.blocks[0].hash()),
            WitnessOp::Reset,
            WitnessOp::Persist(scenario.blocks[1].hash()),
            WitnessOp::End,
        ]
    );

    Ok(())
}

#[test]
fn rewards_are_traced() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 2);
    let mut processor = scenario.processor();
    let tracer = Arc::new(RecordingTracer::default());

    processor.process(
        Some(scenario.entry_root()),
        scenario.blocks.clone(),
        ProcessingOptions::empty(),
        tracer.clone(),
    )?;

    // One block reward per block under London rules.
    assert_eq!(tracer.rewards().len(), 2);
    assert_eq!(tracer.block_traces(), vec![1, 2]);
    assert_eq!(tracer.ended(), 2);

    Ok(())
}

#[test]
fn dao_transition_fires_once_at_its_height() -> anyhow::Result<()> {
    let charlie = Address::repeat_byte(0xcc);
    let dave = Address::repeat_byte(0xdf);
    let vault = Address::repeat_byte(0xfa);
    let value = U256::from(5_000);

    let state = TrieState::with_accounts([
        (ALICE, U256::from(1_000_000_000_000u64)),
        (charlie, value),
        (dave, value),
    ]);
    let provider: Arc<dyn SpecProvider> = Arc::new(
        ScheduleSpecProvider::with_hardfork(Hardfork::Dao).with_dao_fork(DaoForkConfig {
            activation_block: 2,
            withdrawal_account: vault,
            drained_accounts: vec![charlie, dave],
        }),
    );

    let templates = (0..3)
        .map(|offset| TemplateBlock::new(vec![transfer(ALICE, BOB, U256::from(1), offset)]))
        .collect();
    let blocks = seal_branch(&state, provider.clone(), 1, GENESIS_HASH, templates);
    let scenario = Scenario::with_blocks(state, provider, blocks);
    let entry_root = scenario.entry_root();

    let mut processor = scenario.processor();
    processor.process(
        Some(entry_root),
        scenario.blocks.clone(),
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    )?;

    assert_eq!(processor.state().balance(&vault), value + value);
    assert_eq!(processor.state().balance(&charlie), U256::ZERO);
    assert_eq!(processor.state().balance(&dave), U256::ZERO);
    let first_run_root = processor.state_root();

    // Re-running the same branch against restored state moves exactly one
    // copy of the balances again, not two.
    let mut second = scenario.processor();
    second.process(
        Some(entry_root),
        scenario.blocks.clone(),
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    )?;
    assert_eq!(second.state().balance(&vault), value + value);
    assert_eq!(second.state_root(), first_run_root);

    Ok(())
}

#[test]
fn withdrawals_are_credited_in_gwei() -> anyhow::Result<()> {
    let recipient = Address::repeat_byte(0x77);
    let state = funded_state();
    let provider = provider_for(Hardfork::Shanghai);

    let templates = vec![TemplateBlock::new(vec![transfer(
        ALICE,
        BOB,
        U256::from(1),
        0,
    )])
    .with_withdrawals(vec![Withdrawal {
        index: 0,
        validator_index: 9,
        address: recipient,
        amount: 3,
    }])];
    let blocks = seal_branch(&state, provider.clone(), 1, GENESIS_HASH, templates);
    let scenario = Scenario::with_blocks(state, provider, blocks);

    let mut processor = scenario.processor();
    processor.process(
        Some(scenario.entry_root()),
        scenario.blocks.clone(),
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    )?;

    assert_eq!(
        processor.state().balance(&recipient),
        U256::from(3) * U256::from(GWEI_TO_WEI)
    );

    Ok(())
}

#[test]
fn blob_gas_and_beacon_roots_are_applied_post_cancun() -> anyhow::Result<()> {
    let beacon_root = B256::repeat_byte(0x99);
    let state = funded_state();
    let provider = provider_for(Hardfork::Cancun);

    let templates = vec![TemplateBlock::new(vec![blob_transfer(
        ALICE,
        BOB,
        U256::from(1),
        0,
        2,
    )])
    .with_parent_beacon_root(beacon_root)];
    let blocks = seal_branch(&state, provider.clone(), 1, GENESIS_HASH, templates);
    let scenario = Scenario::with_blocks(state, provider, blocks);

    let mut processor = scenario.processor();
    let processed = processor.process(
        Some(scenario.entry_root()),
        scenario.blocks.clone(),
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    )?;

    assert_eq!(
        processed[0].header().blob_gas,
        Some(BlobGas {
            gas_used: 2 * 131_072,
            excess_gas: 0,
        })
    );

    // The ring buffer carries the timestamp and the parent beacon root.
    let timestamp = processed[0].header().timestamp;
    let timestamp_slot = U256::from(timestamp % BEACON_ROOTS_HISTORY_BUFFER_LENGTH);
    let root_slot = timestamp_slot + U256::from(BEACON_ROOTS_HISTORY_BUFFER_LENGTH);
    assert_eq!(
        processor.state().storage(&BEACON_ROOTS_ADDRESS, &timestamp_slot),
        U256::from(timestamp)
    );
    assert_eq!(
        processor.state().storage(&BEACON_ROOTS_ADDRESS, &root_slot),
        U256::from_be_bytes(beacon_root.0)
    );

    Ok(())
}

#[test]
fn genesis_state_root_is_kept_when_genesis_state_is_unavailable() -> anyhow::Result<()> {
    let provider: Arc<dyn SpecProvider> = Arc::new(
        ScheduleSpecProvider::with_hardfork(Hardfork::London).with_genesis_state_unavailable(),
    );
    let state = funded_state();

    // A genesis block whose suggested state root cannot be recomputed.
    let suggested_root = B256::repeat_byte(0x42);
    let genesis = {
        let mut header = arbor_eth::BlockHeader {
            number: 0,
            gas_limit: 8_000_000,
            ..arbor_eth::BlockHeader::default()
        };
        header.state_root = suggested_root;
        Arc::new(Block::new(header, Vec::new(), Vec::new(), None))
    };

    let mut processor = test_processor(
        state,
        provider,
        Arc::new(NoopReceiptStorage),
        Arc::new(NoopWitnessCollector),
        Arc::new(Events::default()),
    );
    let processed = processor.process(
        None,
        vec![genesis],
        ProcessingOptions::NO_VALIDATION,
        Arc::new(NoopBlockTracer),
    )?;

    assert_eq!(processed[0].header().state_root, suggested_root);

    Ok(())
}

#[test]
fn gas_and_fees_balance_out() -> anyhow::Result<()> {
    let scenario = Scenario::transfers(london_provider(), 1);
    let mut processor = scenario.processor();

    let alice_before = U256::from(arbor_processor::test_utils::ETHER);
    processor.process(
        Some(scenario.entry_root()),
        scenario.blocks.clone(),
        ProcessingOptions::empty(),
        Arc::new(NoopBlockTracer),
    )?;

    let fee = U256::from(10) * U256::from(TRANSFER_GAS);
    assert_eq!(
        processor.state().balance(&ALICE),
        alice_before - U256::from(1_000) - fee
    );
    assert_eq!(processed_gas(&scenario.blocks[0]), TRANSFER_GAS);

    Ok(())
}

fn processed_gas(block: &Block) -> u64 {
    block.header().gas_used
}
