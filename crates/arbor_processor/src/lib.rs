#![warn(missing_docs)]

//! Branch-oriented block processing
//!
//! Given a contiguous branch of suggested blocks and the state root the
//! branch begins at, the processor deterministically re-executes every block
//! against the world state, produces per-transaction receipts, computes the
//! consensus roots, validates the result against the suggested blocks and
//! commits state so that any failure rolls back to a checkpoint.

/// Pre-execution beacon-root contract updates
pub mod beacon;
mod block;
mod branch;
/// DAO-transition configuration and application
pub mod dao;
mod error;
/// Branch-processing event surface
pub mod events;
mod executor;
mod hash_task;
mod metrics;
mod options;
/// Block reward calculation and application
pub mod rewards;
/// Protocol rule resolution
pub mod spec;
mod storage;
/// Tracing surface for block processing
pub mod tracer;
mod validator;
mod withdrawals;
/// Witness collection scopes
pub mod witness;

/// Test doubles and fixtures
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use self::{
    block::{BlockProcessor, ReceiptsRootCalculator, TrieReceiptsRootCalculator},
    branch::BranchProcessor,
    dao::DaoForkConfig,
    error::{BlockProcessorError, ExecutionError, ObserverError},
    events::{BranchObserver, Events},
    executor::TransactionsExecutor,
    metrics::ProcessorMetrics,
    options::ProcessingOptions,
    rewards::{BlockReward, ClassicRewardCalculator, NoRewards, RewardCalculator},
    spec::{ScheduleSpecProvider, SpecProvider},
    storage::{NoopReceiptStorage, ReceiptStorage},
    tracer::{BlockTracer, NoopBlockTracer, ReceiptsTracer, RewardKind},
    validator::{BlockValidator, SuggestedHeaderValidator},
    witness::{NoopWitnessCollector, WitnessCollector, WitnessScope},
};
