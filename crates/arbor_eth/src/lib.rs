#![warn(missing_docs)]

//! Ethereum domain types
//!
//! The block, header, transaction, receipt and protocol-rule types consumed
//! by the arbor block processor. They are based on the same primitive types
//! as the rest of the workspace.

/// Ethereum block and header types
pub mod block;
/// Hardfork identifiers and activation schedules
pub mod hardfork;
/// Execution log types
pub mod log;
/// Transaction receipt types
pub mod receipt;
/// Block reward schedule
pub mod reward;
/// Protocol rule bundles
pub mod spec;
/// Ethereum transaction types
pub mod transaction;
/// Ethereum withdrawal type
pub mod withdrawal;

pub use self::{
    block::{BlobGas, Block, BlockHeader},
    hardfork::{Activations, ForkCondition, Hardfork},
    log::ExecutionLog,
    receipt::Receipt,
    spec::Spec,
    transaction::SignedTransaction,
    withdrawal::Withdrawal,
};
