#![warn(missing_docs)]

//! World-state types for the arbor block processor.
//!
//! The [`WorldState`] trait is the narrow mutation interface the processor
//! drives: balance math, account existence and creation, commit points,
//! state-root recomputation and restoration to a prior root. [`TrieState`]
//! is the in-memory implementation backing tests and light deployments.

pub mod account;
mod error;
mod trie_state;

use arbor_eth::Spec;
use arbor_primitives::{Address, B256, U256};
use auto_impl::auto_impl;

pub use self::{error::StateError, trie_state::TrieState};

/// Observer of the state changes applied by a commit.
///
/// Used to surface reward- and withdrawal-induced state deltas to tracers.
/// Implementations must not mutate state; all hooks default to no-ops.
pub trait StateChangeTracer {
    /// An account was created with the provided opening balance.
    fn account_created(&self, _address: Address, _balance: U256) {}

    /// An account's balance changed.
    fn balance_changed(&self, _address: Address, _before: U256, _after: U256) {}

    /// A storage slot changed.
    fn storage_changed(&self, _address: Address, _index: U256, _before: U256, _after: U256) {}
}

/// The world-state mutation interface driven by the block processor.
///
/// The world state is a shared mutable resource exclusively driven by one
/// processing thread for the duration of a branch; no concurrent mutator is
/// allowed.
#[auto_impl(&mut, Box)]
pub trait WorldState {
    /// The current state-root fingerprint. Refreshed by
    /// [`WorldState::recalculate_state_root`], [`WorldState::commit_tree`]
    /// and [`WorldState::set_state_root`]; plain mutations leave it stale
    /// until the next recomputation point.
    fn state_root(&self) -> B256;

    /// Restores the state to a previously-observed root. After the call the
    /// state behaves as it did before any mutation that followed that root.
    fn set_state_root(&mut self, state_root: B256) -> Result<(), StateError>;

    /// Discards all uncommitted changes.
    fn reset(&mut self);

    /// Applies all uncommitted changes under the provided rules. Idempotent
    /// within a block: a second commit with no intervening mutation is a
    /// no-op.
    fn commit(&mut self, spec: &Spec) -> Result<(), StateError>;

    /// As [`WorldState::commit`], reporting every applied change to the
    /// provided tracer.
    fn commit_traced(
        &mut self,
        spec: &Spec,
        tracer: &dyn StateChangeTracer,
    ) -> Result<(), StateError>;

    /// Persists the committed state as the trie for the provided block
    /// number, making the resulting root restorable.
    fn commit_tree(&mut self, block_number: u64) -> Result<(), StateError>;

    /// Recomputes the state root from the committed state and returns it.
    fn recalculate_state_root(&mut self) -> B256;

    /// Whether an account exists at the provided address.
    fn account_exists(&self, address: &Address) -> bool;

    /// Creates an account with the provided opening balance. The balance is
    /// an initial value, not a transfer.
    fn create_account(&mut self, address: Address, balance: U256);

    /// Adds to the balance of the account at the provided address.
    fn add_to_balance(&mut self, address: Address, value: U256, spec: &Spec);

    /// Subtracts from the balance of the account at the provided address.
    fn subtract_from_balance(
        &mut self,
        address: Address,
        value: U256,
        spec: &Spec,
    ) -> Result<(), StateError>;

    /// Returns the balance of the account at the provided address.
    fn balance(&self, address: &Address) -> U256;

    /// Sets the storage slot at the provided address and index, creating the
    /// account if it does not exist.
    fn set_storage(&mut self, address: Address, index: U256, value: U256);

    /// Returns the value of the storage slot at the provided address and
    /// index.
    fn storage(&self, address: &Address, index: &U256) -> U256;
}
