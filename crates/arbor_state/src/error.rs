use arbor_primitives::{Address, B256, U256};

/// Errors raised by world-state operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// The requested state root is not available in the backing store.
    #[error("state root `{0}` is not available")]
    StateRootNotFound(B256),
    /// A balance subtraction would underflow.
    #[error("account {address} has insufficient balance: {balance} < {required}")]
    InsufficientBalance {
        /// The account whose balance was debited.
        address: Address,
        /// The balance at the time of the debit.
        balance: U256,
        /// The amount the debit required.
        required: U256,
    },
}
