#![warn(missing_docs)]

//! Primitive types for the arbor workspace.
//!
//! Re-exports the `alloy` primitive types the rest of the workspace is built
//! on, together with a handful of well-known Ethereum constants.

pub use alloy_primitives::{
    address, b256, bytes, hex,
    map::{HashMap, HashSet},
    Address, Bloom, BloomInput, Bytes, TxKind, B256, B64, U256,
};

/// Re-export of the Keccak-256 hash function.
pub use alloy_primitives::keccak256;

/// Keccak-256 hash of the empty byte sequence.
pub const KECCAK_EMPTY: B256 =
    b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");

/// Keccak-256 hash of the RLP encoding of the empty string; the root of an
/// empty Merkle-Patricia trie.
pub const KECCAK_NULL_RLP: B256 =
    b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

/// Number of wei in one gwei.
pub const GWEI_TO_WEI: u64 = 1_000_000_000;
