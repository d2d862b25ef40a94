// Part of this code was adapted from foundry and is distributed under their
// licenses:
// - https://github.com/foundry-rs/foundry/blob/01b16238ff87dc7ca8ee3f5f13e389888c2a2ee4/LICENSE-APACHE
// - https://github.com/foundry-rs/foundry/blob/01b16238ff87dc7ca8ee3f5f13e389888c2a2ee4/LICENSE-MIT
// For the original context see: https://github.com/foundry-rs/foundry/blob/01b16238ff87dc7ca8ee3f5f13e389888c2a2ee4/anvil/core/src/eth/trie.rs

#![warn(missing_docs)]
//! Merkle-Patricia trie root functions.
//!
//! Consensus roots in this workspace are plain root hashes: the state root is
//! a secure trie over RLP-encoded accounts, the receipts root an ordered trie
//! over RLP-encoded receipts. Only the roots are needed, so the tries are
//! built transiently.

use arbor_primitives::B256;
use hash256_std_hasher::Hash256StdHasher;
use sha3::{
    digest::generic_array::{typenum::consts::U32, GenericArray},
    Digest, Keccak256,
};

/// Computes the trie root of the provided key/value pairs.
pub fn trie_root<I, K, V>(input: I) -> B256
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]> + Ord,
    V: AsRef<[u8]>,
{
    B256::from_slice(triehash::trie_root::<KeccakHasher, _, _, _>(input).as_ref())
}

/// Computes the secure (key-hashed) trie root of the provided key/value
/// pairs. State and storage roots use this form.
pub fn sec_trie_root<I, K, V>(input: I) -> B256
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    B256::from_slice(triehash::sec_trie_root::<KeccakHasher, _, _, _>(input).as_ref())
}

/// Computes the trie root of the provided values, keyed by their index.
/// Transaction, receipt and withdrawal roots use this form.
pub fn ordered_trie_root<I, V>(input: I) -> B256
where
    I: IntoIterator<Item = V>,
    V: AsRef<[u8]>,
{
    B256::from_slice(triehash::ordered_trie_root::<KeccakHasher, I>(input).as_ref())
}

struct KeccakHasher;

impl hash_db::Hasher for KeccakHasher {
    type Out = GenericArray<u8, U32>;

    type StdHasher = Hash256StdHasher;

    const LENGTH: usize = 32;

    fn hash(x: &[u8]) -> Self::Out {
        Keccak256::digest(x)
    }
}
