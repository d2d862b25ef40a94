//! Ethereum account types

use alloy_rlp::{RlpDecodable, RlpEncodable};
use arbor_primitives::{HashMap, B256, KECCAK_EMPTY, KECCAK_NULL_RLP, U256};
use arbor_trie::sec_trie_root;

/// Account storage mapping of indices to values.
pub type AccountStorage = HashMap<U256, U256>;

/// The RLP form of an account, as it is keyed into the state trie.
#[derive(Clone, Debug, PartialEq, Eq, RlpDecodable, RlpEncodable)]
pub struct BasicAccount {
    /// Nonce of the account.
    pub nonce: u64,
    /// Balance of the account.
    pub balance: U256,
    /// Storage root of the account.
    pub storage_root: B256,
    /// Code hash of the account.
    pub code_hash: B256,
}

impl Default for BasicAccount {
    fn default() -> Self {
        BasicAccount {
            balance: U256::ZERO,
            nonce: 0,
            code_hash: KECCAK_EMPTY,
            storage_root: KECCAK_NULL_RLP,
        }
    }
}

/// A mutable account: balance, nonce, code hash and storage slots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountState {
    /// Nonce of the account.
    pub nonce: u64,
    /// Balance of the account, in wei.
    pub balance: U256,
    /// Code hash of the account; `KECCAK_EMPTY` for plain accounts.
    pub code_hash: Option<B256>,
    /// Storage slots of the account.
    pub storage: AccountStorage,
}

impl AccountState {
    /// Constructs an account with the provided opening balance.
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Whether the account is empty: zero nonce, zero balance, no code and
    /// no populated storage. Accounts holding only storage stay live; this
    /// model carries no code bytes for system contracts, so their storage is
    /// what keeps them from being reaped.
    pub fn is_empty(&self) -> bool {
        self.nonce == 0
            && self.balance == U256::ZERO
            && self.code_hash.is_none()
            && self.storage.values().all(|value| *value == U256::ZERO)
    }

    /// Computes the storage root of the account.
    pub fn storage_root(&self) -> B256 {
        storage_root(&self.storage)
    }

    /// Converts the account into its trie representation.
    pub fn to_basic(&self) -> BasicAccount {
        BasicAccount {
            nonce: self.nonce,
            balance: self.balance,
            storage_root: self.storage_root(),
            code_hash: self.code_hash.unwrap_or(KECCAK_EMPTY),
        }
    }
}

/// Calculates the storage root hash of the provided storage.
pub fn storage_root<'a, I>(storage: I) -> B256
where
    I: IntoIterator<Item = (&'a U256, &'a U256)>,
{
    sec_trie_root(
        storage
            .into_iter()
            .filter(|(_, value)| **value != U256::ZERO)
            .map(|(index, value)| {
                let value = alloy_rlp::encode(value);
                (index.to_be_bytes::<32>(), value)
            }),
    )
}
