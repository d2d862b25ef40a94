use std::sync::OnceLock;

use alloy_rlp::RlpEncodable;
use arbor_primitives::{keccak256, Address, Bytes, TxKind, B256, U256};

/// Gas consumed by a single blob (EIP-4844).
pub const GAS_PER_BLOB: u64 = 131_072;

/// A signed transaction, with its sender already recovered.
///
/// Signature recovery happens on the admission path, before a transaction
/// reaches the processor; the recovered sender travels with the payload.
#[derive(Clone, Debug, RlpEncodable)]
pub struct SignedTransaction {
    // The order of these fields determines encoding order.
    /// Sender nonce.
    pub nonce: u64,
    /// Price per unit of gas.
    pub gas_price: U256,
    /// Gas limit of the transaction.
    pub gas_limit: u64,
    /// Call target, or contract creation.
    pub kind: TxKind,
    /// Transferred value.
    pub value: U256,
    /// Call data.
    pub input: Bytes,
    /// Recovered sender.
    pub caller: Address,
    /// Versioned blob hashes (EIP-4844); empty for non-blob transactions.
    pub blob_hashes: Vec<B256>,
    /// Cached transaction hash
    #[rlp(skip)]
    pub hash: OnceLock<B256>,
    /// Cached RLP-encoding
    #[rlp(skip)]
    pub rlp_encoding: OnceLock<Bytes>,
}

impl SignedTransaction {
    /// Returns the RLP encoding of the transaction, computing and caching it
    /// on first use.
    pub fn rlp_encoding(&self) -> &Bytes {
        self.rlp_encoding
            .get_or_init(|| alloy_rlp::encode(self).into())
    }

    /// Returns the transaction hash, computing and caching it on first use.
    ///
    /// The cache is a single-shot store: a background precomputation worker
    /// and the foreground pipeline may race on it safely.
    pub fn transaction_hash(&self) -> &B256 {
        self.hash.get_or_init(|| keccak256(self.rlp_encoding()))
    }

    /// Total blob gas consumed by this transaction, if it carries blobs.
    pub fn total_blob_gas(&self) -> Option<u64> {
        if self.blob_hashes.is_empty() {
            None
        } else {
            Some(GAS_PER_BLOB * self.blob_hashes.len() as u64)
        }
    }
}

impl PartialEq for SignedTransaction {
    fn eq(&self, other: &Self) -> bool {
        self.nonce == other.nonce
            && self.gas_price == other.gas_price
            && self.gas_limit == other.gas_limit
            && self.kind == other.kind
            && self.value == other.value
            && self.input == other.input
            && self.caller == other.caller
            && self.blob_hashes == other.blob_hashes
    }
}

impl Eq for SignedTransaction {}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_transaction() -> SignedTransaction {
        SignedTransaction {
            nonce: 1,
            gas_price: U256::from(2),
            gas_limit: 21_000,
            kind: TxKind::Call(Address::repeat_byte(0xc0)),
            value: U256::from(4),
            input: Bytes::from_static(b"\x12\x34"),
            caller: Address::repeat_byte(0x0a),
            blob_hashes: Vec::new(),
            hash: OnceLock::new(),
            rlp_encoding: OnceLock::new(),
        }
    }

    #[test]
    fn transaction_hash_is_cached() {
        let transaction = dummy_transaction();

        let first = *transaction.transaction_hash();
        let second = *transaction.transaction_hash();

        assert_eq!(first, second);
        assert_eq!(first, keccak256(alloy_rlp::encode(&transaction)));
    }

    #[test]
    fn hash_distinguishes_callers() {
        let a = dummy_transaction();
        let mut b = dummy_transaction();
        b.caller = Address::repeat_byte(0x0b);

        assert_ne!(a.transaction_hash(), b.transaction_hash());
    }

    #[test]
    fn blob_gas_is_per_blob() {
        let mut transaction = dummy_transaction();
        assert_eq!(transaction.total_blob_gas(), None);

        transaction.blob_hashes = vec![B256::repeat_byte(1), B256::repeat_byte(2)];
        assert_eq!(transaction.total_blob_gas(), Some(2 * GAS_PER_BLOB));
    }
}
