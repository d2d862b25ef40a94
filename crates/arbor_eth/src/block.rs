use std::sync::OnceLock;

use alloy_rlp::{RlpDecodable, RlpEncodable};
use arbor_primitives::{keccak256, Address, Bloom, Bytes, B256, B64, KECCAK_NULL_RLP, U256};

use crate::{transaction::SignedTransaction, withdrawal::Withdrawal};

/// Blob gas fields of a header (EIP-4844).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, RlpDecodable, RlpEncodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct BlobGas {
    /// The total amount of blob gas consumed by the transactions within the
    /// block.
    pub gas_used: u64,
    /// Running total of blob gas consumed in excess of the target, prior to
    /// the block. Blocks with above-target blob gas consumption increase this
    /// value, blocks with below-target blob gas consumption decrease it.
    pub excess_gas: u64,
}

/// An Ethereum block header.
///
/// The pre-execution fields describe the block's position and limits; the
/// post-execution fields (state root, receipts root, logs bloom, gas used,
/// blob gas used) are authoritative outputs of block processing.
#[derive(Clone, Debug, Default, PartialEq, Eq, RlpDecodable, RlpEncodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[rlp(trailing)]
pub struct BlockHeader {
    /// The parent block's hash
    pub parent_hash: B256,
    /// The ommers' root hash
    pub ommers_hash: B256,
    /// The block's beneficiary address
    pub beneficiary: Address,
    /// The state's root hash
    pub state_root: B256,
    /// The transactions' root hash
    pub transactions_root: B256,
    /// The receipts' root hash
    pub receipts_root: B256,
    /// The logs' bloom
    pub logs_bloom: Bloom,
    /// The block's difficulty
    pub difficulty: U256,
    /// The block's number
    pub number: u64,
    /// The block's gas limit
    pub gas_limit: u64,
    /// The amount of gas used by the block
    pub gas_used: u64,
    /// The block's timestamp
    pub timestamp: u64,
    /// The block's extra data
    pub extra_data: Bytes,
    /// The block's mix hash (or prevrandao post-merge)
    pub mix_hash: B256,
    /// The block's nonce
    pub nonce: B64,
    /// `BaseFee` was added by EIP-1559 and is ignored in legacy headers.
    pub base_fee_per_gas: Option<u128>,
    /// `WithdrawalsRoot` was added by EIP-4895 and is ignored in legacy
    /// headers.
    pub withdrawals_root: Option<B256>,
    /// Blob gas was added by EIP-4844 and is ignored in older headers.
    pub blob_gas: Option<BlobGas>,
    /// The hash tree root of the parent beacon block for the given execution
    /// block (EIP-4788).
    pub parent_beacon_block_root: Option<B256>,
}

impl BlockHeader {
    /// Calculates the block's hash.
    pub fn hash(&self) -> B256 {
        let encoded = alloy_rlp::encode(self);
        keccak256(encoded)
    }

    /// Produces a sibling header for processing: pre-execution fields are
    /// copied, post-execution fields are cleared to neutral values, and the
    /// identity fields (beneficiary, mix hash, nonce) are preserved so the
    /// processed hash can later be compared against the suggested one.
    ///
    /// When `keep_state_root` is set the suggested state root is carried over
    /// instead of cleared; processing then skips state-root recomputation.
    pub fn for_processing(&self, keep_state_root: bool) -> Self {
        Self {
            parent_hash: self.parent_hash,
            ommers_hash: self.ommers_hash,
            beneficiary: self.beneficiary,
            state_root: if keep_state_root {
                self.state_root
            } else {
                KECCAK_NULL_RLP
            },
            transactions_root: self.transactions_root,
            receipts_root: KECCAK_NULL_RLP,
            logs_bloom: Bloom::ZERO,
            difficulty: self.difficulty,
            number: self.number,
            gas_limit: self.gas_limit,
            gas_used: 0,
            timestamp: self.timestamp,
            extra_data: self.extra_data.clone(),
            mix_hash: self.mix_hash,
            nonce: self.nonce,
            base_fee_per_gas: self.base_fee_per_gas,
            withdrawals_root: self.withdrawals_root,
            blob_gas: self.blob_gas.map(|blob_gas| BlobGas {
                gas_used: 0,
                excess_gas: blob_gas.excess_gas,
            }),
            parent_beacon_block_root: self.parent_beacon_block_root,
        }
    }
}

/// An Ethereum block: a header together with its transactions, ommers and
/// (post-Shanghai) withdrawals.
#[derive(Clone, Debug)]
pub struct Block {
    header: BlockHeader,
    transactions: Vec<SignedTransaction>,
    ommers: Vec<BlockHeader>,
    withdrawals: Option<Vec<Withdrawal>>,
    /// Cached block hash
    hash: OnceLock<B256>,
}

impl Block {
    /// Constructs a block from its parts.
    pub fn new(
        header: BlockHeader,
        transactions: Vec<SignedTransaction>,
        ommers: Vec<BlockHeader>,
        withdrawals: Option<Vec<Withdrawal>>,
    ) -> Self {
        Self {
            header,
            transactions,
            ommers,
            withdrawals,
            hash: OnceLock::new(),
        }
    }

    /// Returns the block's hash, computing and caching it on first use.
    /// Compute it only once the header is final.
    pub fn hash(&self) -> B256 {
        *self.hash.get_or_init(|| self.header.hash())
    }

    /// Returns the block's header.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// Returns a mutable reference to the block's header, discarding any
    /// cached hash.
    pub fn header_mut(&mut self) -> &mut BlockHeader {
        self.hash = OnceLock::new();
        &mut self.header
    }

    /// Returns the block's transactions.
    pub fn transactions(&self) -> &[SignedTransaction] {
        &self.transactions
    }

    /// Returns the block's ommers.
    pub fn ommers(&self) -> &[BlockHeader] {
        &self.ommers
    }

    /// Returns the block's withdrawals, if the block carries any.
    pub fn withdrawals(&self) -> Option<&[Withdrawal]> {
        self.withdrawals.as_deref()
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.transactions == other.transactions
            && self.ommers == other.ommers
            && self.withdrawals == other.withdrawals
    }
}

impl Eq for Block {}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_header() -> BlockHeader {
        BlockHeader {
            parent_hash: B256::repeat_byte(0x01),
            beneficiary: Address::repeat_byte(0x02),
            state_root: B256::repeat_byte(0x03),
            receipts_root: B256::repeat_byte(0x04),
            logs_bloom: Bloom::repeat_byte(0x05),
            difficulty: U256::from(6),
            number: 7,
            gas_limit: 8_000_000,
            gas_used: 21_000,
            timestamp: 9,
            extra_data: Bytes::from_static(b"arbor"),
            mix_hash: B256::repeat_byte(0x0a),
            nonce: B64::repeat_byte(0x0b),
            base_fee_per_gas: Some(7),
            withdrawals_root: Some(B256::repeat_byte(0x0d)),
            blob_gas: Some(BlobGas {
                gas_used: 131_072,
                excess_gas: 262_144,
            }),
            parent_beacon_block_root: Some(B256::repeat_byte(0x0c)),
            ..BlockHeader::default()
        }
    }

    #[test]
    fn header_rlp_round_trip() {
        use alloy_rlp::Decodable as _;

        let header = dummy_header();
        let encoded = alloy_rlp::encode(&header);
        let decoded = BlockHeader::decode(&mut encoded.as_slice()).unwrap();

        assert_eq!(header, decoded);
    }

    #[test]
    fn hash_depends_on_fields() {
        let header = dummy_header();
        let mut changed = header.clone();
        changed.gas_used = 42_000;

        assert_ne!(header.hash(), changed.hash());
    }

    #[test]
    fn processing_copy_clears_outputs() {
        let header = dummy_header();
        let copy = header.for_processing(false);

        assert_eq!(copy.state_root, KECCAK_NULL_RLP);
        assert_eq!(copy.receipts_root, KECCAK_NULL_RLP);
        assert_eq!(copy.logs_bloom, Bloom::ZERO);
        assert_eq!(copy.gas_used, 0);
        assert_eq!(copy.blob_gas.unwrap().gas_used, 0);

        // pre-execution and identity fields survive
        assert_eq!(copy.parent_hash, header.parent_hash);
        assert_eq!(copy.number, header.number);
        assert_eq!(copy.gas_limit, header.gas_limit);
        assert_eq!(copy.timestamp, header.timestamp);
        assert_eq!(copy.extra_data, header.extra_data);
        assert_eq!(copy.beneficiary, header.beneficiary);
        assert_eq!(copy.mix_hash, header.mix_hash);
        assert_eq!(copy.nonce, header.nonce);
        assert_eq!(copy.blob_gas.unwrap().excess_gas, 262_144);
    }

    #[test]
    fn processing_copy_can_keep_state_root() {
        let header = dummy_header();
        let copy = header.for_processing(true);

        assert_eq!(copy.state_root, header.state_root);
    }

    #[test]
    fn block_hash_is_cached_from_final_header() {
        let block = Block::new(dummy_header(), Vec::new(), Vec::new(), None);

        assert_eq!(block.hash(), dummy_header().hash());
        assert_eq!(block.hash(), block.hash());
    }

    #[test]
    fn header_mut_discards_cached_hash() {
        let mut block = Block::new(dummy_header(), Vec::new(), Vec::new(), None);
        let before = block.hash();

        block.header_mut().gas_used = 42_000;

        assert_ne!(block.hash(), before);
    }
}
