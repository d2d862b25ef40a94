//! Ethereum withdrawal type

use alloy_rlp::{RlpDecodable, RlpEncodable};
use arbor_primitives::Address;

/// A validator withdrawal credited post-execution (EIP-4895).
#[derive(Clone, Debug, PartialEq, Eq, RlpDecodable, RlpEncodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Withdrawal {
    /// The index of the withdrawal
    pub index: u64,
    /// The index of the validator that generated the withdrawal
    pub validator_index: u64,
    /// The recipient address for the withdrawn value
    pub address: Address,
    /// The withdrawn value, in gwei
    pub amount: u64,
}
