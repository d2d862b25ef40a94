use alloy_rlp::{BufMut, Encodable};
use arbor_primitives::{Bloom, B256};
use arbor_trie::ordered_trie_root;

use crate::{
    log::{logs_bloom, ExecutionLog},
    spec::Spec,
};

/// The record of effects and logs of one transaction's execution.
///
/// Receipts are produced in transaction order and ordered identically to
/// their block's transaction vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Cumulative gas used in the block after this transaction was executed.
    pub cumulative_gas_used: u64,
    /// Bloom filter of the logs generated within this transaction.
    pub logs_bloom: Bloom,
    /// Logs generated within this transaction.
    pub logs: Vec<ExecutionLog>,
    /// Execution outcome: a status code after EIP-658, an intermediate state
    /// root before.
    pub outcome: ReceiptOutcome,
}

/// Outcome field of a receipt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiptOutcome {
    /// Intermediate state root (pre-Byzantium).
    StateRoot(B256),
    /// Execution status code (EIP-658).
    Status(u8),
}

impl Receipt {
    /// Constructs a successful receipt under the provided rules, computing
    /// the logs bloom from the logs.
    pub fn success(cumulative_gas_used: u64, logs: Vec<ExecutionLog>, spec: &Spec) -> Self {
        Self::with_status(1, cumulative_gas_used, logs, spec)
    }

    /// Constructs a receipt with the provided status under the provided
    /// rules. Pre-EIP-658 rules have no status; those receipts are created
    /// with a zeroed state root for the caller to fill in.
    pub fn with_status(
        status: u8,
        cumulative_gas_used: u64,
        logs: Vec<ExecutionLog>,
        spec: &Spec,
    ) -> Self {
        let outcome = if spec.eip658 {
            ReceiptOutcome::Status(status)
        } else {
            ReceiptOutcome::StateRoot(B256::ZERO)
        };

        Self {
            cumulative_gas_used,
            logs_bloom: logs_bloom(&logs),
            logs,
            outcome,
        }
    }

    /// Returns the status code of the receipt, if any.
    pub fn status_code(&self) -> Option<u8> {
        match &self.outcome {
            ReceiptOutcome::StateRoot(_) => None,
            ReceiptOutcome::Status(status) => Some(*status),
        }
    }

    fn rlp_payload_length(&self) -> usize {
        let outcome_length = match &self.outcome {
            ReceiptOutcome::StateRoot(root) => root.length(),
            ReceiptOutcome::Status(_) => 1,
        };

        outcome_length
            + self.cumulative_gas_used.length()
            + self.logs_bloom.length()
            + self.logs.length()
    }
}

impl Encodable for Receipt {
    fn encode(&self, out: &mut dyn BufMut) {
        alloy_rlp::Header {
            list: true,
            payload_length: self.rlp_payload_length(),
        }
        .encode(out);

        match &self.outcome {
            ReceiptOutcome::StateRoot(root) => {
                root.encode(out);
            }
            ReceiptOutcome::Status(status) => {
                if *status == 0 {
                    out.put_u8(alloy_rlp::EMPTY_STRING_CODE);
                } else {
                    out.put_u8(1);
                }
            }
        }

        self.cumulative_gas_used.encode(out);
        self.logs_bloom.encode(out);
        self.logs.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

/// Computes the receipts root of the provided receipts: the ordered trie root
/// of their RLP encodings.
pub fn receipts_root<'a>(receipts: impl IntoIterator<Item = &'a Receipt>) -> B256 {
    ordered_trie_root(receipts.into_iter().map(alloy_rlp::encode))
}
