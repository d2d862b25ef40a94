use alloy_rlp::RlpEncodable;
use arbor_primitives::{Address, Bloom, BloomInput, Bytes, B256};

/// A log emitted during transaction execution.
#[derive(Clone, Debug, Default, PartialEq, Eq, RlpEncodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionLog {
    /// Address of the emitting contract.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<B256>,
    /// Unindexed payload.
    pub data: Bytes,
}

impl ExecutionLog {
    /// Constructs a log from its parts.
    pub fn new(address: Address, topics: Vec<B256>, data: Bytes) -> Self {
        Self {
            address,
            topics,
            data,
        }
    }

    /// Adds this log's address and topics to the provided bloom filter.
    pub fn accrue_into(&self, bloom: &mut Bloom) {
        bloom.accrue(BloomInput::Raw(self.address.as_slice()));
        for topic in &self.topics {
            bloom.accrue(BloomInput::Raw(topic.as_slice()));
        }
    }
}

/// Computes the bloom filter of the provided logs.
pub fn logs_bloom<'a>(logs: impl IntoIterator<Item = &'a ExecutionLog>) -> Bloom {
    let mut bloom = Bloom::ZERO;
    for log in logs {
        log.accrue_into(&mut bloom);
    }
    bloom
}
