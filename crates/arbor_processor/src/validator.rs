use arbor_eth::{Block, Receipt};

/// Validates a processed block against its suggested counterpart.
pub trait BlockValidator: Send + Sync {
    /// Whether the processed block matches the suggested one. A false result
    /// is a fatal consensus failure for the branch being processed.
    fn validate_processed_block(
        &self,
        processed: &Block,
        receipts: &[Receipt],
        suggested: &Block,
    ) -> bool;
}

/// A [`BlockValidator`] comparing the post-execution header fields of the
/// processed block against the suggested ones, logging every divergence.
#[derive(Clone, Copy, Debug, Default)]
pub struct SuggestedHeaderValidator;

impl BlockValidator for SuggestedHeaderValidator {
    fn validate_processed_block(
        &self,
        processed: &Block,
        receipts: &[Receipt],
        suggested: &Block,
    ) -> bool {
        let processed_header = processed.header();
        let suggested_header = suggested.header();
        let mut valid = true;

        if receipts.len() != suggested.transactions().len() {
            log::warn!(
                "block {}: produced {} receipts for {} transactions",
                suggested_header.number,
                receipts.len(),
                suggested.transactions().len()
            );
            valid = false;
        }

        if processed_header.state_root != suggested_header.state_root {
            log::warn!(
                "block {}: state root mismatch, processed {} != suggested {}",
                suggested_header.number,
                processed_header.state_root,
                suggested_header.state_root
            );
            valid = false;
        }

        if processed_header.receipts_root != suggested_header.receipts_root {
            log::warn!(
                "block {}: receipts root mismatch, processed {} != suggested {}",
                suggested_header.number,
                processed_header.receipts_root,
                suggested_header.receipts_root
            );
            valid = false;
        }

        if processed_header.logs_bloom != suggested_header.logs_bloom {
            log::warn!("block {}: bloom mismatch", suggested_header.number);
            valid = false;
        }

        if processed_header.gas_used != suggested_header.gas_used {
            log::warn!(
                "block {}: gas used mismatch, processed {} != suggested {}",
                suggested_header.number,
                processed_header.gas_used,
                suggested_header.gas_used
            );
            valid = false;
        }

        if valid && processed.hash() != suggested.hash() {
            log::warn!(
                "block {}: hash mismatch, processed {} != suggested {}",
                suggested_header.number,
                processed.hash(),
                suggested.hash()
            );
            valid = false;
        }

        valid
    }
}
