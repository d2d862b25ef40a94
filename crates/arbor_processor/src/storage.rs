use arbor_eth::{Block, Receipt};

/// Write-only sink for produced receipts.
///
/// The processor inserts incrementally, block by block; inserts made before
/// a branch fails are not rolled back.
pub trait ReceiptStorage: Send + Sync {
    /// Persists the receipts of the provided block. `is_canonical` marks
    /// whether the block is already part of the canonical chain; blocks
    /// stored during branch processing are not.
    fn insert(&self, block: &Block, receipts: &[Receipt], is_canonical: bool);
}

/// A sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopReceiptStorage;

impl ReceiptStorage for NoopReceiptStorage {
    fn insert(&self, _block: &Block, _receipts: &[Receipt], _is_canonical: bool) {}
}
