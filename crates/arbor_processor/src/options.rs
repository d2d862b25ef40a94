use bitflags::bitflags;

bitflags! {
    /// Options altering how a branch is processed. Flags are orthogonal.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ProcessingOptions: u8 {
        /// Skip witness persistence and block-processed event emission.
        const READ_ONLY_CHAIN = 1 << 0;
        /// Restore the entry checkpoint after the last block.
        const DO_NOT_UPDATE_HEAD = 1 << 1;
        /// Insert the produced receipts into receipt storage.
        const STORE_RECEIPTS = 1 << 2;
        /// Skip post-processing block validation.
        const NO_VALIDATION = 1 << 3;
    }
}
