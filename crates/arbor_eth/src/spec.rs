use crate::hardfork::Hardfork;

/// An immutable bundle of protocol rules for a single block.
///
/// A `Spec` is a pure function of header content: resolving the same header
/// twice yields an equal bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spec {
    /// The hardfork the rules are derived from.
    pub hardfork: Hardfork,
    /// Empty accounts are deleted when touched (EIP-158).
    pub eip158: bool,
    /// Receipts carry a status code instead of a state root (EIP-658).
    pub eip658: bool,
    /// Base-fee market is active (EIP-1559).
    pub eip1559: bool,
    /// Blob gas accounting is active (EIP-4844).
    pub eip4844: bool,
    /// Beacon-root contract state is updated pre-execution (EIP-4788).
    pub eip4788: bool,
    /// Validator withdrawals are credited post-execution (EIP-4895).
    pub eip4895: bool,
    /// The receipts root is recomputed from the produced receipts. When
    /// disabled, a legally-derivable suggested value may be used instead.
    pub validate_receipts: bool,
}

impl Spec {
    /// Derives the rule bundle for the provided hardfork.
    pub fn new(hardfork: Hardfork) -> Self {
        Self {
            hardfork,
            eip158: hardfork >= Hardfork::SpuriousDragon,
            eip658: hardfork >= Hardfork::Byzantium,
            eip1559: hardfork >= Hardfork::London,
            eip4844: hardfork >= Hardfork::Cancun,
            eip4788: hardfork >= Hardfork::Cancun,
            eip4895: hardfork >= Hardfork::Shanghai,
            validate_receipts: true,
        }
    }

    /// Disables receipts-root recomputation for this bundle.
    pub fn without_receipts_validation(mut self) -> Self {
        self.validate_receipts = false;
        self
    }
}

impl From<Hardfork> for Spec {
    fn from(hardfork: Hardfork) -> Self {
        Self::new(hardfork)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontier_rules() {
        let spec = Spec::new(Hardfork::Frontier);

        assert!(!spec.eip158);
        assert!(!spec.eip658);
        assert!(!spec.eip1559);
        assert!(!spec.eip4844);
        assert!(!spec.eip4895);
        assert!(spec.validate_receipts);
    }

    #[test]
    fn cancun_rules() {
        let spec = Spec::new(Hardfork::Cancun);

        assert!(spec.eip158);
        assert!(spec.eip658);
        assert!(spec.eip1559);
        assert!(spec.eip4844);
        assert!(spec.eip4788);
        assert!(spec.eip4895);
    }

    #[test]
    fn shanghai_has_withdrawals_but_no_blobs() {
        let spec = Spec::new(Hardfork::Shanghai);

        assert!(spec.eip4895);
        assert!(!spec.eip4844);
        assert!(!spec.eip4788);
    }

    #[test]
    fn rules_are_pure() {
        assert_eq!(Spec::new(Hardfork::London), Spec::new(Hardfork::London));
    }
}
