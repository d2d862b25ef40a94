/// Mainnet hardfork identifiers, ordered by activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hardfork {
    /// Frontier             0
    #[default]
    Frontier,
    /// Homestead            1150000
    Homestead,
    /// DAO fork             1920000
    Dao,
    /// Tangerine Whistle    2463000
    Tangerine,
    /// Spurious Dragon      2675000
    SpuriousDragon,
    /// Byzantium            4370000
    Byzantium,
    /// Constantinople       7280000
    Constantinople,
    /// Petersburg           7280000
    Petersburg,
    /// Istanbul             9069000
    Istanbul,
    /// Muir Glacier         9200000
    MuirGlacier,
    /// Berlin               12244000
    Berlin,
    /// London               12965000
    London,
    /// Arrow Glacier        13773000
    ArrowGlacier,
    /// Gray Glacier         15050000
    GrayGlacier,
    /// Paris (the Merge)    15537394
    Paris,
    /// Shanghai             timestamp 1681338455
    Shanghai,
    /// Cancun               timestamp 1710338135
    Cancun,
}

/// Activation criterion for a hardfork.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ForkCondition {
    /// Activation based on block number.
    Block(u64),
    /// Activation based on UNIX timestamp.
    Timestamp(u64),
}

/// An ordered hardfork activation schedule for a chain.
#[derive(Clone, Debug, Default)]
pub struct Activations {
    hardforks: Vec<(ForkCondition, Hardfork)>,
}

impl Activations {
    /// Constructs a schedule from the provided activations. Entries are
    /// expected in activation order; the last matching entry wins.
    pub fn new(hardforks: Vec<(ForkCondition, Hardfork)>) -> Self {
        Self { hardforks }
    }

    /// Creates a single-entry schedule with the provided hardfork active from
    /// genesis.
    pub fn with_hardfork(hardfork: Hardfork) -> Self {
        Self {
            hardforks: vec![(ForkCondition::Block(0), hardfork)],
        }
    }

    /// Whether the schedule has no entries.
    pub fn is_empty(&self) -> bool {
        self.hardforks.is_empty()
    }

    /// Returns the hardfork active at the provided block number and
    /// timestamp.
    pub fn hardfork_at(&self, block_number: u64, timestamp: u64) -> Option<Hardfork> {
        self.hardforks
            .iter()
            .rev()
            .find(|(criteria, _)| match criteria {
                ForkCondition::Block(activation) => block_number >= *activation,
                ForkCondition::Timestamp(activation) => timestamp >= *activation,
            })
            .map(|entry| entry.1)
    }
}

impl From<&[(ForkCondition, Hardfork)]> for Activations {
    fn from(hardforks: &[(ForkCondition, Hardfork)]) -> Self {
        Self {
            hardforks: hardforks.to_vec(),
        }
    }
}
