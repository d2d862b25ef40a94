use std::sync::Arc;

use arbor_eth::{Activations, BlockHeader, Hardfork, Spec};

use crate::dao::DaoForkConfig;

/// Resolves the active protocol rules for a block header.
///
/// Rule bundles are pure functions of header content: resolving the same
/// header twice yields the same bundle.
pub trait SpecProvider: Send + Sync {
    /// Returns the rule bundle active for the provided header.
    fn spec_for(&self, header: &BlockHeader) -> Arc<Spec>;

    /// The DAO-transition configuration, if this chain performs one.
    fn dao_fork(&self) -> Option<&DaoForkConfig> {
        None
    }

    /// Whether the genesis state is unavailable in the backing store. When it
    /// is, the genesis block's state root cannot be recomputed and the
    /// suggested value is carried through.
    fn genesis_state_unavailable(&self) -> bool {
        false
    }
}

/// A [`SpecProvider`] over a hardfork activation schedule.
pub struct ScheduleSpecProvider {
    activations: Activations,
    dao_fork: Option<DaoForkConfig>,
    genesis_state_unavailable: bool,
}

impl ScheduleSpecProvider {
    /// Constructs a provider from the provided activation schedule.
    pub fn new(activations: Activations) -> Self {
        Self {
            activations,
            dao_fork: None,
            genesis_state_unavailable: false,
        }
    }

    /// Constructs a provider with a single hardfork active from genesis.
    pub fn with_hardfork(hardfork: Hardfork) -> Self {
        Self::new(Activations::with_hardfork(hardfork))
    }

    /// Adds a DAO-transition configuration.
    pub fn with_dao_fork(mut self, dao_fork: DaoForkConfig) -> Self {
        self.dao_fork = Some(dao_fork);
        self
    }

    /// Marks the genesis state as unavailable.
    pub fn with_genesis_state_unavailable(mut self) -> Self {
        self.genesis_state_unavailable = true;
        self
    }
}

impl SpecProvider for ScheduleSpecProvider {
    fn spec_for(&self, header: &BlockHeader) -> Arc<Spec> {
        let hardfork = self
            .activations
            .hardfork_at(header.number, header.timestamp)
            .unwrap_or_default();
        Arc::new(Spec::new(hardfork))
    }

    fn dao_fork(&self) -> Option<&DaoForkConfig> {
        self.dao_fork.as_ref()
    }

    fn genesis_state_unavailable(&self) -> bool {
        self.genesis_state_unavailable
    }
}
