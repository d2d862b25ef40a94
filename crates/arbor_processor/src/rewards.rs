use std::sync::Arc;

use arbor_eth::{reward::miner_reward, Block, Spec};
use arbor_primitives::{Address, U256};
use arbor_state::WorldState;

use crate::{
    error::ExecutionError,
    spec::SpecProvider,
    tracer::{ReceiptsTracer, RewardKind},
};

/// A single block reward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockReward {
    /// The rewarded account.
    pub beneficiary: Address,
    /// What the reward is for.
    pub kind: RewardKind,
    /// The rewarded value, in wei.
    pub value: U256,
}

/// Computes the rewards owed for a block.
pub trait RewardCalculator: Send + Sync {
    /// Returns the rewards for the provided block, in application order.
    fn calculate_rewards(&self, block: &Block) -> Vec<BlockReward>;
}

/// A [`RewardCalculator`] that pays no rewards (proof-of-stake chains).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRewards;

impl RewardCalculator for NoRewards {
    fn calculate_rewards(&self, _block: &Block) -> Vec<BlockReward> {
        Vec::new()
    }
}

/// The proof-of-work reward schedule: a base reward per block plus `R/32`
/// per included ommer for the beneficiary, and a depth-scaled reward for
/// each ommer's own beneficiary.
pub struct ClassicRewardCalculator {
    spec_provider: Arc<dyn SpecProvider>,
}

impl ClassicRewardCalculator {
    /// Constructs a calculator resolving the reward schedule through the
    /// provided spec provider.
    pub fn new(spec_provider: Arc<dyn SpecProvider>) -> Self {
        Self { spec_provider }
    }
}

impl RewardCalculator for ClassicRewardCalculator {
    fn calculate_rewards(&self, block: &Block) -> Vec<BlockReward> {
        let header = block.header();
        let spec = self.spec_provider.spec_for(header);

        let Some(base) = miner_reward(spec.hardfork) else {
            return Vec::new();
        };
        let base = U256::from(base);

        let mut rewards = Vec::with_capacity(1 + block.ommers().len());
        let nephew_bonus = (base >> 5) * U256::from(block.ommers().len());
        rewards.push(BlockReward {
            beneficiary: header.beneficiary,
            kind: RewardKind::Block,
            value: base + nephew_bonus,
        });

        for ommer in block.ommers() {
            let depth = header.number.saturating_sub(ommer.number);
            if depth == 0 || depth >= 8 {
                continue;
            }

            rewards.push(BlockReward {
                beneficiary: ommer.beneficiary,
                kind: RewardKind::Uncle,
                value: base * U256::from(8 - depth) / U256::from(8),
            });
        }

        rewards
    }
}

/// Applies the provided rewards to the world state.
///
/// Rewards are applied in calculation order. An absent account is created
/// with the reward as its opening balance; an existing one has the reward
/// added under the active rules. When the bound tracer traces state, the
/// state is committed under its sub-tracer after each reward so the induced
/// deltas are observable.
pub(crate) fn apply_rewards(
    rewards: &[BlockReward],
    spec: &Spec,
    state: &mut dyn WorldState,
    tracer: &ReceiptsTracer,
) -> Result<(), ExecutionError> {
    for reward in rewards {
        if tracer.is_tracing_rewards() {
            tracer.report_reward(reward.beneficiary, reward.kind, reward.value);
        }

        if state.account_exists(&reward.beneficiary) {
            state.add_to_balance(reward.beneficiary, reward.value, spec);
        } else {
            state.create_account(reward.beneficiary, reward.value);
        }

        if let Some(other) = tracer.other_tracer() {
            if other.is_tracing_state() {
                if let Some(state_tracer) = other.state_tracer() {
                    state.commit_traced(spec, state_tracer)?;
                }
            }
        }
    }

    Ok(())
}
