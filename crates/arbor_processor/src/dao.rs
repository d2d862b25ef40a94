use arbor_eth::Spec;
use arbor_primitives::{Address, U256};
use arbor_state::{StateError, WorldState};

/// Configuration of the one-shot DAO balance migration.
#[derive(Clone, Debug)]
pub struct DaoForkConfig {
    /// The block number the migration fires at.
    pub activation_block: u64,
    /// The account the drained balances are moved into.
    pub withdrawal_account: Address,
    /// The accounts to drain.
    pub drained_accounts: Vec<Address>,
}

/// Moves the entire balance of each listed account into the withdrawal
/// account. Fires exactly once, on the configured activation height; callers
/// gate on the block number.
pub(crate) fn apply_dao_transition(
    config: &DaoForkConfig,
    spec: &Spec,
    state: &mut dyn WorldState,
) -> Result<(), StateError> {
    log::info!(
        "applying DAO transition at block {}",
        config.activation_block
    );

    if !state.account_exists(&config.withdrawal_account) {
        state.create_account(config.withdrawal_account, U256::ZERO);
    }

    for address in &config.drained_accounts {
        let balance = state.balance(address);
        state.add_to_balance(config.withdrawal_account, balance, spec);
        state.subtract_from_balance(*address, balance, spec)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use arbor_eth::Hardfork;
    use arbor_state::TrieState;

    use super::*;

    #[test]
    fn balances_are_moved_into_the_withdrawal_account() -> anyhow::Result<()> {
        let spec = Spec::new(Hardfork::Dao);
        let first = Address::repeat_byte(0x01);
        let second = Address::repeat_byte(0x02);
        let vault = Address::repeat_byte(0xdd);

        let mut state =
            TrieState::with_accounts([(first, U256::from(100)), (second, U256::from(100))]);

        let config = DaoForkConfig {
            activation_block: 1_920_000,
            withdrawal_account: vault,
            drained_accounts: vec![first, second],
        };
        apply_dao_transition(&config, &spec, &mut state)?;
        state.commit(&spec)?;

        assert_eq!(state.balance(&vault), U256::from(200));
        assert_eq!(state.balance(&first), U256::ZERO);
        assert_eq!(state.balance(&second), U256::ZERO);

        Ok(())
    }

    #[test]
    fn draining_empty_accounts_is_harmless() -> anyhow::Result<()> {
        let spec = Spec::new(Hardfork::Dao);
        let vault = Address::repeat_byte(0xdd);
        let mut state = TrieState::new();

        let config = DaoForkConfig {
            activation_block: 1_920_000,
            withdrawal_account: vault,
            drained_accounts: vec![Address::repeat_byte(0x01)],
        };
        apply_dao_transition(&config, &spec, &mut state)?;
        state.commit(&spec)?;

        assert_eq!(state.balance(&vault), U256::ZERO);

        Ok(())
    }
}
