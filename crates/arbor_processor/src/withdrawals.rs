use arbor_eth::{Spec, Withdrawal};
use arbor_primitives::{GWEI_TO_WEI, U256};
use arbor_state::{StateError, WorldState};

/// Credits the block's withdrawals to their recipients (EIP-4895).
///
/// Withdrawal amounts are denominated in gwei. Credits are applied in list
/// order; an absent recipient is created with the credit as its opening
/// balance.
pub(crate) fn apply_withdrawals(
    withdrawals: Option<&[Withdrawal]>,
    spec: &Spec,
    state: &mut dyn WorldState,
) -> Result<(), StateError> {
    if !spec.eip4895 {
        return Ok(());
    }

    for withdrawal in withdrawals.unwrap_or_default() {
        let wei = U256::from(withdrawal.amount) * U256::from(GWEI_TO_WEI);
        if state.account_exists(&withdrawal.address) {
            state.add_to_balance(withdrawal.address, wei, spec);
        } else {
            state.create_account(withdrawal.address, wei);
        }
    }

    Ok(())
}
