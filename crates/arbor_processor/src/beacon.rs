use arbor_eth::{BlockHeader, Spec};
use arbor_primitives::{address, Address, U256};
use arbor_state::{StateError, WorldState};

/// Address of the beacon-roots contract, introduced in EIP-4788 (Cancun
/// hardfork).
pub const BEACON_ROOTS_ADDRESS: Address = address!("000F3df6D732807Ef1319fB7B8bB8522d0Beac02");

/// Length of the beacon-roots ring buffer.
pub const BEACON_ROOTS_HISTORY_BUFFER_LENGTH: u64 = 8191;

/// Applies the pre-execution contract-state changes mandated by EIP-4788:
/// the header's parent beacon block root is written into the beacon-roots
/// contract's ring buffer, keyed by timestamp.
#[derive(Clone, Copy, Debug, Default)]
pub struct BeaconRootsHandler;

impl BeaconRootsHandler {
    /// Writes the ring-buffer slots for the provided header. A no-op when
    /// EIP-4788 is inactive or the header carries no parent beacon root.
    pub fn apply_contract_state_changes(
        &self,
        header: &BlockHeader,
        spec: &Spec,
        state: &mut dyn WorldState,
    ) -> Result<(), StateError> {
        if !spec.eip4788 {
            return Ok(());
        }
        let Some(parent_beacon_block_root) = header.parent_beacon_block_root else {
            return Ok(());
        };

        if !state.account_exists(&BEACON_ROOTS_ADDRESS) {
            state.create_account(BEACON_ROOTS_ADDRESS, U256::ZERO);
        }

        let timestamp_slot = U256::from(header.timestamp % BEACON_ROOTS_HISTORY_BUFFER_LENGTH);
        let root_slot = timestamp_slot + U256::from(BEACON_ROOTS_HISTORY_BUFFER_LENGTH);

        state.set_storage(
            BEACON_ROOTS_ADDRESS,
            timestamp_slot,
            U256::from(header.timestamp),
        );
        state.set_storage(
            BEACON_ROOTS_ADDRESS,
            root_slot,
            U256::from_be_bytes(parent_beacon_block_root.0),
        );

        Ok(())
    }
}
