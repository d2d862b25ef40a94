use arbor_eth::Spec;
use arbor_primitives::{Address, HashMap, B256, KECCAK_NULL_RLP, U256};
use arbor_trie::sec_trie_root;

use crate::{
    account::AccountState, error::StateError, StateChangeTracer, WorldState,
};

type Accounts = HashMap<Address, AccountState>;

/// An in-memory world state over a transient Merkle-Patricia trie.
///
/// Mutations accumulate in an uncommitted overlay; `commit` merges them into
/// the committed account set, and `commit_tree` records a snapshot keyed by
/// the recalculated root so that any such root can later be restored with
/// `set_state_root`. A persistent trie keeps historical nodes for the same
/// purpose; the snapshot map is the in-memory equivalent.
#[derive(Clone, Debug)]
pub struct TrieState {
    committed: Accounts,
    overlay: Accounts,
    snapshots: HashMap<B256, Accounts>,
    committed_blocks: HashMap<u64, B256>,
    current_root: B256,
}

impl TrieState {
    /// Constructs an empty state. The empty root is restorable.
    pub fn new() -> Self {
        let mut snapshots = HashMap::default();
        snapshots.insert(KECCAK_NULL_RLP, Accounts::default());

        Self {
            committed: Accounts::default(),
            overlay: Accounts::default(),
            snapshots,
            committed_blocks: HashMap::default(),
            current_root: KECCAK_NULL_RLP,
        }
    }

    /// Constructs a state holding the provided accounts and balances. The
    /// resulting root is restorable.
    pub fn with_accounts(accounts: impl IntoIterator<Item = (Address, U256)>) -> Self {
        let mut state = Self::new();
        for (address, balance) in accounts {
            state
                .committed
                .insert(address, AccountState::with_balance(balance));
        }

        let root = state.compute_root();
        state.snapshots.insert(root, state.committed.clone());
        state.current_root = root;
        state
    }

    /// Returns the root the provided block number was committed at, if it
    /// was.
    pub fn tree_root_of(&self, block_number: u64) -> Option<B256> {
        self.committed_blocks.get(&block_number).copied()
    }

    fn compute_root(&self) -> B256 {
        sec_trie_root(
            self.committed
                .iter()
                .map(|(address, account)| (address, alloy_rlp::encode(account.to_basic()))),
        )
    }

    fn pending_entry(&mut self, address: Address) -> &mut AccountState {
        self.overlay
            .entry(address)
            .or_insert_with(|| self.committed.get(&address).cloned().unwrap_or_default())
    }

    fn apply_overlay(&mut self, spec: &Spec, tracer: Option<&dyn StateChangeTracer>) {
        for (address, account) in self.overlay.drain() {
            if let Some(tracer) = tracer {
                match self.committed.get(&address) {
                    None => tracer.account_created(address, account.balance),
                    Some(before) => {
                        if before.balance != account.balance {
                            tracer.balance_changed(address, before.balance, account.balance);
                        }
                        for (index, value) in &account.storage {
                            let previous =
                                before.storage.get(index).copied().unwrap_or_default();
                            if previous != *value {
                                tracer.storage_changed(address, *index, previous, *value);
                            }
                        }
                    }
                }
            }

            if spec.eip158 && account.is_empty() {
                self.committed.remove(&address);
            } else {
                self.committed.insert(address, account);
            }
        }
    }
}

impl Default for TrieState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldState for TrieState {
    fn state_root(&self) -> B256 {
        self.current_root
    }

    fn set_state_root(&mut self, state_root: B256) -> Result<(), StateError> {
        let snapshot = self
            .snapshots
            .get(&state_root)
            .ok_or(StateError::StateRootNotFound(state_root))?;

        self.committed = snapshot.clone();
        self.overlay.clear();
        self.current_root = state_root;
        Ok(())
    }

    fn reset(&mut self) {
        self.overlay.clear();
    }

    fn commit(&mut self, spec: &Spec) -> Result<(), StateError> {
        self.apply_overlay(spec, None);
        Ok(())
    }

    fn commit_traced(
        &mut self,
        spec: &Spec,
        tracer: &dyn StateChangeTracer,
    ) -> Result<(), StateError> {
        self.apply_overlay(spec, Some(tracer));
        Ok(())
    }

    fn commit_tree(&mut self, block_number: u64) -> Result<(), StateError> {
        let root = self.recalculate_state_root();
        self.snapshots.insert(root, self.committed.clone());
        self.committed_blocks.insert(block_number, root);
        Ok(())
    }

    fn recalculate_state_root(&mut self) -> B256 {
        self.current_root = self.compute_root();
        self.current_root
    }

    fn account_exists(&self, address: &Address) -> bool {
        self.overlay.contains_key(address) || self.committed.contains_key(address)
    }

    fn create_account(&mut self, address: Address, balance: U256) {
        self.overlay
            .insert(address, AccountState::with_balance(balance));
    }

    fn add_to_balance(&mut self, address: Address, value: U256, _spec: &Spec) {
        // A zero-valued add still counts as a touch; the commit reaps the
        // account if it ends up empty under EIP-158 rules.
        let account = self.pending_entry(address);
        account.balance += value;
    }

    fn subtract_from_balance(
        &mut self,
        address: Address,
        value: U256,
        _spec: &Spec,
    ) -> Result<(), StateError> {
        let balance = self.balance(&address);
        if balance < value {
            return Err(StateError::InsufficientBalance {
                address,
                balance,
                required: value,
            });
        }

        self.pending_entry(address).balance -= value;
        Ok(())
    }

    fn balance(&self, address: &Address) -> U256 {
        self.overlay
            .get(address)
            .or_else(|| self.committed.get(address))
            .map_or(U256::ZERO, |account| account.balance)
    }

    fn set_storage(&mut self, address: Address, index: U256, value: U256) {
        self.pending_entry(address).storage.insert(index, value);
    }

    fn storage(&self, address: &Address, index: &U256) -> U256 {
        self.overlay
            .get(address)
            .or_else(|| self.committed.get(address))
            .and_then(|account| account.storage.get(index))
            .copied()
            .unwrap_or_default()
    }
}
