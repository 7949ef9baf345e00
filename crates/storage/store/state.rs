use blockreplay_core::types::{compute_state_root, Account, Genesis};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use std::collections::HashMap;

/// Mutable account state the executor and block processor operate on.
///
/// Writes made after a [`StateStore::checkpoint`] can be discarded as a unit with
/// [`StateStore::revert_to_checkpoint`] or folded into the enclosing checkpoint with
/// [`StateStore::commit_checkpoint`].
pub trait StateStore {
    fn get_balance(&self, address: Address) -> U256;

    fn set_balance(&mut self, address: Address, balance: U256);

    fn add_balance(&mut self, address: Address, amount: U256) {
        let balance = self.get_balance(address).saturating_add(amount);
        self.set_balance(address, balance);
    }

    fn sub_balance(&mut self, address: Address, amount: U256) {
        let balance = self.get_balance(address).saturating_sub(amount);
        self.set_balance(address, balance);
    }

    fn get_nonce(&self, address: Address) -> u64;

    fn set_nonce(&mut self, address: Address, nonce: u64);

    fn increment_nonce(&mut self, address: Address) {
        let nonce = self.get_nonce(address).saturating_add(1);
        self.set_nonce(address, nonce);
    }

    fn get_code(&self, address: Address) -> Bytes;

    fn set_code(&mut self, address: Address, code: Bytes);

    fn get_storage(&self, address: Address, key: H256) -> U256;

    fn set_storage(&mut self, address: Address, key: H256, value: U256);

    fn account_exists(&self, address: Address) -> bool;

    /// Root of the state trie over every account
    fn root_hash(&self) -> H256;

    fn checkpoint(&mut self);

    fn commit_checkpoint(&mut self);

    fn revert_to_checkpoint(&mut self);
}

/// In-memory account state with a checkpoint journal
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    accounts: HashMap<Address, Account>,
    // Each frame holds the value an account had before its first write since the checkpoint
    journal: Vec<HashMap<Address, Option<Account>>>,
}

impl WorldState {
    pub fn new(accounts: HashMap<Address, Account>) -> Self {
        Self {
            accounts,
            journal: Vec::new(),
        }
    }

    pub fn from_genesis(genesis: &Genesis) -> Self {
        Self::new(genesis.accounts())
    }

    pub fn get_account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.accounts.iter()
    }

    fn account_mut(&mut self, address: Address) -> &mut Account {
        if let Some(frame) = self.journal.last_mut() {
            frame
                .entry(address)
                .or_insert_with(|| self.accounts.get(&address).cloned());
        }
        self.accounts.entry(address).or_default()
    }
}

impl StateStore for WorldState {
    fn get_balance(&self, address: Address) -> U256 {
        self.accounts
            .get(&address)
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    fn set_balance(&mut self, address: Address, balance: U256) {
        self.account_mut(address).balance = balance;
    }

    fn get_nonce(&self, address: Address) -> u64 {
        self.accounts
            .get(&address)
            .map(|account| account.nonce)
            .unwrap_or_default()
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.account_mut(address).nonce = nonce;
    }

    fn get_code(&self, address: Address) -> Bytes {
        self.accounts
            .get(&address)
            .map(|account| account.code.clone())
            .unwrap_or_default()
    }

    fn set_code(&mut self, address: Address, code: Bytes) {
        self.account_mut(address).code = code;
    }

    fn get_storage(&self, address: Address, key: H256) -> U256 {
        self.accounts
            .get(&address)
            .and_then(|account| account.storage.get(&key).copied())
            .unwrap_or_default()
    }

    fn set_storage(&mut self, address: Address, key: H256, value: U256) {
        let storage = &mut self.account_mut(address).storage;
        if value.is_zero() {
            storage.remove(&key);
        } else {
            storage.insert(key, value);
        }
    }

    fn account_exists(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    fn root_hash(&self) -> H256 {
        compute_state_root(self.accounts.iter())
    }

    fn checkpoint(&mut self) {
        self.journal.push(HashMap::new());
    }

    fn commit_checkpoint(&mut self) {
        let Some(frame) = self.journal.pop() else {
            return;
        };
        if let Some(parent) = self.journal.last_mut() {
            for (address, previous) in frame {
                parent.entry(address).or_insert(previous);
            }
        }
    }

    fn revert_to_checkpoint(&mut self) {
        let Some(frame) = self.journal.pop() else {
            return;
        };
        for (address, previous) in frame {
            match previous {
                Some(account) => self.accounts.insert(address, account),
                None => self.accounts.remove(&address),
            };
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use blockreplay_core::types::EMPTY_TRIE_HASH;

    fn address(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn empty_state_has_empty_root() {
        assert_eq!(WorldState::default().root_hash(), EMPTY_TRIE_HASH);
    }

    #[test]
    fn balance_helpers() {
        let mut state = WorldState::default();
        state.add_balance(address(1), U256::from(100));
        state.sub_balance(address(1), U256::from(30));
        assert_eq!(state.get_balance(address(1)), U256::from(70));
        state.sub_balance(address(1), U256::from(1000));
        assert_eq!(state.get_balance(address(1)), U256::zero());
        assert!(state.account_exists(address(1)));
        assert!(!state.account_exists(address(2)));
    }

    #[test]
    fn revert_restores_previous_values() {
        let mut state = WorldState::default();
        state.set_balance(address(1), U256::from(10));
        let root = state.root_hash();

        state.checkpoint();
        state.set_balance(address(1), U256::from(5));
        state.increment_nonce(address(1));
        state.set_code(address(2), Bytes::from_static(b"\x60\x00"));
        state.set_storage(address(2), H256::zero(), U256::one());
        state.revert_to_checkpoint();

        assert_eq!(state.get_balance(address(1)), U256::from(10));
        assert_eq!(state.get_nonce(address(1)), 0);
        assert!(!state.account_exists(address(2)));
        assert_eq!(state.root_hash(), root);
    }

    #[test]
    fn committed_inner_checkpoint_reverts_with_outer() {
        let mut state = WorldState::default();
        state.set_balance(address(1), U256::from(10));

        state.checkpoint();
        state.set_balance(address(1), U256::from(20));
        state.checkpoint();
        state.set_balance(address(1), U256::from(30));
        state.set_nonce(address(3), 7);
        state.commit_checkpoint();
        assert_eq!(state.get_balance(address(1)), U256::from(30));
        state.revert_to_checkpoint();

        assert_eq!(state.get_balance(address(1)), U256::from(10));
        assert!(!state.account_exists(address(3)));
    }

    #[test]
    fn zero_storage_value_clears_slot() {
        let mut state = WorldState::default();
        let key = H256::repeat_byte(0x11);
        state.set_storage(address(1), key, U256::from(5));
        let with_slot = state.root_hash();
        state.set_storage(address(1), key, U256::zero());
        assert_ne!(state.root_hash(), with_slot);
        assert!(state
            .get_account(&address(1))
            .is_some_and(|account| account.storage.is_empty()));
    }
}
