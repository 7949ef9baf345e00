use std::collections::BTreeMap;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

use super::{secure_trie_root, GenesisAccount, EMPTY_KECCACK_HASH, EMPTY_TRIE_HASH};

/// Full account as held by the world state.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Account {
    pub nonce: u64,
    pub balance: U256,
    pub code: Bytes,
    pub storage: BTreeMap<H256, U256>,
}

/// Account leaf as committed to the state trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub nonce: u64,
    pub balance: U256,
    pub storage_root: H256,
    pub code_hash: H256,
}

impl Account {
    pub fn code_hash(&self) -> H256 {
        code_hash(&self.code)
    }

    pub fn storage_root(&self) -> H256 {
        compute_storage_root(&self.storage)
    }

    /// An account is empty when it has no code, zero nonce and zero balance (EIP-161)
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code.is_empty()
    }
}

impl Default for AccountState {
    fn default() -> Self {
        Self {
            nonce: Default::default(),
            balance: Default::default(),
            storage_root: EMPTY_TRIE_HASH,
            code_hash: EMPTY_KECCACK_HASH,
        }
    }
}

impl From<&Account> for AccountState {
    fn from(account: &Account) -> Self {
        AccountState {
            nonce: account.nonce,
            balance: account.balance,
            storage_root: account.storage_root(),
            code_hash: account.code_hash(),
        }
    }
}

impl From<GenesisAccount> for Account {
    fn from(genesis: GenesisAccount) -> Self {
        Self {
            nonce: genesis.nonce,
            balance: genesis.balance,
            code: genesis.code,
            storage: genesis.storage.into_iter().collect(),
        }
    }
}

pub fn code_hash(code: &Bytes) -> H256 {
    keccak(code.as_ref())
}

impl Encodable for AccountState {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&self.nonce);
        s.append(&self.balance);
        s.append(&self.storage_root);
        s.append(&self.code_hash);
    }
}

impl Decodable for AccountState {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(AccountState {
            nonce: rlp.val_at(0)?,
            balance: rlp.val_at(1)?,
            storage_root: rlp.val_at(2)?,
            code_hash: rlp.val_at(3)?,
        })
    }
}

pub fn compute_storage_root(storage: &BTreeMap<H256, U256>) -> H256 {
    secure_trie_root(
        storage
            .iter()
            .filter(|(_, value)| !value.is_zero())
            .map(|(key, value)| (key, rlp::encode(value))),
    )
}

/// Computes the world state root over the given accounts
pub fn compute_state_root<'a, I>(accounts: I) -> H256
where
    I: IntoIterator<Item = (&'a Address, &'a Account)>,
{
    secure_trie_root(
        accounts
            .into_iter()
            .map(|(address, account)| (address, rlp::encode(&AccountState::from(account)))),
    )
}

/// Address of a contract created by `sender` with the given transaction nonce.
pub fn create_address(sender: Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(&sender);
    stream.append(&nonce);
    Address::from_slice(&keccak(stream.out()).as_bytes()[12..])
}
