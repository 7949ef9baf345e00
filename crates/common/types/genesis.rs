use bytes::Bytes;
use ethereum_types::{Address, Bloom, H256, U256};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use super::{
    compute_ommers_hash, compute_receipts_root, compute_state_root, compute_transactions_root,
    Account, Block, BlockBody, BlockHeader, BlockNumber,
};

#[derive(Debug, thiserror::Error)]
pub enum GenesisError {
    #[error("Failed to open genesis file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode genesis file: {0}")]
    Json(#[from] serde_json::Error),
}

#[allow(unused)]
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Genesis {
    /// Chain configuration
    pub config: ChainConfig,
    /// The initial state of the accounts in the genesis block.
    pub alloc: HashMap<Address, GenesisAccount>,
    /// Genesis header values
    #[serde(default)]
    pub coinbase: Address,
    #[serde(default)]
    pub difficulty: U256,
    #[serde(default, with = "crate::serde_utils::bytes")]
    pub extra_data: Bytes,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub gas_limit: u64,
    #[serde(default, with = "crate::serde_utils::u64::hex_str")]
    pub nonce: u64,
    #[serde(default, alias = "mixhash")]
    pub mix_hash: H256,
    #[serde(default, deserialize_with = "crate::serde_utils::u64::deser_hex_or_dec_str")]
    pub timestamp: u64,
}

/// Blockchain settings defined per block.
///
/// Built once (from a genesis file or a [`Network`](super::Network) preset) and passed by
/// value to every component that needs fork activation data.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Current chain identifier
    pub chain_id: u64,

    /// Block numbers for the block where each fork was activated
    /// (None = no fork, 0 = fork is already active)
    pub homestead_block: Option<u64>,
    pub eip150_block: Option<u64>,
    pub eip155_block: Option<u64>,
    pub eip158_block: Option<u64>,
    pub byzantium_block: Option<u64>,
    pub constantinople_block: Option<u64>,
    pub petersburg_block: Option<u64>,
    pub istanbul_block: Option<u64>,
}

/// Protocol rule sets, in activation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fork {
    Frontier,
    Homestead,
    /// EIP-150
    Tangerine,
    /// EIP-155 / EIP-158
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
}

/// Layout of the first receipt field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptEra {
    /// Receipts commit to the intermediate state root
    StateRoot,
    /// Receipts carry a status flag (EIP-658)
    Status,
}

impl Fork {
    pub fn receipt_era(self) -> ReceiptEra {
        if self >= Fork::Byzantium {
            ReceiptEra::Status
        } else {
            ReceiptEra::StateRoot
        }
    }
}

fn is_activated(fork_block: Option<u64>, block_number: BlockNumber) -> bool {
    fork_block.is_some_and(|num| num <= block_number)
}

impl ChainConfig {
    pub fn is_homestead_activated(&self, block_number: BlockNumber) -> bool {
        is_activated(self.homestead_block, block_number)
    }

    pub fn is_eip155_activated(&self, block_number: BlockNumber) -> bool {
        is_activated(self.eip155_block, block_number)
    }

    pub fn is_byzantium_activated(&self, block_number: BlockNumber) -> bool {
        is_activated(self.byzantium_block, block_number)
    }

    pub fn is_istanbul_activated(&self, block_number: BlockNumber) -> bool {
        is_activated(self.istanbul_block, block_number)
    }

    /// Fork whose rules apply to the block with the given number
    pub fn fork(&self, block_number: BlockNumber) -> Fork {
        let schedule = [
            (self.istanbul_block, Fork::Istanbul),
            (self.petersburg_block, Fork::Petersburg),
            (self.constantinople_block, Fork::Constantinople),
            (self.byzantium_block, Fork::Byzantium),
            (self.eip158_block, Fork::SpuriousDragon),
            (self.eip150_block, Fork::Tangerine),
            (self.homestead_block, Fork::Homestead),
        ];
        schedule
            .into_iter()
            .find(|(activation, _)| is_activated(*activation, block_number))
            .map(|(_, fork)| fork)
            .unwrap_or(Fork::Frontier)
    }
}

#[allow(unused)]
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GenesisAccount {
    #[serde(default, with = "crate::serde_utils::bytes")]
    pub code: Bytes,
    #[serde(default)]
    pub storage: HashMap<H256, U256>,
    #[serde(deserialize_with = "crate::serde_utils::u256::deser_hex_or_dec_str")]
    pub balance: U256,
    #[serde(default, with = "crate::serde_utils::u64::hex_str")]
    pub nonce: u64,
}

impl Genesis {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Genesis, GenesisError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Initial accounts, as held by the world state
    pub fn accounts(&self) -> HashMap<Address, Account> {
        self.alloc
            .iter()
            .map(|(address, account)| (*address, Account::from(account.clone())))
            .collect()
    }

    pub fn get_block(&self) -> Block {
        Block {
            header: self.get_block_header(),
            body: BlockBody::empty(),
        }
    }

    fn get_block_header(&self) -> BlockHeader {
        BlockHeader {
            parent_hash: H256::zero(),
            ommers_hash: compute_ommers_hash(&[]),
            coinbase: self.coinbase,
            state_root: self.compute_state_root(),
            transactions_root: compute_transactions_root(&[]),
            receipts_root: compute_receipts_root(&[]),
            logs_bloom: Bloom::zero(),
            difficulty: self.difficulty,
            number: 0,
            gas_limit: self.gas_limit,
            gas_used: 0,
            timestamp: self.timestamp,
            extra_data: self.extra_data.clone(),
            mix_hash: self.mix_hash,
            nonce: self.nonce,
        }
    }

    pub fn compute_state_root(&self) -> H256 {
        compute_state_root(&self.accounts())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Network;
    use hex_literal::hex;

    const GENESIS_JSON: &str = r#"{
        "config": {
            "chainId": 1337,
            "homesteadBlock": 0,
            "eip150Block": 0,
            "eip155Block": 0,
            "eip158Block": 0,
            "byzantiumBlock": 5,
            "berlinBlock": 0
        },
        "alloc": {
            "0x0000000000000000000000000000000000000001": { "balance": "0x1" },
            "0x00000000000000000000000000000000000000ff": {
                "balance": "1000",
                "nonce": "0x2",
                "code": "0x6000"
            }
        },
        "difficulty": "0x20000",
        "gasLimit": "0x2fefd8",
        "extraData": "0x",
        "timestamp": "0"
    }"#;

    #[test]
    fn deserialize_genesis_file() {
        let genesis: Genesis = serde_json::from_str(GENESIS_JSON).unwrap();
        assert_eq!(genesis.config.chain_id, 1337);
        assert_eq!(genesis.config.byzantium_block, Some(5));
        assert_eq!(genesis.config.istanbul_block, None);
        assert_eq!(genesis.gas_limit, 0x2fefd8);
        assert_eq!(genesis.difficulty, U256::from(0x20000));
        let contract = &genesis.alloc[&Address::from(hex!(
            "00000000000000000000000000000000000000ff"
        ))];
        assert_eq!(contract.balance, U256::from(1000));
        assert_eq!(contract.nonce, 2);
        assert_eq!(contract.code.as_ref(), &[0x60, 0x00]);

        let block = genesis.get_block();
        assert_eq!(block.header.number, 0);
        assert_eq!(block.header.state_root, genesis.compute_state_root());
        assert!(!block.header.has_ommers());
    }

    #[test]
    fn fork_schedule() {
        let config = Network::Mainnet.chain_config();
        assert_eq!(config.fork(0), Fork::Frontier);
        assert_eq!(config.fork(1_150_000), Fork::Homestead);
        assert_eq!(config.fork(2_463_000), Fork::Tangerine);
        assert_eq!(config.fork(2_675_000), Fork::SpuriousDragon);
        assert_eq!(config.fork(4_369_999), Fork::SpuriousDragon);
        assert_eq!(config.fork(4_370_000), Fork::Byzantium);
        assert_eq!(config.fork(7_280_000), Fork::Petersburg);
        assert_eq!(config.fork(9_069_000), Fork::Istanbul);
        assert_eq!(config.fork(4_369_999).receipt_era(), ReceiptEra::StateRoot);
        assert_eq!(config.fork(4_370_000).receipt_era(), ReceiptEra::Status);
    }

    #[test]
    fn frontier_only_config() {
        let config = ChainConfig::default();
        assert_eq!(config.fork(u64::MAX), Fork::Frontier);
        assert!(!config.is_eip155_activated(u64::MAX));
    }
}
