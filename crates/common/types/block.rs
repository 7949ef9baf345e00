use crate::{
    types::{ordered_trie_root, Receipt, Transaction},
    Address, H256, U256,
};
use bytes::Bytes;
use ethereum_types::Bloom;
use keccak_hash::keccak;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};

use super::EMPTY_OMMERS_HASH;

pub type BlockNumber = u64;
pub type BlockHash = H256;

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Block {
    pub header: BlockHeader,
    pub body: BlockBody,
}

impl Block {
    pub fn new(header: BlockHeader, body: BlockBody) -> Self {
        Self { header, body }
    }

    pub fn hash(&self) -> BlockHash {
        self.header.compute_block_hash()
    }
}

impl Encodable for Block {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.header);
        s.append_list::<Transaction, Transaction>(&self.body.transactions);
        s.append_list::<BlockHeader, BlockHeader>(&self.body.ommers);
    }
}

impl Decodable for Block {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Block {
            header: rlp.val_at(0)?,
            body: BlockBody {
                transactions: rlp.list_at(1)?,
                ommers: rlp.list_at(2)?,
            },
        })
    }
}

/// Header part of a block on the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub parent_hash: H256,
    #[serde(rename = "sha3Uncles")]
    pub ommers_hash: H256, // ommer = uncle
    #[serde(rename = "miner")]
    pub coinbase: Address,
    pub state_root: H256,
    pub transactions_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: Bloom,
    #[serde(default)]
    pub difficulty: U256,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub number: BlockNumber,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub gas_limit: u64,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub gas_used: u64,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub timestamp: u64,
    #[serde(with = "crate::serde_utils::bytes")]
    pub extra_data: Bytes,
    pub mix_hash: H256,
    #[serde(with = "crate::serde_utils::u64::hex_str_padding")]
    pub nonce: u64,
}

impl Encodable for BlockHeader {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(15);
        s.append(&self.parent_hash);
        s.append(&self.ommers_hash);
        s.append(&self.coinbase);
        s.append(&self.state_root);
        s.append(&self.transactions_root);
        s.append(&self.receipts_root);
        s.append(&self.logs_bloom);
        s.append(&self.difficulty);
        s.append(&self.number);
        s.append(&self.gas_limit);
        s.append(&self.gas_used);
        s.append(&self.timestamp);
        s.append(&self.extra_data.to_vec());
        s.append(&self.mix_hash);
        // The PoW nonce is a fixed 8 byte string, not an integer
        s.append(&self.nonce.to_be_bytes().to_vec());
    }
}

impl Decodable for BlockHeader {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 15 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let extra_data: Vec<u8> = rlp.val_at(12)?;
        let nonce: Vec<u8> = rlp.val_at(14)?;
        let nonce: [u8; 8] = nonce
            .try_into()
            .map_err(|_| DecoderError::Custom("block nonce must be 8 bytes long"))?;
        Ok(BlockHeader {
            parent_hash: rlp.val_at(0)?,
            ommers_hash: rlp.val_at(1)?,
            coinbase: rlp.val_at(2)?,
            state_root: rlp.val_at(3)?,
            transactions_root: rlp.val_at(4)?,
            receipts_root: rlp.val_at(5)?,
            logs_bloom: rlp.val_at(6)?,
            difficulty: rlp.val_at(7)?,
            number: rlp.val_at(8)?,
            gas_limit: rlp.val_at(9)?,
            gas_used: rlp.val_at(10)?,
            timestamp: rlp.val_at(11)?,
            extra_data: Bytes::from(extra_data),
            mix_hash: rlp.val_at(13)?,
            nonce: u64::from_be_bytes(nonce),
        })
    }
}

impl BlockHeader {
    pub fn compute_block_hash(&self) -> H256 {
        keccak(rlp::encode(self))
    }

    pub fn has_ommers(&self) -> bool {
        self.ommers_hash != EMPTY_OMMERS_HASH
    }
}

// The body of a block on the chain
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BlockBody {
    pub transactions: Vec<Transaction>,
    pub ommers: Vec<BlockHeader>,
}

impl BlockBody {
    pub const fn empty() -> Self {
        Self {
            transactions: Vec::new(),
            ommers: Vec::new(),
        }
    }
}

pub fn compute_transactions_root(transactions: &[Transaction]) -> H256 {
    // Key: RLP(tx_index), Value: RLP(tx)
    ordered_trie_root(transactions.iter().map(rlp::encode))
}

pub fn compute_receipts_root(receipts: &[Receipt]) -> H256 {
    ordered_trie_root(receipts.iter().map(rlp::encode))
}

/// Keccak256 of the RLP list of uncle headers
pub fn compute_ommers_hash(ommers: &[BlockHeader]) -> H256 {
    keccak(rlp::encode_list::<BlockHeader, BlockHeader>(ommers))
}
