use blockreplay_core::types::{
    BlockBody, BlockHash, BlockHeader, BlockNumber, ChainConfig, Index, Receipt,
};
use ethereum_types::{H256, U256};
use std::{collections::HashMap, fmt::Debug};

use crate::error::StoreError;

/// Canonical chain tip together with its total difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainHead {
    pub number: BlockNumber,
    pub hash: BlockHash,
    pub total_difficulty: U256,
}

/// Set of writes applied to the engine as a single unit.
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    pub headers: HashMap<BlockHash, BlockHeader>,
    pub total_difficulties: HashMap<BlockHash, U256>,
    pub bodies: HashMap<BlockHash, BlockBody>,
    pub ommers: HashMap<H256, Vec<BlockHeader>>,
    pub receipts: HashMap<BlockHash, Vec<Receipt>>,
    /// `None` removes the canonical hash at that height
    pub canonical_hashes: HashMap<BlockNumber, Option<BlockHash>>,
    pub head: Option<ChainHead>,
}

impl WriteBatch {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
            && self.total_difficulties.is_empty()
            && self.bodies.is_empty()
            && self.ommers.is_empty()
            && self.receipts.is_empty()
            && self.canonical_hashes.is_empty()
            && self.head.is_none()
    }
}

pub trait StoreEngine: Debug + Send + Sync {
    /// Applies every write of the batch so that either all or none of them are observable
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    fn get_block_header_by_hash(
        &self,
        block_hash: BlockHash,
    ) -> Result<Option<BlockHeader>, StoreError>;

    fn get_block_body_by_hash(
        &self,
        block_hash: BlockHash,
    ) -> Result<Option<BlockBody>, StoreError>;

    fn get_block_total_difficulty(&self, block_hash: BlockHash)
        -> Result<Option<U256>, StoreError>;

    /// Obtain uncle headers stored under their ommers hash
    fn get_ommers(&self, ommers_hash: H256) -> Result<Option<Vec<BlockHeader>>, StoreError>;

    fn get_receipts(&self, block_hash: BlockHash) -> Result<Option<Vec<Receipt>>, StoreError>;

    fn get_receipt(
        &self,
        block_hash: BlockHash,
        index: Index,
    ) -> Result<Option<Receipt>, StoreError> {
        Ok(self
            .get_receipts(block_hash)?
            .and_then(|receipts| receipts.get(index as usize).cloned()))
    }

    fn get_canonical_block_hash(
        &self,
        block_number: BlockNumber,
    ) -> Result<Option<BlockHash>, StoreError>;

    fn get_canonical_head(&self) -> Result<Option<ChainHead>, StoreError>;

    fn set_chain_config(&self, chain_config: &ChainConfig) -> Result<(), StoreError>;

    fn get_chain_config(&self) -> Result<Option<ChainConfig>, StoreError>;
}
