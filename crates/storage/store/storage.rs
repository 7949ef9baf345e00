use self::engines::in_memory::Store as InMemoryStore;
use self::error::StoreError;
use blockreplay_core::types::{
    compute_ommers_hash, Block, BlockBody, BlockHash, BlockHeader, BlockNumber, ChainConfig,
    Genesis, Index, Receipt,
};
use engines::api::StoreEngine;
use ethereum_types::{H256, U256};
use std::sync::Arc;
use tracing::{debug, info};

mod engines;
pub mod error;
mod state;

pub use engines::api::{ChainHead, WriteBatch};
pub use state::{StateStore, WorldState};

#[derive(Debug, Clone)]
pub struct Store {
    engine: Arc<dyn StoreEngine>,
}

#[derive(Debug, Clone, Copy)]
pub enum EngineType {
    InMemory,
}

impl Store {
    pub fn new(engine_type: EngineType) -> Result<Self, StoreError> {
        info!("Starting storage engine ({engine_type:?})");
        let store = match engine_type {
            EngineType::InMemory => Self {
                engine: Arc::new(InMemoryStore::new()),
            },
        };
        info!("Started store engine");
        Ok(store)
    }

    /// Opens a write transaction. Nothing written through it is visible to readers of the
    /// store until [`StoreTransaction::commit`] succeeds; dropping it discards the writes.
    pub fn begin_transaction(&self) -> StoreTransaction {
        StoreTransaction {
            store: self.clone(),
            batch: WriteBatch::default(),
        }
    }

    /// Stores the genesis block and the chain configuration, making genesis the head
    pub fn add_initial_state(&self, genesis: &Genesis) -> Result<BlockHash, StoreError> {
        info!("Storing initial state from genesis");
        let genesis_block = genesis.get_block();
        let mut transaction = self.begin_transaction();
        let genesis_hash = transaction.persist_block(&genesis_block, Vec::new())?;
        transaction.commit()?;
        self.set_chain_config(&genesis.config)?;
        Ok(genesis_hash)
    }

    pub fn get_block_header_by_hash(
        &self,
        block_hash: BlockHash,
    ) -> Result<Option<BlockHeader>, StoreError> {
        self.engine.get_block_header_by_hash(block_hash)
    }

    /// Obtain canonical block header
    pub fn get_block_header(
        &self,
        block_number: BlockNumber,
    ) -> Result<Option<BlockHeader>, StoreError> {
        match self.get_canonical_block_hash(block_number)? {
            Some(hash) => self.get_block_header_by_hash(hash),
            None => Ok(None),
        }
    }

    pub fn get_block_body_by_hash(
        &self,
        block_hash: BlockHash,
    ) -> Result<Option<BlockBody>, StoreError> {
        self.engine.get_block_body_by_hash(block_hash)
    }

    pub fn get_block_by_hash(&self, block_hash: BlockHash) -> Result<Option<Block>, StoreError> {
        let header = match self.get_block_header_by_hash(block_hash)? {
            Some(header) => header,
            None => return Ok(None),
        };
        let body = match self.get_block_body_by_hash(block_hash)? {
            Some(body) => body,
            None => return Ok(None),
        };
        Ok(Some(Block { header, body }))
    }

    pub fn get_block_total_difficulty(
        &self,
        block_hash: BlockHash,
    ) -> Result<Option<U256>, StoreError> {
        self.engine.get_block_total_difficulty(block_hash)
    }

    pub fn get_ommers(&self, ommers_hash: H256) -> Result<Option<Vec<BlockHeader>>, StoreError> {
        self.engine.get_ommers(ommers_hash)
    }

    pub fn get_receipts(&self, block_hash: BlockHash) -> Result<Option<Vec<Receipt>>, StoreError> {
        self.engine.get_receipts(block_hash)
    }

    pub fn get_receipt(
        &self,
        block_hash: BlockHash,
        index: Index,
    ) -> Result<Option<Receipt>, StoreError> {
        self.engine.get_receipt(block_hash, index)
    }

    pub fn get_canonical_block_hash(
        &self,
        block_number: BlockNumber,
    ) -> Result<Option<BlockHash>, StoreError> {
        self.engine.get_canonical_block_hash(block_number)
    }

    pub fn get_canonical_head(&self) -> Result<Option<ChainHead>, StoreError> {
        self.engine.get_canonical_head()
    }

    pub fn get_latest_block_number(&self) -> Result<Option<BlockNumber>, StoreError> {
        Ok(self.get_canonical_head()?.map(|head| head.number))
    }

    pub fn is_canonical(
        &self,
        block_number: BlockNumber,
        block_hash: BlockHash,
    ) -> Result<bool, StoreError> {
        Ok(self.get_canonical_block_hash(block_number)? == Some(block_hash))
    }

    pub fn set_chain_config(&self, chain_config: &ChainConfig) -> Result<(), StoreError> {
        self.engine.set_chain_config(chain_config)
    }

    pub fn get_chain_config(&self) -> Result<ChainConfig, StoreError> {
        self.engine
            .get_chain_config()?
            .ok_or_else(|| StoreError::Custom("Chain config not found".to_string()))
    }
}

/// Buffered writes over a [`Store`], committed as a single unit.
///
/// Reads issued through the transaction observe its own pending writes first.
#[derive(Debug)]
pub struct StoreTransaction {
    store: Store,
    batch: WriteBatch,
}

impl StoreTransaction {
    /// Persists a header and updates the canonical chain if the header's total difficulty
    /// is not lower than the current head's. Returns the header hash.
    pub fn persist_header(&mut self, header: &BlockHeader) -> Result<BlockHash, StoreError> {
        let block_hash = header.compute_block_hash();
        let parent_total_difficulty = if header.number == 0 {
            U256::zero()
        } else {
            self.get_block_total_difficulty(header.parent_hash)?
                .ok_or(StoreError::MissingParent(header.parent_hash))?
        };
        let total_difficulty = parent_total_difficulty.saturating_add(header.difficulty);

        self.batch.headers.insert(block_hash, header.clone());
        self.batch
            .total_difficulties
            .insert(block_hash, total_difficulty);

        let is_new_head = self
            .get_canonical_head()?
            .map_or(true, |head| total_difficulty >= head.total_difficulty);
        if is_new_head {
            self.set_canonical_chain(header, block_hash)?;
            self.batch.head = Some(ChainHead {
                number: header.number,
                hash: block_hash,
                total_difficulty,
            });
        }
        Ok(block_hash)
    }

    /// Persists the uncle headers of a block, returning their ommers hash
    pub fn persist_uncles(&mut self, ommers: &[BlockHeader]) -> H256 {
        let ommers_hash = compute_ommers_hash(ommers);
        self.batch.ommers.insert(ommers_hash, ommers.to_vec());
        ommers_hash
    }

    pub fn persist_receipts(&mut self, block_hash: BlockHash, receipts: Vec<Receipt>) {
        self.batch.receipts.insert(block_hash, receipts);
    }

    /// Persists header, body and receipts of a block
    pub fn persist_block(
        &mut self,
        block: &Block,
        receipts: Vec<Receipt>,
    ) -> Result<BlockHash, StoreError> {
        let block_hash = self.persist_header(&block.header)?;
        self.batch.bodies.insert(block_hash, block.body.clone());
        self.persist_receipts(block_hash, receipts);
        Ok(block_hash)
    }

    pub fn get_block_header_by_hash(
        &self,
        block_hash: BlockHash,
    ) -> Result<Option<BlockHeader>, StoreError> {
        match self.batch.headers.get(&block_hash) {
            Some(header) => Ok(Some(header.clone())),
            None => self.store.get_block_header_by_hash(block_hash),
        }
    }

    pub fn get_block_total_difficulty(
        &self,
        block_hash: BlockHash,
    ) -> Result<Option<U256>, StoreError> {
        match self.batch.total_difficulties.get(&block_hash) {
            Some(total_difficulty) => Ok(Some(*total_difficulty)),
            None => self.store.get_block_total_difficulty(block_hash),
        }
    }

    pub fn get_canonical_block_hash(
        &self,
        block_number: BlockNumber,
    ) -> Result<Option<BlockHash>, StoreError> {
        match self.batch.canonical_hashes.get(&block_number) {
            Some(hash) => Ok(*hash),
            None => self.store.get_canonical_block_hash(block_number),
        }
    }

    pub fn get_canonical_head(&self) -> Result<Option<ChainHead>, StoreError> {
        match self.batch.head {
            Some(head) => Ok(Some(head)),
            None => self.store.get_canonical_head(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub fn commit(self) -> Result<(), StoreError> {
        debug!(
            headers = self.batch.headers.len(),
            head = ?self.batch.head.map(|head| head.number),
            "Committing store transaction"
        );
        self.store.engine.commit(self.batch)
    }

    // Points the canonical chain at `header`, rewriting ancestors until the branch meets
    // the previous canonical chain and dropping canonical entries above the new head.
    fn set_canonical_chain(
        &mut self,
        header: &BlockHeader,
        block_hash: BlockHash,
    ) -> Result<(), StoreError> {
        if let Some(head) = self.get_canonical_head()? {
            for number in (header.number + 1)..=head.number {
                self.batch.canonical_hashes.insert(number, None);
            }
        }
        self.batch
            .canonical_hashes
            .insert(header.number, Some(block_hash));

        let mut number = header.number;
        let mut ancestor_hash = header.parent_hash;
        while number > 0 {
            number -= 1;
            if self.get_canonical_block_hash(number)? == Some(ancestor_hash) {
                break;
            }
            self.batch
                .canonical_hashes
                .insert(number, Some(ancestor_hash));
            let ancestor = self
                .get_block_header_by_hash(ancestor_hash)?
                .ok_or(StoreError::MissingParent(ancestor_hash))?;
            ancestor_hash = ancestor.parent_hash;
        }
        Ok(())
    }
}
