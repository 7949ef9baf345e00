use crate::error::StoreError;
use blockreplay_core::types::{BlockBody, BlockHash, BlockHeader, BlockNumber, ChainConfig, Receipt};
use ethereum_types::{H256, U256};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use super::api::{ChainHead, StoreEngine, WriteBatch};

#[derive(Default, Clone, Debug)]
pub struct Store(Arc<Mutex<StoreInner>>);

#[derive(Default, Debug)]
struct StoreInner {
    chain_config: Option<ChainConfig>,
    head: Option<ChainHead>,
    canonical_hashes: HashMap<BlockNumber, BlockHash>,
    headers: HashMap<BlockHash, BlockHeader>,
    bodies: HashMap<BlockHash, BlockBody>,
    block_total_difficulties: HashMap<BlockHash, U256>,
    // Uncle headers keyed by the ommers hash of the including block
    ommers: HashMap<H256, Vec<BlockHeader>>,
    receipts: HashMap<BlockHash, Vec<Receipt>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> Result<MutexGuard<'_, StoreInner>, StoreError> {
        self.0.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl StoreEngine for Store {
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        // A single guard covers the whole batch, readers never see it half applied
        let mut store = self.inner()?;
        store.headers.extend(batch.headers);
        store
            .block_total_difficulties
            .extend(batch.total_difficulties);
        store.bodies.extend(batch.bodies);
        store.ommers.extend(batch.ommers);
        store.receipts.extend(batch.receipts);
        for (number, hash) in batch.canonical_hashes {
            match hash {
                Some(hash) => store.canonical_hashes.insert(number, hash),
                None => store.canonical_hashes.remove(&number),
            };
        }
        if let Some(head) = batch.head {
            store.head = Some(head);
        }
        Ok(())
    }

    fn get_block_header_by_hash(
        &self,
        block_hash: BlockHash,
    ) -> Result<Option<BlockHeader>, StoreError> {
        Ok(self.inner()?.headers.get(&block_hash).cloned())
    }

    fn get_block_body_by_hash(
        &self,
        block_hash: BlockHash,
    ) -> Result<Option<BlockBody>, StoreError> {
        Ok(self.inner()?.bodies.get(&block_hash).cloned())
    }

    fn get_block_total_difficulty(
        &self,
        block_hash: BlockHash,
    ) -> Result<Option<U256>, StoreError> {
        Ok(self
            .inner()?
            .block_total_difficulties
            .get(&block_hash)
            .copied())
    }

    fn get_ommers(&self, ommers_hash: H256) -> Result<Option<Vec<BlockHeader>>, StoreError> {
        Ok(self.inner()?.ommers.get(&ommers_hash).cloned())
    }

    fn get_receipts(&self, block_hash: BlockHash) -> Result<Option<Vec<Receipt>>, StoreError> {
        Ok(self.inner()?.receipts.get(&block_hash).cloned())
    }

    fn get_canonical_block_hash(
        &self,
        block_number: BlockNumber,
    ) -> Result<Option<BlockHash>, StoreError> {
        Ok(self.inner()?.canonical_hashes.get(&block_number).copied())
    }

    fn get_canonical_head(&self) -> Result<Option<ChainHead>, StoreError> {
        Ok(self.inner()?.head)
    }

    fn set_chain_config(&self, chain_config: &ChainConfig) -> Result<(), StoreError> {
        self.inner()?.chain_config = Some(*chain_config);
        Ok(())
    }

    fn get_chain_config(&self) -> Result<Option<ChainConfig>, StoreError> {
        Ok(self.inner()?.chain_config)
    }
}
