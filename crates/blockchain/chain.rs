use blockreplay_core::{
    types::{Block, BlockHash, BlockHeader, ChainConfig, Genesis, Receipt},
    Address, U256,
};
use blockreplay_storage::{
    error::StoreError, ChainHead, EngineType, StateStore, Store, StoreTransaction, WorldState,
};
use blockreplay_vm::{Interpreter, TransferInterpreter};
use tracing::{info, warn};

use crate::{error::ChainError, process_block, progress::ImportProgress};

/// Replays blocks on top of a genesis state, keeping the post-state of the canonical head.
///
/// Imports only extend the current head: the world state holds a single post-state, so a
/// block whose parent is not the head is refused with [`ChainError::NonCanonicalParent`].
#[derive(Debug)]
pub struct Blockchain<I = TransferInterpreter> {
    chain_config: ChainConfig,
    store: Store,
    state: WorldState,
    interpreter: I,
}

impl Blockchain {
    /// Starts a chain from `genesis` on an in-memory store, using the value transfer interpreter
    pub fn from_genesis(genesis: &Genesis) -> Result<Self, ChainError> {
        let store = Store::new(EngineType::InMemory)?;
        Self::with_interpreter(genesis, store, TransferInterpreter)
    }
}

impl<I: Interpreter> Blockchain<I> {
    pub fn with_interpreter(
        genesis: &Genesis,
        store: Store,
        interpreter: I,
    ) -> Result<Self, ChainError> {
        let genesis_hash = store.add_initial_state(genesis)?;
        info!(
            hash = ?genesis_hash,
            chain_id = genesis.config.chain_id,
            "Initialized chain from genesis"
        );
        Ok(Self {
            chain_config: genesis.config,
            store,
            state: WorldState::from_genesis(genesis),
            interpreter,
        })
    }

    /// Executes, validates and stores a block. A rejected block leaves no trace in either the
    /// store or the world state.
    pub fn import_block(&mut self, block: &Block) -> Result<BlockHash, ChainError> {
        self.import_atomically(std::slice::from_ref(block))
    }

    /// Imports a batch of consecutive blocks. Either every block is imported or none is.
    pub fn import_blocks(&mut self, blocks: &[Block]) -> Result<Option<BlockHash>, ChainError> {
        if blocks.is_empty() {
            return Ok(None);
        }
        let head = self.import_atomically(blocks)?;
        Ok(Some(head))
    }

    pub fn canonical_head(&self) -> Result<ChainHead, ChainError> {
        self.store
            .get_canonical_head()?
            .ok_or_else(|| StoreError::Custom("Canonical head not found".to_string()).into())
    }

    pub fn get_block_header(&self, hash: BlockHash) -> Result<Option<BlockHeader>, ChainError> {
        Ok(self.store.get_block_header_by_hash(hash)?)
    }

    pub fn receipts(&self, hash: BlockHash) -> Result<Option<Vec<Receipt>>, ChainError> {
        Ok(self.store.get_receipts(hash)?)
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.state.get_balance(address)
    }

    pub fn nonce(&self, address: Address) -> u64 {
        self.state.get_nonce(address)
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn chain_config(&self) -> &ChainConfig {
        &self.chain_config
    }

    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    fn import_atomically(&mut self, blocks: &[Block]) -> Result<BlockHash, ChainError> {
        let mut transaction = self.store.begin_transaction();
        let mut progress = ImportProgress::default();
        self.state.checkpoint();

        let mut head = None;
        for block in blocks {
            match self.execute_and_persist(&mut transaction, block) {
                Ok(hash) => {
                    progress.record(block);
                    head = Some(hash);
                }
                Err(err) => {
                    warn!(
                        number = block.header.number,
                        hash = ?block.hash(),
                        "Rejected block: {err}"
                    );
                    self.state.revert_to_checkpoint();
                    return Err(err);
                }
            }
        }

        if let Err(err) = transaction.commit() {
            self.state.revert_to_checkpoint();
            return Err(err.into());
        }
        self.state.commit_checkpoint();
        progress.finish();

        head.ok_or_else(|| StoreError::Custom("No blocks imported".to_string()).into())
    }

    fn execute_and_persist(
        &mut self,
        transaction: &mut StoreTransaction,
        block: &Block,
    ) -> Result<BlockHash, ChainError> {
        let parent_hash = block.header.parent_hash;
        let parent = transaction
            .get_block_header_by_hash(parent_hash)?
            .ok_or(ChainError::ParentNotFound)?;
        let head = transaction
            .get_canonical_head()?
            .ok_or(ChainError::ParentNotFound)?;
        if head.hash != parent_hash {
            return Err(ChainError::NonCanonicalParent);
        }

        let receipts = process_block(
            &self.chain_config,
            transaction,
            &parent,
            block,
            &mut self.state,
            &self.interpreter,
        )?;
        let hash = transaction.persist_block(block, receipts)?;
        info!(
            number = block.header.number,
            hash = ?hash,
            transactions = block.body.transactions.len(),
            gas_used = block.header.gas_used,
            "Imported block"
        );
        Ok(hash)
    }
}
