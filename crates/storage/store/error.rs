use blockreplay_core::types::BlockHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Custom(String),
    #[error("Parent header {0:#x} not found")]
    MissingParent(BlockHash),
    #[error("Store lock was poisoned by a panicking writer")]
    LockPoisoned,
}
