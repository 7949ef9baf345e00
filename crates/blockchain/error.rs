use thiserror::Error;

use blockreplay_core::{types::BlockNumber, Bloom, H256};
use blockreplay_storage::error::StoreError;
use blockreplay_vm::EvmError;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Invalid Block: {0}")]
    InvalidBlock(#[from] InvalidBlockError),
    #[error("Parent block not found")]
    ParentNotFound,
    #[error("Block is not a child of the current head, its parent state is not available")]
    NonCanonicalParent,
    #[error("DB error: {0}")]
    StoreError(#[from] StoreError),
    #[error("EVM error: {0}")]
    EvmError(#[from] EvmError),
}

/// Reasons a block is rejected. Every variant names the offending block.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidBlockError {
    #[error("Block {number}: parent hash mismatch, expected {expected:#x}, got {actual:#x}")]
    ParentHashMismatch {
        number: BlockNumber,
        expected: H256,
        actual: H256,
    },
    #[error("Block number mismatch, expected {expected}, got {actual}")]
    NumberMismatch {
        expected: BlockNumber,
        actual: BlockNumber,
    },
    #[error(
        "Block {number}: transactions root mismatch, expected {expected:#x}, got {actual:#x}"
    )]
    TransactionsRootMismatch {
        number: BlockNumber,
        expected: H256,
        actual: H256,
    },
    #[error("Block {number}: could not recover sender of transaction {index} ({hash:#x})")]
    SenderRecoveryFailed {
        number: BlockNumber,
        index: usize,
        hash: H256,
    },
    #[error("Block {number}: transaction {index} nonce mismatch, expected {expected}, got {actual}")]
    NonceMismatch {
        number: BlockNumber,
        index: usize,
        expected: u64,
        actual: u64,
    },
    #[error(
        "Block {number}: transaction {index} gas limit {requested} exceeds remaining block gas {available}"
    )]
    TxGasLimitExceeded {
        number: BlockNumber,
        index: usize,
        available: u64,
        requested: u64,
    },
    #[error("Block {number}: gas used mismatch, expected {expected}, got {actual}")]
    GasUsedMismatch {
        number: BlockNumber,
        expected: u64,
        actual: u64,
    },
    #[error("Block {number}: too many uncles, expected at most {expected}, got {actual}")]
    TooManyUncles {
        number: BlockNumber,
        expected: usize,
        actual: usize,
    },
    #[error("Block {number}: uncle {uncle_number} is not between 1 and {max_depth} blocks deep")]
    InvalidUncleDepth {
        number: BlockNumber,
        uncle_number: BlockNumber,
        max_depth: u64,
    },
    #[error("Block {number}: ommers hash mismatch, expected {expected:#x}, got {actual:#x}")]
    OmmersHashMismatch {
        number: BlockNumber,
        expected: H256,
        actual: H256,
    },
    #[error("Block {number}: state root mismatch, expected {expected:#x}, got {actual:#x}")]
    StateRootMismatch {
        number: BlockNumber,
        expected: H256,
        actual: H256,
    },
    #[error("Block {number}: logs bloom mismatch, expected {expected:#x}, got {actual:#x}")]
    LogsBloomMismatch {
        number: BlockNumber,
        expected: Bloom,
        actual: Bloom,
    },
    #[error("Block {number}: receipts root mismatch, expected {expected:#x}, got {actual:#x}")]
    ReceiptsRootMismatch {
        number: BlockNumber,
        expected: H256,
        actual: H256,
    },
}
