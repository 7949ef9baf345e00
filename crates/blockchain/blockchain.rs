mod chain;
pub mod constants;
pub mod error;
pub mod payload;
pub mod progress;
pub mod rewards;
mod smoke_test;

use blockreplay_core::{
    types::{
        aggregate_bloom, compute_ommers_hash, compute_receipts_root, compute_transactions_root,
        recover_sender, Block, BlockBody, BlockHeader, ChainConfig, Receipt,
    },
    H256, U256,
};
use blockreplay_storage::{StateStore, StoreTransaction};
use blockreplay_vm::{build_receipt, execute_tx, Interpreter};
use constants::{MAX_UNCLES, MAX_UNCLE_DEPTH};
use error::{ChainError, InvalidBlockError};
use rewards::apply_block_rewards;

pub use chain::Blockchain;

/// Executes a block on top of `parent` and validates the outcome against its header.
///
/// The state must hold the parent's post-state. On success it holds the block's post-state
/// and the receipts are returned; uncles are written through `transaction`. On failure both
/// the state and the transaction hold partial writes and must be discarded by the caller.
pub fn process_block(
    chain_config: &ChainConfig,
    transaction: &mut StoreTransaction,
    parent: &BlockHeader,
    block: &Block,
    state: &mut dyn StateStore,
    interpreter: &dyn Interpreter,
) -> Result<Vec<Receipt>, ChainError> {
    let header = &block.header;
    validate_parent(header, parent)?;
    validate_transactions_root(header, &block.body)?;

    let receipts = execute_transactions(chain_config, block, state, interpreter)?;
    validate_gas_used(header, &receipts)?;

    validate_ommers(header, &block.body.ommers)?;
    let ommers_hash = if block.body.ommers.is_empty() {
        compute_ommers_hash(&[])
    } else {
        transaction.persist_uncles(&block.body.ommers)
    };
    validate_ommers_hash(header, ommers_hash)?;
    apply_block_rewards(state, header, &block.body.ommers);

    validate_state_root(header, state.root_hash())?;
    validate_logs_bloom(header, &receipts)?;
    validate_receipts_root(header, &receipts)?;
    Ok(receipts)
}

/// Runs every transaction of the block in order, paying fees to the coinbase, and returns
/// their receipts
pub fn execute_transactions(
    chain_config: &ChainConfig,
    block: &Block,
    state: &mut dyn StateStore,
    interpreter: &dyn Interpreter,
) -> Result<Vec<Receipt>, ChainError> {
    let header = &block.header;
    let fork = chain_config.fork(header.number);
    let receipt_era = fork.receipt_era();
    let mut receipts = Vec::with_capacity(block.body.transactions.len());
    let mut cumulative_gas_used = 0u64;

    for (index, tx) in block.body.transactions.iter().enumerate() {
        let sender = recover_sender(tx, chain_config, header.number).ok_or_else(|| {
            InvalidBlockError::SenderRecoveryFailed {
                number: header.number,
                index,
                hash: tx.compute_hash(),
            }
        })?;

        let account_nonce = state.get_nonce(sender);
        if tx.nonce != account_nonce {
            return Err(InvalidBlockError::NonceMismatch {
                number: header.number,
                index,
                expected: account_nonce,
                actual: tx.nonce,
            }
            .into());
        }

        let available_gas = header.gas_limit.saturating_sub(cumulative_gas_used);
        if tx.gas_limit > available_gas {
            return Err(InvalidBlockError::TxGasLimitExceeded {
                number: header.number,
                index,
                available: available_gas,
                requested: tx.gas_limit,
            }
            .into());
        }

        let result = execute_tx(tx, sender, state, interpreter, fork)?;
        let gas_used = result.gas_used();
        cumulative_gas_used += gas_used;
        state.add_balance(
            header.coinbase,
            U256::from(gas_used).saturating_mul(tx.gas_price),
        );
        receipts.push(build_receipt(receipt_era, state, &result, cumulative_gas_used));
    }
    Ok(receipts)
}

fn validate_parent(header: &BlockHeader, parent: &BlockHeader) -> Result<(), ChainError> {
    let parent_hash = parent.compute_block_hash();
    if header.parent_hash != parent_hash {
        return Err(InvalidBlockError::ParentHashMismatch {
            number: header.number,
            expected: parent_hash,
            actual: header.parent_hash,
        }
        .into());
    }
    let expected_number = parent.number.saturating_add(1);
    if header.number != expected_number {
        return Err(InvalidBlockError::NumberMismatch {
            expected: expected_number,
            actual: header.number,
        }
        .into());
    }
    Ok(())
}

pub fn validate_transactions_root(
    header: &BlockHeader,
    body: &BlockBody,
) -> Result<(), ChainError> {
    let transactions_root = compute_transactions_root(&body.transactions);
    if transactions_root == header.transactions_root {
        Ok(())
    } else {
        Err(InvalidBlockError::TransactionsRootMismatch {
            number: header.number,
            expected: header.transactions_root,
            actual: transactions_root,
        }
        .into())
    }
}

/// The header's gas used must equal the cumulative gas of the last receipt
pub fn validate_gas_used(header: &BlockHeader, receipts: &[Receipt]) -> Result<(), ChainError> {
    let gas_used = receipts
        .last()
        .map(|receipt| receipt.cumulative_gas_used)
        .unwrap_or_default();
    if gas_used == header.gas_used {
        Ok(())
    } else {
        Err(InvalidBlockError::GasUsedMismatch {
            number: header.number,
            expected: header.gas_used,
            actual: gas_used,
        }
        .into())
    }
}

fn validate_ommers(header: &BlockHeader, ommers: &[BlockHeader]) -> Result<(), ChainError> {
    if ommers.len() > MAX_UNCLES {
        return Err(InvalidBlockError::TooManyUncles {
            number: header.number,
            expected: MAX_UNCLES,
            actual: ommers.len(),
        }
        .into());
    }
    for uncle in ommers {
        let depth = header.number.checked_sub(uncle.number).unwrap_or_default();
        if !(1..=MAX_UNCLE_DEPTH).contains(&depth) {
            return Err(InvalidBlockError::InvalidUncleDepth {
                number: header.number,
                uncle_number: uncle.number,
                max_depth: MAX_UNCLE_DEPTH,
            }
            .into());
        }
    }
    Ok(())
}

fn validate_ommers_hash(header: &BlockHeader, ommers_hash: H256) -> Result<(), ChainError> {
    if ommers_hash == header.ommers_hash {
        Ok(())
    } else {
        Err(InvalidBlockError::OmmersHashMismatch {
            number: header.number,
            expected: header.ommers_hash,
            actual: ommers_hash,
        }
        .into())
    }
}

/// Performs post-execution checks
pub fn validate_state_root(header: &BlockHeader, new_state_root: H256) -> Result<(), ChainError> {
    // Compare state root
    if new_state_root == header.state_root {
        Ok(())
    } else {
        Err(InvalidBlockError::StateRootMismatch {
            number: header.number,
            expected: header.state_root,
            actual: new_state_root,
        }
        .into())
    }
}

pub fn validate_logs_bloom(header: &BlockHeader, receipts: &[Receipt]) -> Result<(), ChainError> {
    let logs_bloom = aggregate_bloom(receipts);
    if logs_bloom == header.logs_bloom {
        Ok(())
    } else {
        Err(InvalidBlockError::LogsBloomMismatch {
            number: header.number,
            expected: header.logs_bloom,
            actual: logs_bloom,
        }
        .into())
    }
}

pub fn validate_receipts_root(header: &BlockHeader, receipts: &[Receipt]) -> Result<(), ChainError> {
    let receipts_root = compute_receipts_root(receipts);
    if receipts_root == header.receipts_root {
        Ok(())
    } else {
        Err(InvalidBlockError::ReceiptsRootMismatch {
            number: header.number,
            expected: header.receipts_root,
            actual: receipts_root,
        }
        .into())
    }
}
