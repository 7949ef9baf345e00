use std::cmp::max;

use blockreplay_core::{
    types::{
        aggregate_bloom, compute_ommers_hash, compute_receipts_root, compute_transactions_root,
        Block, BlockBody, BlockHash, BlockHeader, Transaction,
    },
    Address, Bloom, Bytes, H256, U256,
};
use blockreplay_storage::StateStore;
use blockreplay_vm::Interpreter;

use crate::{
    chain::Blockchain,
    constants::{GAS_LIMIT_BOUND_DIVISOR, MIN_GAS_LIMIT},
    error::ChainError,
    execute_transactions,
    rewards::apply_block_rewards,
};

pub const DEFAULT_BUILDER_GAS_CEIL: u64 = 30_000_000;

pub struct BuildPayloadArgs {
    pub parent: BlockHash,
    pub timestamp: u64,
    pub coinbase: Address,
    pub difficulty: U256,
    /// Defaults to the parent's limit moved towards [`DEFAULT_BUILDER_GAS_CEIL`]
    pub gas_limit: Option<u64>,
    pub extra_data: Bytes,
    pub transactions: Vec<Transaction>,
    pub ommers: Vec<BlockHeader>,
}

/// Builds a block on top of the chain head, executing its transactions against a copy of the
/// head state to fill in every root, the logs bloom and the gas used.
pub fn build_payload<I: Interpreter>(
    args: &BuildPayloadArgs,
    chain: &Blockchain<I>,
) -> Result<Block, ChainError> {
    let parent = chain
        .get_block_header(args.parent)?
        .ok_or(ChainError::ParentNotFound)?;
    if chain.canonical_head()?.hash != args.parent {
        return Err(ChainError::NonCanonicalParent);
    }
    let gas_limit = args
        .gas_limit
        .unwrap_or_else(|| calc_gas_limit(parent.gas_limit, DEFAULT_BUILDER_GAS_CEIL));

    let mut payload = Block {
        header: BlockHeader {
            parent_hash: args.parent,
            ommers_hash: compute_ommers_hash(&args.ommers),
            coinbase: args.coinbase,
            state_root: parent.state_root,
            transactions_root: compute_transactions_root(&args.transactions),
            receipts_root: compute_receipts_root(&[]),
            logs_bloom: Bloom::zero(),
            difficulty: args.difficulty,
            number: parent.number.saturating_add(1),
            gas_limit,
            gas_used: 0,
            timestamp: args.timestamp,
            extra_data: args.extra_data.clone(),
            mix_hash: H256::zero(),
            nonce: 0,
        },
        body: BlockBody {
            transactions: args.transactions.clone(),
            ommers: args.ommers.clone(),
        },
    };

    let mut state = chain.state().clone();
    let receipts = execute_transactions(
        chain.chain_config(),
        &payload,
        &mut state,
        chain.interpreter(),
    )?;
    apply_block_rewards(&mut state, &payload.header, &payload.body.ommers);

    payload.header.gas_used = receipts
        .last()
        .map(|receipt| receipt.cumulative_gas_used)
        .unwrap_or_default();
    payload.header.state_root = state.root_hash();
    payload.header.receipts_root = compute_receipts_root(&receipts);
    payload.header.logs_bloom = aggregate_bloom(&receipts);
    Ok(payload)
}

/// Moves the parent gas limit towards `desired_limit`, by at most parent / 1024 per block
pub fn calc_gas_limit(parent_gas_limit: u64, desired_limit: u64) -> u64 {
    let delta = (parent_gas_limit / GAS_LIMIT_BOUND_DIVISOR).saturating_sub(1);
    let desired_limit = max(desired_limit, MIN_GAS_LIMIT);
    if parent_gas_limit < desired_limit {
        return (parent_gas_limit + delta).min(desired_limit);
    }
    if parent_gas_limit > desired_limit {
        return parent_gas_limit.saturating_sub(delta).max(desired_limit);
    }
    parent_gas_limit
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gas_limit_moves_towards_ceiling() {
        assert_eq!(calc_gas_limit(8_000_000, 30_000_000), 8_000_000 + 7_811);
        assert_eq!(calc_gas_limit(30_000_000, 30_000_000), 30_000_000);
        assert_eq!(calc_gas_limit(29_999_000, 30_000_000), 30_000_000);
        assert_eq!(calc_gas_limit(40_000_000, 30_000_000), 40_000_000 - 39_061);
        assert_eq!(calc_gas_limit(10_000, 0), 10_000 - 8);
    }
}
