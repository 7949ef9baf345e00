use blockreplay_core::{
    types::{BlockHeader, BlockNumber},
    U256,
};
use blockreplay_storage::StateStore;

use crate::constants::{BLOCK_REWARD, NEPHEW_REWARD_DIVISOR, UNCLE_DEPTH_PENALTY_FACTOR};

/// Reward for the miner of an uncle included by block `block_number`
pub fn uncle_reward(block_number: BlockNumber, uncle_number: BlockNumber) -> U256 {
    let factor = (uncle_number + UNCLE_DEPTH_PENALTY_FACTOR).saturating_sub(block_number);
    BLOCK_REWARD * U256::from(factor) / U256::from(UNCLE_DEPTH_PENALTY_FACTOR)
}

/// Reward for the miner of a block including `uncle_count` uncles
pub fn miner_reward(uncle_count: usize) -> U256 {
    BLOCK_REWARD + BLOCK_REWARD / U256::from(NEPHEW_REWARD_DIVISOR) * U256::from(uncle_count)
}

/// Credits the block reward to the coinbase and the uncle rewards to each uncle's coinbase
pub fn apply_block_rewards(state: &mut dyn StateStore, header: &BlockHeader, ommers: &[BlockHeader]) {
    for uncle in ommers {
        state.add_balance(uncle.coinbase, uncle_reward(header.number, uncle.number));
    }
    state.add_balance(header.coinbase, miner_reward(ommers.len()));
}
