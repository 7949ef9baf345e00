use ethereum_types::U256;

// === YELLOW PAPER constants ===

/// Block reward credited to the coinbase, 5 ether
pub const BLOCK_REWARD: U256 = U256([5_000_000_000_000_000_000, 0, 0, 0]);

/// An uncle at depth d earns BLOCK_REWARD * (8 - d) / 8
pub const UNCLE_DEPTH_PENALTY_FACTOR: u64 = 8;

/// The including block earns BLOCK_REWARD / 32 per uncle
pub const NEPHEW_REWARD_DIVISOR: u64 = 32;

/// Maximum amount of uncles a block may include
pub const MAX_UNCLES: usize = 2;

/// Maximum distance between a block and the uncles it includes
pub const MAX_UNCLE_DEPTH: u64 = 6;

pub const GAS_LIMIT_BOUND_DIVISOR: u64 = 1024;

pub const MIN_GAS_LIMIT: u64 = 5000;
