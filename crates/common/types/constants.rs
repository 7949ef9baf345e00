use ethereum_types::U256;

/// Keccak256(""), the code hash of an account without code
pub use keccak_hash::KECCAK_EMPTY as EMPTY_KECCACK_HASH;
/// Keccak256(RLP([])), the ommers hash of a block without uncles
pub use keccak_hash::KECCAK_EMPTY_LIST_RLP as EMPTY_OMMERS_HASH;
/// Hash value for an empty trie, equal to keccak(RLP_NULL)
pub use keccak_hash::KECCAK_NULL_RLP as EMPTY_TRIE_HASH;

/// Half of the secp256k1 curve order. Signatures with a greater `s` are rejected from
/// Homestead onwards (EIP-2).
pub const SECP256K1N_HALF: U256 = U256([
    0xdfe9_2f46_681b_20a0,
    0x5d57_6e73_57a4_501d,
    0xffff_ffff_ffff_ffff,
    0x7fff_ffff_ffff_ffff,
]);
