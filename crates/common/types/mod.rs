mod account;
mod block;
mod constants;
mod genesis;
mod network;
mod receipt;
pub mod transaction;
mod trie_root;

pub use account::*;
pub use block::*;
pub use constants::*;
pub use genesis::*;
pub use network::*;
pub use receipt::*;
pub use transaction::*;
pub use trie_root::*;
