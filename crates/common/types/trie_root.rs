use ethereum_types::H256;
use hash_db::Hasher;
use keccak_hash::keccak;
use plain_hasher::PlainHasher;

/// Keccak256 hasher used to drive the `triehash` root computations.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct KeccakHasher;

impl Hasher for KeccakHasher {
    type Out = H256;
    type StdHasher = PlainHasher;
    const LENGTH: usize = 32;

    fn hash(x: &[u8]) -> Self::Out {
        keccak(x)
    }
}

/// Root of a trie keyed by RLP(index), as used for transactions and receipts.
pub fn ordered_trie_root<I, V>(values: I) -> H256
where
    I: IntoIterator<Item = V>,
    V: AsRef<[u8]>,
{
    triehash::ordered_trie_root::<KeccakHasher, _>(values)
}

/// Root of a trie whose keys are hashed before insertion, as used for the world state and
/// account storage.
pub fn secure_trie_root<I, K, V>(entries: I) -> H256
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    triehash::sec_trie_root::<KeccakHasher, _, _, _>(entries)
}
