use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, SecretKey, SECP256K1,
};
use sha3::{Digest, Keccak256};

use super::{BlockNumber, ChainConfig, Fork, SECP256K1N_HALF};

/// Signed legacy transaction.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Transaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

/// The transaction's kind: call or create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TxKind {
    Call(Address),
    #[default]
    Create,
}

impl Decodable for TxKind {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.is_empty() {
            return Ok(Self::Create);
        }
        rlp.as_val().map(Self::Call)
    }
}

impl Encodable for Transaction {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(9);
        self.append_unsigned_fields(s);
        s.append(&self.v);
        s.append(&self.r);
        s.append(&self.s);
    }
}

impl Decodable for Transaction {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 9 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let data: Vec<u8> = rlp.val_at(5)?;
        Ok(Transaction {
            nonce: rlp.val_at(0)?,
            gas_price: rlp.val_at(1)?,
            gas_limit: rlp.val_at(2)?,
            to: rlp.val_at(3)?,
            value: rlp.val_at(4)?,
            data: Bytes::from(data),
            v: rlp.val_at(6)?,
            r: rlp.val_at(7)?,
            s: rlp.val_at(8)?,
        })
    }
}

impl Transaction {
    fn append_unsigned_fields(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas_limit);
        match self.to {
            TxKind::Call(address) => s.append(&address),
            TxKind::Create => s.append_empty_data(),
        };
        s.append(&self.value);
        s.append(&self.data.to_vec());
    }

    pub fn compute_hash(&self) -> H256 {
        keccak(rlp::encode(self))
    }

    pub fn is_contract_creation(&self) -> bool {
        matches!(self.to, TxKind::Create)
    }

    /// Maximum amount of wei the sender pays for gas: gas_limit * gas_price
    pub fn gas_cost(&self) -> U256 {
        self.gas_price.saturating_mul(self.gas_limit.into())
    }

    /// Amount reserved from the sender before execution: gas_limit * gas_price + value
    pub fn upfront_cost(&self) -> U256 {
        self.gas_cost().saturating_add(self.value)
    }

    /// Chain id encoded into `v` by EIP-155 signatures, `None` for unprotected ones
    pub fn chain_id(&self) -> Option<u64> {
        (self.v >= 35).then(|| (self.v - 35) / 2)
    }

    pub fn protected(&self) -> bool {
        self.chain_id().is_some()
    }

    fn y_parity(&self) -> Option<bool> {
        match self.v {
            27 | 28 => Some(self.v == 28),
            v if v >= 35 => Some((v - 35) % 2 == 1),
            _ => None,
        }
    }

    /// RLP payload whose hash is signed by the sender.
    pub fn signing_payload(&self, chain_id: Option<u64>) -> Vec<u8> {
        let mut stream = match chain_id {
            Some(_) => RlpStream::new_list(9),
            None => RlpStream::new_list(6),
        };
        self.append_unsigned_fields(&mut stream);
        if let Some(chain_id) = chain_id {
            stream.append(&chain_id);
            stream.append(&0u8);
            stream.append(&0u8);
        }
        stream.out().to_vec()
    }

    /// Recovers the signer from the signature, without checking fork rules.
    pub fn sender(&self) -> Option<Address> {
        let y_parity = self.y_parity()?;
        let payload = self.signing_payload(self.chain_id());
        recover_address(&self.r, &self.s, y_parity, &payload)
    }

    /// Signs the transaction, protecting it with `chain_id` when given (EIP-155).
    pub fn sign(mut self, secret_key: &SecretKey, chain_id: Option<u64>) -> Transaction {
        let digest: [u8; 32] = Keccak256::digest(self.signing_payload(chain_id)).into();
        let signature =
            SECP256K1.sign_ecdsa_recoverable(&Message::from_digest(digest), secret_key);
        let (recovery_id, compact) = signature.serialize_compact();
        let parity = recovery_id.to_i32() as u64;
        self.v = match chain_id {
            Some(chain_id) => 35 + chain_id * 2 + parity,
            None => 27 + parity,
        };
        self.r = U256::from_big_endian(&compact[..32]);
        self.s = U256::from_big_endian(&compact[32..]);
        self
    }
}

/// Recovers the sender of `tx` as included in block `block_number`.
///
/// Returns `None` when the signature is malformed or not valid under the fork rules in
/// effect: high-s signatures from Homestead (EIP-2), and replay protected signatures before
/// EIP-155 activation or for a different chain.
pub fn recover_sender(
    tx: &Transaction,
    config: &ChainConfig,
    block_number: BlockNumber,
) -> Option<Address> {
    if config.fork(block_number) >= Fork::Homestead && tx.s > SECP256K1N_HALF {
        return None;
    }
    if let Some(chain_id) = tx.chain_id() {
        if !config.is_eip155_activated(block_number) || chain_id != config.chain_id {
            return None;
        }
    }
    tx.sender()
}

fn recover_address(
    signature_r: &U256,
    signature_s: &U256,
    signature_y_parity: bool,
    message: &[u8],
) -> Option<Address> {
    // Create signature
    let mut signature_bytes = [0; 64];
    signature_r.to_big_endian(&mut signature_bytes[0..32]);
    signature_s.to_big_endian(&mut signature_bytes[32..]);
    let recovery_id = RecoveryId::from_i32(signature_y_parity as i32).ok()?;
    let signature = RecoverableSignature::from_compact(&signature_bytes, recovery_id).ok()?;
    // Hash message
    let msg_digest: [u8; 32] = Keccak256::digest(message).into();
    // Recover public key
    let public = SECP256K1
        .recover_ecdsa(&Message::from_digest(msg_digest), &signature)
        .ok()?;
    // Hash public key to obtain address
    let hash = Keccak256::digest(&public.serialize_uncompressed()[1..]);
    Some(Address::from_slice(&hash[12..]))
}
