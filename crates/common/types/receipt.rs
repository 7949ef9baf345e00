use bytes::Bytes;
use ethereum_types::{Address, Bloom, BloomInput, H256};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};

pub type Index = u64;

/// First field of a receipt. Which variant is produced depends on the fork (see
/// [`ReceiptEra`](super::ReceiptEra)).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiptOutcome {
    /// Intermediate state root after the transaction (pre-Byzantium)
    StateRoot(H256),
    /// Execution status flag (EIP-658)
    Status(bool),
}

/// Result of a transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub outcome: ReceiptOutcome,
    pub cumulative_gas_used: u64,
    pub bloom: Bloom,
    pub logs: Vec<Log>,
}

impl Receipt {
    pub fn new(outcome: ReceiptOutcome, cumulative_gas_used: u64, logs: Vec<Log>) -> Self {
        Self {
            outcome,
            cumulative_gas_used,
            bloom: bloom_from_logs(&logs),
            logs,
        }
    }

    /// Execution status, only known for receipts carrying a status flag
    pub fn succeeded(&self) -> Option<bool> {
        match self.outcome {
            ReceiptOutcome::Status(succeeded) => Some(succeeded),
            ReceiptOutcome::StateRoot(_) => None,
        }
    }
}

pub fn bloom_from_logs(logs: &[Log]) -> Bloom {
    let mut bloom = Bloom::zero();
    for log in logs {
        bloom.accrue(BloomInput::Raw(log.address.as_ref()));
        for topic in log.topics.iter() {
            bloom.accrue(BloomInput::Raw(topic.as_ref()));
        }
    }
    bloom
}

/// Block level bloom: bitwise OR of every receipt bloom
pub fn aggregate_bloom<'a, I>(receipts: I) -> Bloom
where
    I: IntoIterator<Item = &'a Receipt>,
{
    receipts
        .into_iter()
        .fold(Bloom::zero(), |mut bloom, receipt| {
            bloom.accrue_bloom(&receipt.bloom);
            bloom
        })
}

impl Decodable for ReceiptOutcome {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.size() == 32 {
            return rlp.as_val().map(Self::StateRoot);
        }
        match rlp.as_val::<u8>()? {
            0 => Ok(Self::Status(false)),
            1 => Ok(Self::Status(true)),
            _ => Err(DecoderError::Custom("invalid receipt status")),
        }
    }
}

impl Encodable for Receipt {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        match self.outcome {
            ReceiptOutcome::StateRoot(root) => s.append(&root),
            // true encodes as 0x01, false as the empty string
            ReceiptOutcome::Status(succeeded) => s.append(&(succeeded as u8)),
        };
        s.append(&self.cumulative_gas_used);
        s.append(&self.bloom);
        s.append_list::<Log, Log>(&self.logs);
    }
}

impl Decodable for Receipt {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Receipt {
            outcome: rlp.val_at(0)?,
            cumulative_gas_used: rlp.val_at(1)?,
            bloom: rlp.val_at(2)?,
            logs: rlp.list_at(3)?,
        })
    }
}

/// Data record produced during the execution of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    #[serde(with = "crate::serde_utils::bytes")]
    pub data: Bytes,
}

impl Encodable for Log {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.address);
        s.append_list::<H256, H256>(&self.topics);
        s.append(&self.data.to_vec());
    }
}

impl Decodable for Log {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let data: Vec<u8> = rlp.val_at(2)?;
        Ok(Log {
            address: rlp.val_at(0)?,
            topics: rlp.list_at(1)?,
            data: Bytes::from(data),
        })
    }
}
