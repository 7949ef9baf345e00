use blockreplay_core::types::{create_address, Fork, Log, Transaction, TxKind};
use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::constants::{
    TX_CREATE_GAS_COST, TX_DATA_NON_ZERO_GAS, TX_DATA_NON_ZERO_GAS_EIP2028,
    TX_DATA_ZERO_GAS_COST, TX_GAS_COST,
};

/// Execution context of a single transaction, handed to an
/// [`Interpreter`](crate::Interpreter) and read back by the executor once it finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Computation {
    pub fork: Fork,
    pub sender: Address,
    pub kind: TxKind,
    /// Address of the account being created, for creation transactions
    pub created_address: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,
    pub gas_remaining: u64,
    /// Refund counter, capped by the executor once the computation succeeds
    pub refund: u64,
    pub logs: Vec<Log>,
}

impl Computation {
    pub fn new(tx: &Transaction, sender: Address, fork: Fork) -> Self {
        let created_address = match tx.to {
            TxKind::Create => Some(create_address(sender, tx.nonce)),
            TxKind::Call(_) => None,
        };
        Self {
            fork,
            sender,
            kind: tx.to,
            created_address,
            value: tx.value,
            data: tx.data.clone(),
            gas_limit: tx.gas_limit,
            gas_remaining: tx.gas_limit,
            refund: 0,
            logs: Vec::new(),
        }
    }

    /// Account receiving the value, either the call target or the created contract
    pub fn target(&self) -> Option<Address> {
        match self.kind {
            TxKind::Call(to) => Some(to),
            TxKind::Create => self.created_address,
        }
    }

    /// Charges `amount` gas. Running out of gas leaves no gas remaining and returns false.
    pub fn consume_gas(&mut self, amount: u64) -> bool {
        match self.gas_remaining.checked_sub(amount) {
            Some(remaining) => {
                self.gas_remaining = remaining;
                true
            }
            None => {
                self.gas_remaining = 0;
                false
            }
        }
    }

    pub fn gas_used(&self) -> u64 {
        self.gas_limit.saturating_sub(self.gas_remaining)
    }

    pub fn add_refund(&mut self, amount: u64) {
        self.refund = self.refund.saturating_add(amount);
    }

    pub fn add_log(&mut self, log: Log) {
        self.logs.push(log);
    }
}

/// Gas charged before any code runs: a base cost plus a cost per payload byte.
pub fn intrinsic_gas(tx: &Transaction, fork: Fork) -> u64 {
    let non_zero_cost = if fork >= Fork::Istanbul {
        TX_DATA_NON_ZERO_GAS_EIP2028
    } else {
        TX_DATA_NON_ZERO_GAS
    };
    let data_cost = tx.data.iter().fold(0u64, |acc, byte| {
        acc.saturating_add(if *byte == 0 {
            TX_DATA_ZERO_GAS_COST
        } else {
            non_zero_cost
        })
    });

    let base_cost = if tx.is_contract_creation() && fork >= Fork::Homestead {
        TX_CREATE_GAS_COST
    } else {
        TX_GAS_COST
    };

    base_cost.saturating_add(data_cost)
}
