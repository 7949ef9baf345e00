use blockreplay_core::types::Log;
use ethereum_types::Address;

/// Outcome of applying one transaction to the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Success {
        /// Gas consumed, net of the refund
        gas_used: u64,
        gas_refunded: u64,
        logs: Vec<Log>,
        created_address: Option<Address>,
    },
    /// The computation failed, spends the whole gas limit
    Failure { gas_used: u64 },
    /// The sender could not pay the upfront cost. No code ran.
    InsufficientFunds { gas_used: u64 },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    pub fn gas_used(&self) -> u64 {
        match self {
            ExecutionResult::Success { gas_used, .. } => *gas_used,
            ExecutionResult::Failure { gas_used } => *gas_used,
            ExecutionResult::InsufficientFunds { gas_used } => *gas_used,
        }
    }

    pub fn logs(&self) -> &[Log] {
        match self {
            ExecutionResult::Success { logs, .. } => logs,
            _ => &[],
        }
    }
}
