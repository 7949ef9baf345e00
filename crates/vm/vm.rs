mod computation;
mod constants;
mod errors;
mod execution_result;
mod interpreter;

use blockreplay_core::{
    types::{Fork, Receipt, ReceiptEra, ReceiptOutcome, Transaction},
    Address, U256,
};
use blockreplay_storage::StateStore;
use std::cmp::min;
use tracing::debug;

// Export needed types
pub use computation::{intrinsic_gas, Computation};
pub use errors::EvmError;
pub use execution_result::ExecutionResult;
pub use interpreter::{Interpreter, TransferInterpreter};

/// Applies a transaction sent by `sender` to the state, charging and refunding gas.
///
/// The sender's nonce is incremented and its balance charged even when it cannot afford the
/// upfront cost, in which case no code runs and the gas it could pay for is consumed.
/// The returned gas is net of the refund and is what the coinbase gets paid for.
pub fn execute_tx(
    tx: &Transaction,
    sender: Address,
    state: &mut dyn StateStore,
    interpreter: &dyn Interpreter,
    fork: Fork,
) -> Result<ExecutionResult, EvmError> {
    let gas_cost = tx.gas_cost();
    let upfront_cost = tx.upfront_cost();
    let balance = state.get_balance(sender);

    if balance < upfront_cost {
        state.increment_nonce(sender);
        let gas_used = if balance <= gas_cost {
            state.set_balance(sender, U256::zero());
            if tx.gas_price.is_zero() {
                0
            } else {
                // balance <= gas_limit * gas_price, so the quotient fits the gas limit
                min(balance / tx.gas_price, U256::from(tx.gas_limit)).low_u64()
            }
        } else {
            state.sub_balance(sender, gas_cost);
            tx.gas_limit
        };
        debug!(
            sender = ?sender,
            %balance,
            %upfront_cost,
            gas_used,
            "Sender cannot afford transaction"
        );
        return Ok(ExecutionResult::InsufficientFunds { gas_used });
    }

    state.sub_balance(sender, upfront_cost);
    state.increment_nonce(sender);

    state.checkpoint();
    let (success, computation) = match run_computation(tx, sender, state, interpreter, fork) {
        Ok(executed) => executed,
        Err(err) => {
            state.revert_to_checkpoint();
            return Err(err);
        }
    };

    if !success {
        state.revert_to_checkpoint();
        state.add_balance(sender, tx.value);
        return Ok(ExecutionResult::Failure {
            gas_used: tx.gas_limit,
        });
    }
    if computation.gas_remaining > tx.gas_limit {
        state.revert_to_checkpoint();
        return Err(EvmError::Computation(format!(
            "Gas remaining {} exceeds gas limit {}",
            computation.gas_remaining, tx.gas_limit
        )));
    }
    state.commit_checkpoint();

    let gas_remaining = computation.gas_remaining;
    let gas_spent = tx.gas_limit - gas_remaining;
    let gas_refunded = min(computation.refund, gas_spent / 2);
    let returned_gas = U256::from(gas_refunded) + U256::from(gas_remaining);
    state.add_balance(sender, returned_gas.saturating_mul(tx.gas_price));

    Ok(ExecutionResult::Success {
        gas_used: gas_spent - gas_refunded,
        gas_refunded,
        logs: computation.logs,
        created_address: computation.created_address,
    })
}

fn run_computation(
    tx: &Transaction,
    sender: Address,
    state: &mut dyn StateStore,
    interpreter: &dyn Interpreter,
    fork: Fork,
) -> Result<(bool, Computation), EvmError> {
    let mut computation = interpreter.setup_computation(state, tx, sender, fork)?;
    let success = computation.consume_gas(intrinsic_gas(tx, fork))
        && interpreter.exec_computation(state, &mut computation)?;
    Ok((success, computation))
}

/// Builds the receipt of a transaction that was just executed against `state`
pub fn build_receipt(
    era: ReceiptEra,
    state: &dyn StateStore,
    result: &ExecutionResult,
    cumulative_gas_used: u64,
) -> Receipt {
    let outcome = match era {
        ReceiptEra::StateRoot => ReceiptOutcome::StateRoot(state.root_hash()),
        ReceiptEra::Status => ReceiptOutcome::Status(result.is_success()),
    };
    Receipt::new(outcome, cumulative_gas_used, result.logs().to_vec())
}
