use blockreplay_core::types::{Fork, Transaction, TxKind};
use blockreplay_storage::StateStore;
use ethereum_types::Address;
use tracing::debug;

use crate::{computation::Computation, errors::EvmError};

/// Seam to the bytecode interpreter.
///
/// The executor sets a computation up once the upfront cost has been charged, charges the
/// intrinsic gas and then hands it over for execution. Every state write performed by
/// [`Interpreter::exec_computation`] is discarded when it reports failure.
pub trait Interpreter {
    fn setup_computation(
        &self,
        _state: &dyn StateStore,
        tx: &Transaction,
        sender: Address,
        fork: Fork,
    ) -> Result<Computation, EvmError> {
        Ok(Computation::new(tx, sender, fork))
    }

    /// Runs the computation, returning whether it succeeded
    fn exec_computation(
        &self,
        state: &mut dyn StateStore,
        computation: &mut Computation,
    ) -> Result<bool, EvmError>;
}

/// Interpreter for transactions that need no bytecode: plain value transfers to accounts
/// without code and contract creations with empty init code. Anything else fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransferInterpreter;

impl Interpreter for TransferInterpreter {
    fn exec_computation(
        &self,
        state: &mut dyn StateStore,
        computation: &mut Computation,
    ) -> Result<bool, EvmError> {
        match computation.kind {
            TxKind::Call(to) => {
                if !state.get_code(to).is_empty() {
                    debug!(to = ?to, "Call target has code, cannot interpret it");
                    return Ok(false);
                }
                state.add_balance(to, computation.value);
                Ok(true)
            }
            TxKind::Create => {
                let address = computation.created_address.ok_or_else(|| {
                    EvmError::Computation("Creation without a derived address".to_string())
                })?;
                if !computation.data.is_empty() {
                    debug!(address = ?address, "Init code present, cannot interpret it");
                    return Ok(false);
                }
                if state.get_nonce(address) != 0 || !state.get_code(address).is_empty() {
                    debug!(address = ?address, "Contract address collision");
                    return Ok(false);
                }
                state.add_balance(address, computation.value);
                // EIP-161
                if computation.fork >= Fork::SpuriousDragon {
                    state.set_nonce(address, 1);
                }
                Ok(true)
            }
        }
    }
}
