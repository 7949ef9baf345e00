use thiserror::Error;

/// Structural failures of the execution layer.
///
/// Running out of funds or a failing computation are regular execution outcomes and are
/// reported through [`ExecutionResult`](crate::ExecutionResult), never through this type.
#[derive(Debug, Error)]
pub enum EvmError {
    #[error("Invalid Transaction: {0}")]
    Transaction(String),
    #[error("Invalid Computation: {0}")]
    Computation(String),
    #[error("{0}")]
    Custom(String),
}
