//! Error taxonomy of the backtest orchestrator.

use stratbench_core::engine::SimulationError;
use stratbench_core::strategy::{StrategyError, StrategyStatus};
use thiserror::Error;

use crate::data_source::DataError;
use crate::store::StoreError;

/// Coarse class of a failure, for callers that map errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request or unknown strategy; the simulation never started.
    InputValidation,
    /// Another run holds the strategy.
    Conflict,
    /// No bars for the request.
    DataUnavailable,
    /// Invalid numeric state during simulation.
    Computation,
    /// Strategy or result storage failed.
    Persistence,
}

/// Errors from running a backtest. No partial result is persisted for any of them.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("invalid request: {0}")]
    InputValidation(String),

    #[error("strategy not found: {0}")]
    StrategyNotFound(String),

    #[error("invalid strategy '{id}': {source}")]
    InvalidStrategy {
        id: String,
        #[source]
        source: StrategyError,
    },

    #[error("strategy '{id}' is {status}; a backtest can only start from inactive")]
    StrategyBusy { id: String, status: StrategyStatus },

    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    #[error("simulation failed: {0}")]
    Computation(#[from] SimulationError),

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl BacktestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BacktestError::InputValidation(_)
            | BacktestError::StrategyNotFound(_)
            | BacktestError::InvalidStrategy { .. } => ErrorKind::InputValidation,
            BacktestError::StrategyBusy { .. } => ErrorKind::Conflict,
            BacktestError::DataUnavailable(_) => ErrorKind::DataUnavailable,
            BacktestError::Computation(_) => ErrorKind::Computation,
            BacktestError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

impl From<DataError> for BacktestError {
    fn from(e: DataError) -> Self {
        BacktestError::DataUnavailable(e.to_string())
    }
}
