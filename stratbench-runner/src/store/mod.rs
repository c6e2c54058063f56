//! Persistence collaborators: strategy definitions and backtest results.

pub mod results;
pub mod strategies;

use std::path::PathBuf;

use stratbench_core::strategy::StrategyStatus;
use thiserror::Error;

pub use results::{InMemoryResultStore, JsonlResultStore, ResultStore};
pub use strategies::{InMemoryStrategyStore, StrategyFile, StrategyStore};

/// Errors from strategy or result storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("strategy not found: {0}")]
    NotFound(String),

    #[error("strategy '{id}' status is {actual}, expected {expected}")]
    StatusConflict {
        id: String,
        expected: StrategyStatus,
        actual: StrategyStatus,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cannot parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("store lock poisoned")]
    Poisoned,
}
