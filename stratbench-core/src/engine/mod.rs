//! Simulation engine: a single pass over a bar window.
//!
//! Per bar: the rule decides, the position manager applies the signal, and
//! the equity tracker records mark-to-market equity. After the last bar any
//! open position is valued but not traded.

pub mod position_manager;
pub mod simulate;

use chrono::NaiveDate;
use thiserror::Error;

use crate::strategy::StrategyError;

pub use position_manager::PositionManager;
pub use simulate::{simulate, simulate_definition, SimulationOutcome};

/// Errors raised before or during the bar loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("bar window is empty")]
    EmptyWindow,

    #[error("initial capital must be finite and positive, got {0}")]
    InvalidCapital(f64),

    #[error("bar {index} ({date}) has non-positive close {close}")]
    NonPositiveClose {
        index: usize,
        date: NaiveDate,
        close: f64,
    },

    #[error("cannot size position at bar {index}: capital {capital}, close {close}")]
    InvalidSizing {
        index: usize,
        capital: f64,
        close: f64,
    },

    #[error(transparent)]
    Strategy(#[from] StrategyError),
}
