//! Pure backtest entry points without stores or I/O.
//!
//! - `run_backtest_on_window()`: definition + filtered bars → result.
//! - `run_backtest_on_bars()`: same, but filters raw bars to a date range first.

use chrono::NaiveDate;
use stratbench_core::domain::{Bar, BarWindow};
use stratbench_core::engine::{simulate_definition, SimulationError};
use stratbench_core::strategy::StrategyDefinition;

use crate::error::BacktestError;
use crate::result::BacktestResult;

/// Simulate `definition` over `window` and derive the performance summary.
pub fn run_backtest_on_window(
    definition: &StrategyDefinition,
    window: &BarWindow,
    initial_capital: f64,
) -> Result<BacktestResult, BacktestError> {
    if window.is_empty() {
        return Err(no_data(window.symbol()));
    }
    let outcome = simulate_definition(definition, window, initial_capital)
        .map_err(|e| classify_simulation_error(&definition.id, e))?;
    Ok(BacktestResult::from_outcome(outcome))
}

/// Bad capital and unbuildable rules are input problems; the rest is computation.
pub(crate) fn classify_simulation_error(strategy_id: &str, e: SimulationError) -> BacktestError {
    match e {
        SimulationError::Strategy(source) => BacktestError::InvalidStrategy {
            id: strategy_id.to_string(),
            source,
        },
        SimulationError::InvalidCapital(capital) => BacktestError::InputValidation(format!(
            "initial_capital must be positive, got {capital}"
        )),
        other => BacktestError::Computation(other),
    }
}

/// Restrict `bars` to `[start, end]` and run.
pub fn run_backtest_on_bars(
    definition: &StrategyDefinition,
    symbol: &str,
    bars: Vec<Bar>,
    start: NaiveDate,
    end: NaiveDate,
    initial_capital: f64,
) -> Result<BacktestResult, BacktestError> {
    let window = filter_window(symbol, bars, start, end)?;
    run_backtest_on_window(definition, &window, initial_capital)
}

/// Build the filtered window, mapping malformed or empty data to `DataUnavailable`.
pub(crate) fn filter_window(
    symbol: &str,
    bars: Vec<Bar>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BarWindow, BacktestError> {
    let window = BarWindow::from_range(symbol, bars, start, end)
        .map_err(|e| BacktestError::DataUnavailable(format!("malformed bars for {symbol}: {e}")))?;
    if window.is_empty() {
        return Err(BacktestError::DataUnavailable(format!(
            "no data for {symbol} between {start} and {end}"
        )));
    }
    Ok(window)
}

fn no_data(symbol: &str) -> BacktestError {
    BacktestError::DataUnavailable(format!("no data for {symbol} in the requested range"))
}
