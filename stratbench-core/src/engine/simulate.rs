//! The bar loop.

use serde::{Deserialize, Serialize};

use crate::domain::{BarWindow, EquityPoint, EquityTracker, OpenPosition, Trade};
use crate::strategy::{build_rule, Signal, StrategyDefinition, StrategyRule};

use super::{PositionManager, SimulationError};

/// Raw output of one simulation, before performance statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub symbol: String,
    pub initial_capital: f64,
    /// Cash after the last realized trade, or the mark-to-market value of a
    /// position still open after the last bar.
    pub final_capital: f64,
    pub trades: Vec<Trade>,
    /// One point per bar, in bar order, starting at bar 0.
    pub equity_curve: Vec<EquityPoint>,
    /// Largest peak-to-trough decline, in percent.
    pub max_drawdown: f64,
    pub open_position: Option<OpenPosition>,
    pub bar_count: usize,
    pub warmup_bars: usize,
    /// Non-hold signals the rule emitted.
    pub signal_count: usize,
}

/// Build the rule for `definition` and run it.
pub fn simulate_definition(
    definition: &StrategyDefinition,
    window: &BarWindow,
    initial_capital: f64,
) -> Result<SimulationOutcome, SimulationError> {
    let rule = build_rule(definition)?;
    simulate(rule.as_ref(), window, initial_capital)
}

/// Replay `rule` over `window`.
///
/// Fails before the loop on an empty window, unusable capital, or any
/// non-positive close, so no partial outcome is ever produced.
pub fn simulate(
    rule: &dyn StrategyRule,
    window: &BarWindow,
    initial_capital: f64,
) -> Result<SimulationOutcome, SimulationError> {
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(SimulationError::InvalidCapital(initial_capital));
    }
    let bars = window.bars();
    let Some(last) = bars.last() else {
        return Err(SimulationError::EmptyWindow);
    };
    if let Some((index, bar)) = bars
        .iter()
        .enumerate()
        .find(|(_, b)| !b.has_tradable_close())
    {
        return Err(SimulationError::NonPositiveClose {
            index,
            date: bar.date,
            close: bar.close,
        });
    }

    let mut pm = PositionManager::new(window.symbol(), initial_capital);
    let mut equity = EquityTracker::with_capacity(initial_capital, bars.len());
    let mut signal_count = 0;

    for (i, bar) in bars.iter().enumerate() {
        let signal = rule.decide(bars, i, pm.state());
        if signal != Signal::Hold {
            signal_count += 1;
        }
        pm.apply(signal, bar, i)?;
        equity.record(bar.date, pm.equity(bar.close));
    }

    let max_drawdown = equity.max_drawdown();
    let (final_capital, ledger, open_position) = pm.finish(last);

    Ok(SimulationOutcome {
        symbol: window.symbol().to_string(),
        initial_capital,
        final_capital,
        trades: ledger.into_trades(),
        equity_curve: equity.into_points(),
        max_drawdown,
        open_position,
        bar_count: bars.len(),
        warmup_bars: rule.warmup_bars(),
        signal_count,
    })
}
