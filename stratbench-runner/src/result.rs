//! Backtest result and the persisted record around it.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use stratbench_core::domain::{BarWindow, EquityPoint, OpenPosition, Trade};
use stratbench_core::engine::SimulationOutcome;
use stratbench_core::strategy::{StrategyDefinition, StrategyKind};

use crate::metrics::PerformanceMetrics;

/// Current schema version for persisted records.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one simulation.
///
/// A pure function of strategy, bars, and capital: no timestamps or ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return: f64,
    pub total_return_percent: f64,
    pub sharpe_ratio: f64,
    /// Percent.
    pub max_drawdown: f64,
    /// Percent.
    pub win_rate: f64,
    pub total_trades: usize,
    pub profitable_trades: usize,
    pub losing_trades: usize,
    pub average_win: f64,
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    /// Position still held after the last bar, valued into `final_capital`
    /// but absent from `trades`.
    #[serde(default)]
    pub open_position: Option<OpenPosition>,
}

impl BacktestResult {
    pub fn from_outcome(outcome: SimulationOutcome) -> Self {
        let metrics = PerformanceMetrics::compute(
            &outcome.trades,
            &outcome.equity_curve,
            outcome.initial_capital,
            outcome.final_capital,
            outcome.max_drawdown,
        );
        let stats = metrics.trades;
        Self {
            initial_capital: outcome.initial_capital,
            final_capital: outcome.final_capital,
            total_return: metrics.total_return,
            total_return_percent: metrics.total_return_percent,
            sharpe_ratio: metrics.sharpe_ratio,
            max_drawdown: metrics.max_drawdown,
            win_rate: stats.win_rate,
            total_trades: stats.total_trades,
            profitable_trades: stats.wins,
            losing_trades: stats.losses,
            average_win: stats.average_win,
            average_loss: stats.average_loss,
            largest_win: stats.largest_win,
            largest_loss: stats.largest_loss,
            trades: outcome.trades,
            equity_curve: outcome.equity_curve,
            open_position: outcome.open_position,
        }
    }
}

/// A persisted backtest: request context plus the flattened result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub record_id: String,
    pub strategy_id: String,
    pub strategy_kind: StrategyKind,
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dataset_hash: String,
    pub bar_count: usize,
    pub created_at: NaiveDateTime,
    #[serde(flatten)]
    pub result: BacktestResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Deterministic BLAKE3 hash over the bars of a window.
pub fn dataset_hash(window: &BarWindow) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(window.symbol().as_bytes());
    for bar in window.bars() {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Content-addressed id of a run: same strategy, range, capital, and data
/// give the same id.
pub fn record_id(
    definition: &StrategyDefinition,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    initial_capital: f64,
    dataset_hash: &str,
) -> String {
    // serde_json with BTreeMap parameters gives a canonical key order.
    let canonical = serde_json::json!({
        "strategy_id": definition.id,
        "kind": definition.kind,
        "parameters": definition.parameters,
        "symbol": symbol,
        "start_date": start.to_string(),
        "end_date": end.to_string(),
        "initial_capital": initial_capital,
        "dataset_hash": dataset_hash,
    });
    blake3::hash(canonical.to_string().as_bytes())
        .to_hex()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratbench_core::domain::Bar;
    use stratbench_core::strategy::StrategyStatus;

    fn window(closes: &[f64]) -> BarWindow {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: start + chrono::Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1,
            })
            .collect();
        BarWindow::new("SPY", bars).unwrap()
    }

    fn definition(lookback: u64) -> StrategyDefinition {
        StrategyDefinition {
            id: "s".into(),
            name: "s".into(),
            description: None,
            kind: StrategyKind::Momentum,
            parameters: [("lookback".to_string(), serde_json::json!(lookback))]
                .into_iter()
                .collect(),
            status: StrategyStatus::Inactive,
        }
    }

    #[test]
    fn dataset_hash_tracks_content() {
        assert_eq!(dataset_hash(&window(&[1.0, 2.0])), dataset_hash(&window(&[1.0, 2.0])));
        assert_ne!(dataset_hash(&window(&[1.0, 2.0])), dataset_hash(&window(&[1.0, 2.5])));
    }

    #[test]
    fn record_id_changes_with_parameters() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let a = record_id(&definition(5), "SPY", d, d, 100.0, "h");
        let b = record_id(&definition(5), "SPY", d, d, 100.0, "h");
        let c = record_id(&definition(6), "SPY", d, d, 100.0, "h");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
