//! Performance metrics as pure functions over the trade ledger and equity curve.
//!
//! Win/loss classification uses closing (sell) trades only:
//! `pnl > 0` is a win, `pnl < 0` a loss, and `pnl == 0` is neither but still
//! counts toward `total_trades`.

use serde::{Deserialize, Serialize};
use stratbench_core::domain::{EquityPoint, Trade};
use stratbench_core::indicators::mean;

/// Trading days per year used to annualize the Sharpe ratio.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Summary statistics of the closed round trips in a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percent of closed trades that were wins.
    pub win_rate: f64,
    pub average_win: f64,
    /// Mean absolute loss (non-negative).
    pub average_loss: f64,
    /// Largest winning P&L, 0 when there are no wins.
    pub largest_win: f64,
    /// Most negative losing P&L, 0 when there are no losses.
    pub largest_loss: f64,
}

impl TradeStats {
    pub fn from_trades(trades: &[Trade]) -> Self {
        let mut stats = Self::default();
        let mut win_sum = 0.0;
        let mut loss_sum = 0.0;

        for pnl in trades.iter().filter(|t| t.is_sell()).filter_map(|t| t.pnl) {
            stats.total_trades += 1;
            if pnl > 0.0 {
                stats.wins += 1;
                win_sum += pnl;
                stats.largest_win = stats.largest_win.max(pnl);
            } else if pnl < 0.0 {
                stats.losses += 1;
                loss_sum += pnl.abs();
                stats.largest_loss = stats.largest_loss.min(pnl);
            }
        }

        if stats.total_trades > 0 {
            stats.win_rate = stats.wins as f64 / stats.total_trades as f64 * 100.0;
        }
        if stats.wins > 0 {
            stats.average_win = win_sum / stats.wins as f64;
        }
        if stats.losses > 0 {
            stats.average_loss = loss_sum / stats.losses as f64;
        }
        stats
    }
}

/// Aggregate performance of one backtest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub total_return_percent: f64,
    pub sharpe_ratio: f64,
    /// Percent decline from the running peak, non-negative.
    pub max_drawdown: f64,
    pub trades: TradeStats,
}

impl PerformanceMetrics {
    /// Compute everything except drawdown, which the equity tracker already
    /// measured against the initial-capital peak.
    pub fn compute(
        trades: &[Trade],
        equity_curve: &[EquityPoint],
        initial_capital: f64,
        final_capital: f64,
        max_drawdown: f64,
    ) -> Self {
        let equity: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let total_return = final_capital - initial_capital;
        Self {
            total_return,
            total_return_percent: total_return_percent(initial_capital, final_capital),
            sharpe_ratio: sharpe_ratio(&per_bar_returns(&equity)),
            max_drawdown,
            trades: TradeStats::from_trades(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return in percent of initial capital. 0 for non-positive capital.
pub fn total_return_percent(initial_capital: f64, final_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    (final_capital - initial_capital) / initial_capital * 100.0
}

/// Simple returns between consecutive equity values.
///
/// A return whose previous equity is zero counts as 0.
pub fn per_bar_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Annualized Sharpe ratio: mean / population std * sqrt(252), no risk-free rate.
///
/// Returns 0.0 for an empty series or zero variance.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(returns);
    let std = population_std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * TRADING_DAYS_PER_YEAR.sqrt()
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    mean(values.iter().copied()).unwrap_or(0.0)
}

pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stratbench_core::domain::TradeAction;

    fn sell(pnl: f64) -> Trade {
        Trade {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            symbol: "SPY".into(),
            action: TradeAction::Sell,
            quantity: 10.0,
            price: 100.0,
            pnl: Some(pnl),
        }
    }

    fn buy() -> Trade {
        Trade {
            action: TradeAction::Buy,
            pnl: None,
            ..sell(0.0)
        }
    }

    // ── Trade stats ──

    #[test]
    fn stats_empty_ledger_is_zero() {
        assert_eq!(TradeStats::from_trades(&[]), TradeStats::default());
        assert_eq!(TradeStats::from_trades(&[buy()]).total_trades, 0);
    }

    #[test]
    fn stats_mixed_trades() {
        let trades = vec![
            buy(),
            sell(100.0),
            buy(),
            sell(-40.0),
            buy(),
            sell(300.0),
            buy(),
            sell(-10.0),
        ];
        let s = TradeStats::from_trades(&trades);
        assert_eq!(s.total_trades, 4);
        assert_eq!(s.wins, 2);
        assert_eq!(s.losses, 2);
        assert!((s.win_rate - 50.0).abs() < 1e-12);
        assert!((s.average_win - 200.0).abs() < 1e-12);
        assert!((s.average_loss - 25.0).abs() < 1e-12);
        assert_eq!(s.largest_win, 300.0);
        assert_eq!(s.largest_loss, -40.0);
    }

    #[test]
    fn zero_pnl_counts_as_trade_but_not_win_or_loss() {
        let s = TradeStats::from_trades(&[buy(), sell(0.0), buy(), sell(50.0)]);
        assert_eq!(s.total_trades, 2);
        assert_eq!(s.wins, 1);
        assert_eq!(s.losses, 0);
        assert!((s.win_rate - 50.0).abs() < 1e-12);
        assert_eq!(s.average_loss, 0.0);
        assert_eq!(s.largest_loss, 0.0);
    }

    #[test]
    fn only_losses_leaves_win_fields_zero() {
        let s = TradeStats::from_trades(&[buy(), sell(-5.0)]);
        assert_eq!(s.win_rate, 0.0);
        assert_eq!(s.average_win, 0.0);
        assert_eq!(s.largest_win, 0.0);
        assert_eq!(s.largest_loss, -5.0);
    }

    // ── Returns ──

    #[test]
    fn per_bar_returns_basic() {
        let r = per_bar_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn per_bar_returns_guards_zero_equity() {
        assert_eq!(per_bar_returns(&[0.0, 10.0]), vec![0.0]);
        assert!(per_bar_returns(&[5.0]).is_empty());
    }

    #[test]
    fn total_return_percent_guards_zero_capital() {
        assert_eq!(total_return_percent(0.0, 10.0), 0.0);
        assert!((total_return_percent(200.0, 250.0) - 25.0).abs() < 1e-12);
    }

    // ── Sharpe ──

    #[test]
    fn sharpe_constant_equity_is_zero() {
        let eq = vec![100_000.0; 100];
        assert_eq!(sharpe_ratio(&per_bar_returns(&eq)), 0.0);
    }

    #[test]
    fn sharpe_empty_is_zero() {
        assert_eq!(sharpe_ratio(&[]), 0.0);
    }

    #[test]
    fn sharpe_known_returns_uses_population_std() {
        // mean 0.01, population std 0.01 → sqrt(252)
        let s = sharpe_ratio(&[0.0, 0.02]);
        assert!((s - 252.0_f64.sqrt()).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn sharpe_negative_for_losing_curve() {
        let mut eq = vec![100_000.0];
        for i in 1..100 {
            let r = if i % 2 == 0 { 0.995 } else { 0.999 };
            eq.push(eq[i - 1] * r);
        }
        assert!(sharpe_ratio(&per_bar_returns(&eq)) < 0.0);
    }

    #[test]
    fn compute_passes_drawdown_through() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let curve = vec![
            EquityPoint { date: d, equity: 100.0 },
            EquityPoint { date: d.succ_opt().unwrap(), equity: 110.0 },
        ];
        let m = PerformanceMetrics::compute(&[], &curve, 100.0, 110.0, 3.5);
        assert_eq!(m.max_drawdown, 3.5);
        assert!((m.total_return - 10.0).abs() < 1e-12);
        assert!((m.total_return_percent - 10.0).abs() < 1e-12);
        assert_eq!(m.sharpe_ratio, 0.0); // single return → zero variance
    }
}
