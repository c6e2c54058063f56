//! End-to-end simulation scenarios against the momentum rule.

use chrono::NaiveDate;
use serde_json::json;
use stratbench_core::domain::{is_alternating, Bar, BarWindow, TradeAction};
use stratbench_core::engine::{simulate, simulate_definition, SimulationError};
use stratbench_core::strategy::{
    MomentumParams, MomentumRule, StrategyDefinition, StrategyError, StrategyKind, StrategyStatus,
};

fn window(closes: &[f64]) -> BarWindow {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar {
            date: start + chrono::Duration::days(i as i64),
            open: c,
            high: c * 1.01,
            low: c * 0.99,
            close: c,
            volume: 1_000_000,
        })
        .collect();
    BarWindow::new("SPY", bars).unwrap()
}

fn momentum(lookback: usize) -> MomentumRule {
    MomentumRule::new(MomentumParams { lookback })
}

fn definition(kind: StrategyKind, parameters: serde_json::Value) -> StrategyDefinition {
    StrategyDefinition {
        id: "strat-1".into(),
        name: "trend".into(),
        description: None,
        kind,
        parameters: serde_json::from_value(parameters).unwrap(),
        status: StrategyStatus::Inactive,
    }
}

#[test]
fn linear_uptrend_buys_once_after_warmup() {
    let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
    let out = simulate(&momentum(20), &window(&closes), 10_000.0).unwrap();

    assert_eq!(out.trades.len(), 1);
    let buy = &out.trades[0];
    assert_eq!(buy.action, TradeAction::Buy);
    assert_eq!(buy.price, 120.0);
    assert_eq!(buy.date, NaiveDate::from_ymd_opt(2023, 1, 22).unwrap());

    let expected = 10_000.0 / 120.0 * 124.0;
    assert!((out.final_capital - expected).abs() < 1e-9);
    assert!(out.final_capital > 10_000.0);
    assert!(out.max_drawdown >= 0.0 && out.max_drawdown < 1.0);
    assert!(out.open_position.is_some());
}

#[test]
fn lookback_at_least_window_length_never_trades() {
    let closes: Vec<f64> = (0..10).map(|i| 50.0 + (i as f64).sin()).collect();
    for lookback in [10, 11, 50] {
        let out = simulate(&momentum(lookback), &window(&closes), 5_000.0).unwrap();
        assert!(out.trades.is_empty());
        assert_eq!(out.final_capital, 5_000.0);
        assert!(out.equity_curve.iter().all(|p| p.equity == 5_000.0));
        assert_eq!(out.max_drawdown, 0.0);
    }
}

#[test]
fn rising_series_with_lookback_one_enters_on_bar_one() {
    let closes: Vec<f64> = (0..12).map(|i| 10.0 * 1.05_f64.powi(i)).collect();
    let out = simulate(&momentum(1), &window(&closes), 1_000.0).unwrap();

    assert_eq!(out.trades.len(), 1);
    assert_eq!(out.trades[0].action, TradeAction::Buy);
    assert_eq!(out.trades[0].price, closes[1]);
    // Valued at the last close, not traded.
    let expected = 1_000.0 / closes[1] * closes[11];
    assert!((out.final_capital - expected).abs() < 1e-9);
}

#[test]
fn rising_series_exits_when_it_turns_down() {
    let closes = [10.0, 11.0, 12.0, 13.0, 12.5, 12.0];
    let out = simulate(&momentum(1), &window(&closes), 1_000.0).unwrap();
    let actions: Vec<_> = out.trades.iter().map(|t| t.action).collect();
    assert_eq!(actions, vec![TradeAction::Buy, TradeAction::Sell]);
    assert_eq!(out.trades[1].price, 12.5);
    assert!(out.open_position.is_none());
}

#[test]
fn flat_prices_hold_throughout() {
    let out = simulate(&momentum(5), &window(&[50.0; 10]), 10_000.0).unwrap();
    assert!(out.trades.is_empty());
    assert_eq!(out.signal_count, 0);
    assert_eq!(out.final_capital, 10_000.0);
}

#[test]
fn crash_after_rally_closes_at_a_loss() {
    let closes = [100.0, 100.0, 100.0, 110.0, 115.0, 120.0, 80.0, 75.0];
    let out = simulate(&momentum(3), &window(&closes), 10_000.0).unwrap();

    assert_eq!(out.trades.len(), 2);
    assert!(is_alternating(&out.trades));
    let sell = &out.trades[1];
    assert_eq!(sell.action, TradeAction::Sell);
    assert_eq!(sell.price, 80.0);
    let pnl = sell.pnl.unwrap();
    assert!(pnl < 0.0);
    assert!((out.final_capital - (10_000.0 + pnl)).abs() < 1e-9);
    assert!(out.max_drawdown > 0.0);
}

#[test]
fn definition_path_matches_direct_rule() {
    let closes: Vec<f64> = (0..40).map(|i| 100.0 + 5.0 * (i as f64 / 3.0).sin()).collect();
    let w = window(&closes);
    let via_def = simulate_definition(
        &definition(StrategyKind::Momentum, json!({"lookback": 4})),
        &w,
        2_500.0,
    )
    .unwrap();
    let direct = simulate(&momentum(4), &w, 2_500.0).unwrap();
    assert_eq!(via_def, direct);
}

#[test]
fn missing_lookback_defaults_to_twenty() {
    let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
    let out = simulate_definition(
        &definition(StrategyKind::Momentum, json!({})),
        &window(&closes),
        10_000.0,
    )
    .unwrap();
    assert_eq!(out.warmup_bars, 20);
    assert_eq!(out.trades[0].price, 120.0);
}

#[test]
fn unsupported_kind_is_an_error_not_a_noop() {
    let err = simulate_definition(
        &definition(StrategyKind::Breakout, json!({})),
        &window(&[1.0, 2.0, 3.0]),
        100.0,
    )
    .unwrap_err();
    assert_eq!(
        err,
        SimulationError::Strategy(StrategyError::UnsupportedKind(StrategyKind::Breakout))
    );
}

#[test]
fn zero_capital_is_rejected() {
    let err = simulate(&momentum(2), &window(&[1.0, 2.0, 3.0]), 0.0).unwrap_err();
    assert_eq!(err, SimulationError::InvalidCapital(0.0));
}
