//! Stratbench Core — simulation of a single-position strategy over daily bars.
//!
//! This crate contains the pure part of a backtest:
//! - Domain types (bars, bar windows, trades, ledger, position, equity curve)
//! - Strategy definitions and the `StrategyRule` trait with the momentum rule
//! - Position manager (flat/long state machine, all-in sizing)
//! - The bar loop producing trades, equity curve, and drawdown
//!
//! No I/O happens here; fetching bars and persisting results belong to
//! `stratbench-runner`.

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: core types can cross threads for parallel batch runs.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::BarWindow>();
        require_sync::<domain::BarWindow>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::EquityPoint>();
        require_sync::<domain::EquityPoint>();
        require_send::<domain::OpenPosition>();
        require_sync::<domain::OpenPosition>();

        require_send::<strategy::StrategyDefinition>();
        require_sync::<strategy::StrategyDefinition>();
        require_send::<strategy::MomentumRule>();
        require_sync::<strategy::MomentumRule>();
        require_send::<Box<dyn strategy::StrategyRule>>();
        require_sync::<Box<dyn strategy::StrategyRule>>();

        require_send::<engine::SimulationOutcome>();
        require_sync::<engine::SimulationOutcome>();
        require_send::<engine::SimulationError>();
        require_sync::<engine::SimulationError>();
    }

    /// Rules see bars and the position state only, never capital or the ledger.
    #[test]
    fn strategy_rule_has_no_capital_parameter() {
        fn _check_trait_object_builds(
            rule: &dyn strategy::StrategyRule,
            bars: &[domain::Bar],
        ) -> strategy::Signal {
            rule.decide(bars, 0, domain::PositionState::Flat)
        }
    }
}
