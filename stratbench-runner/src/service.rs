//! Backtest orchestrator. Wires the strategy store, bar source, simulation,
//! and result store into one run.
//!
//! Order of a run:
//! 1. Look up the strategy and build its rule (fails before any state change)
//! 2. Move status `inactive → backtesting` (compare-and-set; busy otherwise)
//! 3. Fetch bars, filter to the requested range
//! 4. Simulate and assemble the result
//! 5. Persist the record
//!
//! A `StatusGuard` restores `inactive` on every exit path after step 2.

use rayon::prelude::*;
use stratbench_core::engine::simulate;
use stratbench_core::strategy::{build_rule, StrategyDefinition, StrategyStatus};

use crate::data_source::BarSource;
use crate::error::BacktestError;
use crate::request::BacktestRequest;
use crate::result::{dataset_hash, record_id, BacktestRecord, BacktestResult, SCHEMA_VERSION};
use crate::runner::{classify_simulation_error, filter_window};
use crate::store::{ResultStore, StoreError, StrategyStore};

/// Runs backtests against external collaborators.
pub struct BacktestService<'a> {
    strategies: &'a dyn StrategyStore,
    bars: &'a dyn BarSource,
    results: &'a dyn ResultStore,
}

impl<'a> BacktestService<'a> {
    pub fn new(
        strategies: &'a dyn StrategyStore,
        bars: &'a dyn BarSource,
        results: &'a dyn ResultStore,
    ) -> Self {
        Self {
            strategies,
            bars,
            results,
        }
    }

    /// Run one backtest and persist its record.
    pub fn run(&self, request: &BacktestRequest) -> Result<BacktestRecord, BacktestError> {
        let definition = self.load_strategy(&request.strategy_id)?;
        let rule = build_rule(&definition).map_err(|source| BacktestError::InvalidStrategy {
            id: definition.id.clone(),
            source,
        })?;

        let _guard = StatusGuard::acquire(self.strategies, &definition.id)?;
        tracing::info!(
            strategy = %definition.id,
            kind = %definition.kind,
            symbol = %request.symbol,
            start = %request.start_date,
            end = %request.end_date,
            "backtest started"
        );

        let raw = self
            .bars
            .fetch(&request.symbol, request.start_date, request.end_date)?;
        let window = filter_window(&request.symbol, raw, request.start_date, request.end_date)?;
        let hash = dataset_hash(&window);
        tracing::debug!(
            source = self.bars.name(),
            bars = window.len(),
            dataset_hash = %hash,
            "bars loaded"
        );

        let outcome = simulate(rule.as_ref(), &window, request.initial_capital)
            .map_err(|e| classify_simulation_error(&definition.id, e))?;
        let bar_count = outcome.bar_count;
        let result = BacktestResult::from_outcome(outcome);

        let record = BacktestRecord {
            schema_version: SCHEMA_VERSION,
            record_id: record_id(
                &definition,
                &request.symbol,
                request.start_date,
                request.end_date,
                request.initial_capital,
                &hash,
            ),
            strategy_id: definition.id.clone(),
            strategy_kind: definition.kind,
            symbol: request.symbol.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            dataset_hash: hash,
            bar_count,
            created_at: chrono::Utc::now().naive_utc(),
            result,
        };
        self.results.save(&record)?;

        tracing::info!(
            strategy = %record.strategy_id,
            record = %record.record_id,
            bars = bar_count,
            trades = record.result.total_trades,
            final_capital = record.result.final_capital,
            "backtest completed"
        );
        Ok(record)
    }

    /// Run many requests in parallel.
    ///
    /// Requests for different strategies are independent. Two requests for the
    /// same strategy race on its status; the loser fails with `StrategyBusy`.
    pub fn run_batch(
        &self,
        requests: &[BacktestRequest],
    ) -> Vec<Result<BacktestRecord, BacktestError>> {
        requests.par_iter().map(|r| self.run(r)).collect()
    }

    /// Persisted records for a strategy, newest first.
    pub fn history(&self, strategy_id: &str) -> Result<Vec<BacktestRecord>, BacktestError> {
        self.load_strategy(strategy_id)?;
        Ok(self.results.list_for_strategy(strategy_id)?)
    }

    fn load_strategy(&self, id: &str) -> Result<StrategyDefinition, BacktestError> {
        self.strategies
            .get(id)?
            .ok_or_else(|| BacktestError::StrategyNotFound(id.to_string()))
    }
}

/// Holds a strategy in `backtesting` and puts it back to `inactive` on drop.
struct StatusGuard<'a> {
    store: &'a dyn StrategyStore,
    id: String,
}

impl<'a> StatusGuard<'a> {
    fn acquire(store: &'a dyn StrategyStore, id: &str) -> Result<Self, BacktestError> {
        match store.transition_status(id, StrategyStatus::Inactive, StrategyStatus::Backtesting) {
            Ok(()) => Ok(Self {
                store,
                id: id.to_string(),
            }),
            Err(StoreError::StatusConflict { actual, .. }) => Err(BacktestError::StrategyBusy {
                id: id.to_string(),
                status: actual,
            }),
            Err(StoreError::NotFound(id)) => Err(BacktestError::StrategyNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StatusGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.store.transition_status(
            &self.id,
            StrategyStatus::Backtesting,
            StrategyStatus::Inactive,
        ) {
            tracing::warn!(strategy = %self.id, "failed to restore strategy status: {e}");
        }
    }
}
