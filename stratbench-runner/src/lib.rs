//! Stratbench Runner — backtest orchestration around `stratbench-core`.
//!
//! This crate provides:
//! - Bar sources (CSV directory, deterministic synthetic, in-memory)
//! - Strategy and result stores (TOML-loaded strategies, JSONL results)
//! - Performance metrics (win/loss statistics, Sharpe ratio, drawdown)
//! - The backtest service with strategy status discipline and batch runs
//! - Runner configuration and CSV/JSON export

pub mod config;
pub mod data_source;
pub mod error;
pub mod export;
pub mod metrics;
pub mod request;
pub mod result;
pub mod runner;
pub mod service;
pub mod store;

pub use config::{ConfigError, DataSourceKind, RunnerConfig};
pub use data_source::{
    is_valid_symbol, BarSource, CsvBarSource, DataError, InMemoryBarSource, SyntheticBarSource,
};
pub use error::{BacktestError, ErrorKind};
pub use export::{export_equity_csv, export_trades_csv, generate_report, save_artifacts};
pub use metrics::{PerformanceMetrics, TradeStats};
pub use request::{BacktestRequest, BatchFile, RawBacktestRequest, DEFAULT_INITIAL_CAPITAL};
pub use result::{BacktestRecord, BacktestResult, SCHEMA_VERSION};
pub use runner::{run_backtest_on_bars, run_backtest_on_window};
pub use service::BacktestService;
pub use store::{
    InMemoryResultStore, InMemoryStrategyStore, JsonlResultStore, ResultStore, StoreError,
    StrategyFile, StrategyStore,
};
