//! Stratbench CLI — run single or batch backtests and inspect stored results.
//!
//! Commands:
//! - `run`: backtest one strategy on one symbol and date range
//! - `batch`: run every `[[request]]` of a TOML file in parallel
//! - `results`: list stored records for a strategy, newest first

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use stratbench_runner::{
    save_artifacts, BacktestError, BacktestRecord, BacktestRequest, BacktestService, BatchFile,
    InMemoryStrategyStore, JsonlResultStore, RunnerConfig, DEFAULT_INITIAL_CAPITAL,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "stratbench",
    about = "Stratbench CLI — single-position strategy backtesting"
)]
struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one strategy on one symbol.
    Run {
        /// Path to the runner TOML config.
        #[arg(long, default_value = "runner.toml")]
        config: PathBuf,

        /// Strategy id from the strategies file.
        #[arg(long)]
        strategy: String,

        /// Symbol to backtest (e.g., SPY).
        #[arg(long)]
        symbol: String,

        /// Start date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        end: String,

        /// Initial capital.
        #[arg(long, default_value_t = DEFAULT_INITIAL_CAPITAL)]
        capital: f64,

        /// Print the full record as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run every request in a batch TOML file.
    Batch {
        /// Path to the runner TOML config.
        #[arg(long, default_value = "runner.toml")]
        config: PathBuf,

        /// Batch file with `[[request]]` tables.
        #[arg(long)]
        file: PathBuf,
    },
    /// List stored results for a strategy, newest first.
    Results {
        /// Path to the runner TOML config.
        #[arg(long, default_value = "runner.toml")]
        config: PathBuf,

        /// Strategy id.
        #[arg(long)]
        strategy: String,

        /// Print records as JSON lines.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Run {
            config,
            strategy,
            symbol,
            start,
            end,
            capital,
            json,
        } => {
            let request = BacktestRequest::new(
                strategy,
                symbol,
                parse_date("--start", &start)?,
                parse_date("--end", &end)?,
                capital,
            )?;
            run_cmd(&config, &request, json)
        }
        Commands::Batch { config, file } => batch_cmd(&config, &file),
        Commands::Results {
            config,
            strategy,
            json,
        } => results_cmd(&config, &strategy, json),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn parse_date(flag: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("{flag} must be YYYY-MM-DD, got '{value}'"))
}

/// Stores and data source assembled from a runner config.
struct Workspace {
    config: RunnerConfig,
    strategies: InMemoryStrategyStore,
    results: JsonlResultStore,
}

impl Workspace {
    fn open(config_path: &Path) -> Result<Self> {
        let config = if config_path.exists() {
            RunnerConfig::load(config_path)?
        } else {
            tracing::warn!(path = %config_path.display(), "config not found, using defaults");
            RunnerConfig::default()
        };
        let strategies = InMemoryStrategyStore::load(&config.store.strategies).with_context(|| {
            format!(
                "failed to load strategies from {}",
                config.store.strategies.display()
            )
        })?;
        let results = JsonlResultStore::new(&config.store.results);
        Ok(Self {
            config,
            strategies,
            results,
        })
    }

    fn export(&self, record: &BacktestRecord) -> Result<()> {
        if let Some(dir) = &self.config.export.dir {
            let run_dir = save_artifacts(record, dir)?;
            tracing::info!(dir = %run_dir.display(), "artifacts exported");
        }
        Ok(())
    }
}

fn run_cmd(config_path: &Path, request: &BacktestRequest, json: bool) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let bars = ws.config.bar_source();
    let service = BacktestService::new(&ws.strategies, bars.as_ref(), &ws.results);

    let record = service.run(request)?;
    ws.export(&record)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_summary(&record);
    }
    Ok(())
}

fn batch_cmd(config_path: &Path, file: &Path) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read batch file {}", file.display()))?;
    let batch = BatchFile::from_toml_str(&content)
        .with_context(|| format!("failed to parse batch file {}", file.display()))?;

    let mut requests = Vec::with_capacity(batch.request.len());
    let mut failures = 0usize;
    for (i, raw) in batch.request.into_iter().enumerate() {
        match raw.validate() {
            Ok(request) => requests.push(request),
            Err(e) => {
                failures += 1;
                eprintln!("request #{}: {e}", i + 1);
            }
        }
    }

    let bars = ws.config.bar_source();
    let service = BacktestService::new(&ws.strategies, bars.as_ref(), &ws.results);
    let outcomes = service.run_batch(&requests);

    failures += report_batch(&requests, outcomes, |record| ws.export(record));

    if failures > 0 {
        bail!("{failures} request(s) failed");
    }
    Ok(())
}

/// Print one row per outcome and export each record. Returns the number of
/// failed runs plus failed exports; an export failure does not stop the report.
fn report_batch(
    requests: &[BacktestRequest],
    outcomes: Vec<Result<BacktestRecord, BacktestError>>,
    export: impl Fn(&BacktestRecord) -> Result<()>,
) -> usize {
    let mut failures = 0usize;
    println!(
        "{:<20} {:<8} {:>12} {:>10} {:>8} {:>8}",
        "strategy", "symbol", "final", "return%", "trades", "sharpe"
    );
    for (request, outcome) in requests.iter().zip(outcomes) {
        match outcome {
            Ok(record) => {
                if let Err(e) = export(&record) {
                    failures += 1;
                    tracing::warn!(
                        strategy = %record.strategy_id,
                        record = %record.record_id,
                        "export failed: {e:#}"
                    );
                }
                let r = &record.result;
                println!(
                    "{:<20} {:<8} {:>12.2} {:>10.2} {:>8} {:>8.3}",
                    record.strategy_id,
                    record.symbol,
                    r.final_capital,
                    r.total_return_percent,
                    r.total_trades,
                    r.sharpe_ratio
                );
            }
            Err(e) => {
                failures += 1;
                eprintln!(
                    "{} on {}: {e} ({:?})",
                    request.strategy_id,
                    request.symbol,
                    e.kind()
                );
            }
        }
    }
    failures
}

fn results_cmd(config_path: &Path, strategy_id: &str, json: bool) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let bars = ws.config.bar_source();
    let service = BacktestService::new(&ws.strategies, bars.as_ref(), &ws.results);
    let records = service.history(strategy_id)?;

    if json {
        for record in &records {
            println!("{}", serde_json::to_string(record)?);
        }
        return Ok(());
    }

    if records.is_empty() {
        println!("No results for {strategy_id}");
        return Ok(());
    }
    println!(
        "{:<20} {:<8} {:<23} {:>12} {:>10} {:>8}",
        "created", "symbol", "range", "final", "return%", "trades"
    );
    for record in &records {
        println!(
            "{:<20} {:<8} {:<23} {:>12.2} {:>10.2} {:>8}",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.symbol,
            format!("{}..{}", record.start_date, record.end_date),
            record.result.final_capital,
            record.result.total_return_percent,
            record.result.total_trades
        );
    }
    Ok(())
}

fn print_summary(record: &BacktestRecord) {
    let r = &record.result;
    println!();
    println!("=== Backtest Result ===");
    println!("Strategy:       {} ({})", record.strategy_id, record.strategy_kind);
    println!("Symbol:         {}", record.symbol);
    println!("Period:         {} to {}", record.start_date, record.end_date);
    println!("Bars:           {}", record.bar_count);
    println!("Record:         {}", record.record_id);
    println!();
    println!("--- Performance ---");
    println!("Initial:        {:.2}", r.initial_capital);
    println!("Final:          {:.2}", r.final_capital);
    println!(
        "Total Return:   {:.2} ({:.2}%)",
        r.total_return, r.total_return_percent
    );
    println!("Sharpe:         {:.3}", r.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", r.max_drawdown);
    println!(
        "Trades:         {} ({} won, {} lost)",
        r.total_trades, r.profitable_trades, r.losing_trades
    );
    println!("Win Rate:       {:.1}%", r.win_rate);
    println!("Avg Win:        {:.2}", r.average_win);
    println!("Avg Loss:       {:.2}", r.average_loss);
    println!("Largest Win:    {:.2}", r.largest_win);
    println!("Largest Loss:   {:.2}", r.largest_loss);
    if let Some(open) = &r.open_position {
        println!();
        println!(
            "Open position:  {:.4} @ {:.2} since {}, marked {:.2} ({:+.2})",
            open.quantity, open.entry_price, open.entry_date, open.mark_price, open.unrealized_pnl
        );
    }
}
