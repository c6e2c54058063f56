//! Export of backtest records as JSON, CSV, or a Markdown summary.
//!
//! CSV exports carry the trade tape and the equity curve for external tools.
//! JSON import rejects schema versions newer than this build understands.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use stratbench_core::domain::{EquityPoint, Trade, TradeAction};

use crate::result::{BacktestRecord, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a record to pretty JSON.
pub fn export_json(record: &BacktestRecord) -> Result<String> {
    serde_json::to_string_pretty(record).context("failed to serialize BacktestRecord to JSON")
}

/// Deserialize a record from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestRecord> {
    let record: BacktestRecord =
        serde_json::from_str(json).context("failed to deserialize BacktestRecord from JSON")?;
    if record.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            record.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(record)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade tape as CSV.
///
/// Columns: date, symbol, action, quantity, price, pnl. `pnl` is empty on buys.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "symbol", "action", "quantity", "price", "pnl"])?;

    for t in trades {
        let action = match t.action {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
        };
        let pnl = t.pnl.map(|p| format!("{p:.2}")).unwrap_or_default();
        wtr.write_record([
            &t.date.to_string(),
            &t.symbol,
            action,
            &format!("{:.6}", t.quantity),
            &format!("{:.6}", t.price),
            &pnl,
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export an equity curve as CSV with date and equity columns.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity"])?;
    for point in equity_curve {
        wtr.write_record([&point.date.to_string(), &format!("{:.2}", point.equity)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `record.json`, `trades.csv`, and `equity.csv` for one record.
///
/// The directory is `{output_dir}/{strategy_id}/{record_id prefix}`, so
/// re-exporting the same run overwrites in place.
pub fn save_artifacts(record: &BacktestRecord, output_dir: &Path) -> Result<PathBuf> {
    let short_id = record.record_id.get(..12).unwrap_or(&record.record_id);
    let run_dir = output_dir.join(&record.strategy_id).join(short_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("record.json"), export_json(record)?)?;
    std::fs::write(
        run_dir.join("trades.csv"),
        export_trades_csv(&record.result.trades)?,
    )?;
    std::fs::write(
        run_dir.join("equity.csv"),
        export_equity_csv(&record.result.equity_curve)?,
    )?;

    Ok(run_dir)
}

/// Load a record from an artifact directory's `record.json`.
pub fn load_artifacts(dir: &Path) -> Result<BacktestRecord> {
    let path = dir.join("record.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown summary ───────────────────────────────────────────────

/// Human-readable summary of one run.
pub fn generate_report(record: &BacktestRecord) -> String {
    let r = &record.result;
    let mut md = String::new();
    md.push_str(&format!(
        "# {} on {} ({} to {})\n\n",
        record.strategy_id, record.symbol, record.start_date, record.end_date
    ));
    md.push_str(&format!("Strategy kind: {}\n", record.strategy_kind));
    md.push_str(&format!("Bars: {}\n", record.bar_count));
    md.push_str(&format!("Record: {}\n\n", record.record_id));

    md.push_str("| Metric | Value |\n|---|---|\n");
    md.push_str(&format!("| Initial capital | {:.2} |\n", r.initial_capital));
    md.push_str(&format!("| Final capital | {:.2} |\n", r.final_capital));
    md.push_str(&format!(
        "| Total return | {:.2} ({:.2}%) |\n",
        r.total_return, r.total_return_percent
    ));
    md.push_str(&format!("| Sharpe ratio | {:.3} |\n", r.sharpe_ratio));
    md.push_str(&format!("| Max drawdown | {:.2}% |\n", r.max_drawdown));
    md.push_str(&format!(
        "| Trades (closed) | {} ({} won, {} lost) |\n",
        r.total_trades, r.profitable_trades, r.losing_trades
    ));
    md.push_str(&format!("| Win rate | {:.2}% |\n", r.win_rate));
    md.push_str(&format!(
        "| Avg win / avg loss | {:.2} / {:.2} |\n",
        r.average_win, r.average_loss
    ));
    md.push_str(&format!(
        "| Largest win / largest loss | {:.2} / {:.2} |\n",
        r.largest_win, r.largest_loss
    ));

    if let Some(open) = &r.open_position {
        md.push_str(&format!(
            "\nOpen at end: {:.4} shares since {} at {:.2}, marked {:.2} on {} (unrealized {:.2})\n",
            open.quantity,
            open.entry_date,
            open.entry_price,
            open.mark_price,
            open.mark_date,
            open.unrealized_pnl
        ));
    }
    md
}
