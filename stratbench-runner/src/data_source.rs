//! Bar sources for historical data.
//!
//! The orchestrator only sees the `BarSource` trait. Sources may return more
//! than the requested range or nothing at all; the orchestrator re-filters and
//! treats an empty window as unavailable data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use stratbench_core::domain::Bar;
use thiserror::Error;

/// Structured errors for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("data source unavailable: {0}")]
    Unavailable(String),

    #[error("cannot read bars from {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Source of daily bars for a symbol.
pub trait BarSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` between `start` and `end` inclusive.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError>;
}

// ─── CSV ─────────────────────────────────────────────────────────────

/// Reads `<dir>/<SYMBOL>.csv` with a `date,open,high,low,close,volume` header.
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    dir: PathBuf,
}

impl CsvBarSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

/// A symbol is ASCII letters, digits, `.`, `_`, or `-`, not starting with `.`
/// and never containing `..`. Anything else could leave the data directory.
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && !symbol.starts_with('.')
        && !symbol.contains("..")
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

impl BarSource for CsvBarSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError> {
        if !self.dir.is_dir() {
            return Err(DataError::Unavailable(format!(
                "data directory {} does not exist",
                self.dir.display()
            )));
        }
        if !is_valid_symbol(symbol) {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let mut bars = read_csv_bars(&path)?;
        bars.retain(|b| b.date >= start && b.date <= end);
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

/// Parse a bar CSV file.
pub fn read_csv_bars(path: &Path) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| csv_error(path, source))?;
    reader
        .deserialize::<Bar>()
        .map(|row| row.map_err(|source| csv_error(path, source)))
        .collect()
}

fn csv_error(path: &Path, source: csv::Error) -> DataError {
    DataError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

// ─── Synthetic ───────────────────────────────────────────────────────

/// Deterministic random-walk bars, for demos and offline development.
///
/// Seeded from the BLAKE3 hash of the symbol, so the same symbol and range
/// always yield the same bars. Weekends are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticBarSource;

impl BarSource for SyntheticBarSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError> {
        Ok(generate_synthetic_bars(symbol, start, end))
    }
}

/// Produces a random walk from a starting price of 100.0.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

// ─── In-memory ───────────────────────────────────────────────────────

/// Bars held in memory, keyed by symbol. Returned unfiltered so callers
/// exercise their own range handling.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBarSource {
    bars: HashMap<String, Vec<Bar>>,
}

impl InMemoryBarSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.bars.insert(symbol.into(), bars);
        self
    }
}

impl BarSource for InMemoryBarSource {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn fetch(&self, symbol: &str, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<Bar>, DataError> {
        self.bars
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}
