//! Backtest result persistence.
//!
//! `JsonlResultStore` appends one JSON record per line. The format tolerates
//! partial writes: malformed lines are skipped on read.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::result::BacktestRecord;

use super::StoreError;

pub trait ResultStore: Send + Sync {
    /// Persist a completed record.
    fn save(&self, record: &BacktestRecord) -> Result<(), StoreError>;

    /// Records for a strategy, newest first.
    fn list_for_strategy(&self, strategy_id: &str) -> Result<Vec<BacktestRecord>, StoreError>;
}

/// Append-only JSONL file of records.
pub struct JsonlResultStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every well-formed record in file order.
    pub fn read_all(&self) -> Result<Vec<BacktestRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&self.path).map_err(|e| self.io_error(e))?;
        let reader = io::BufReader::new(file);
        let mut records = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<BacktestRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = line_no + 1,
                        "skipping malformed result record: {e}"
                    );
                }
            }
        }
        Ok(records)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResultStore for JsonlResultStore {
    fn save(&self, record: &BacktestRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{json}").map_err(|e| self.io_error(e))?;
        file.flush().map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn list_for_strategy(&self, strategy_id: &str) -> Result<Vec<BacktestRecord>, StoreError> {
        let mut records: Vec<_> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.strategy_id == strategy_id)
            .collect();
        records.reverse();
        Ok(records)
    }
}

/// Records kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    records: Mutex<Vec<BacktestRecord>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records. A poisoned lock still holds valid records.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultStore for InMemoryResultStore {
    fn save(&self, record: &BacktestRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records.push(record.clone());
        Ok(())
    }

    fn list_for_strategy(&self, strategy_id: &str) -> Result<Vec<BacktestRecord>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.strategy_id == strategy_id)
            .cloned()
            .collect())
    }
}
