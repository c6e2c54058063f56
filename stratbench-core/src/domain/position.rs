//! Single-position state: flat or long.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a position is currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionState {
    Flat,
    Long,
}

/// The simulated position.
///
/// Invariant: `quantity > 0` iff `state == Long`. Fields are private so the
/// invariant can only change through `open`/`close`.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    state: PositionState,
    quantity: f64,
    entry_price: f64,
    entry_date: Option<NaiveDate>,
    committed_capital: f64,
}

impl Position {
    pub fn flat() -> Self {
        Self {
            state: PositionState::Flat,
            quantity: 0.0,
            entry_price: 0.0,
            entry_date: None,
            committed_capital: 0.0,
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn is_long(&self) -> bool {
        self.state == PositionState::Long
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn entry_date(&self) -> Option<NaiveDate> {
        self.entry_date
    }

    /// Capital spent at entry; the basis for realized P&L.
    pub fn committed_capital(&self) -> f64 {
        self.committed_capital
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub(crate) fn open(&mut self, quantity: f64, price: f64, date: NaiveDate, committed: f64) {
        debug_assert!(quantity > 0.0, "long position needs a positive quantity");
        self.state = PositionState::Long;
        self.quantity = quantity;
        self.entry_price = price;
        self.entry_date = Some(date);
        self.committed_capital = committed;
    }

    pub(crate) fn close(&mut self) {
        *self = Self::flat();
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::flat()
    }
}

/// A position still held after the last bar.
///
/// Reported beside the trade ledger instead of as a synthetic closing trade:
/// the result's final capital includes `market_value`, the ledger does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub quantity: f64,
    pub mark_date: NaiveDate,
    pub mark_price: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
}
