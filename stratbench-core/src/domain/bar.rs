//! Bars and bar windows, the market data the simulation replays.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV bar.
///
/// Only `close` drives the momentum rule; the other fields are carried so
/// that future rules and exports see the full bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// A close that can be used for sizing: finite and strictly positive.
    pub fn has_tradable_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Structural problems with a bar sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {index} dated {date} does not follow {previous} (dates must be strictly ascending)")]
    OutOfOrder {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },
}

/// Time-ascending bars for one symbol, already restricted to the requested range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarWindow {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarWindow {
    /// Build a window, checking that dates are strictly ascending.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarError> {
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(BarError::OutOfOrder {
                    index: index + 1,
                    date: pair[1].date,
                    previous: pair[0].date,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Keep only bars with `start <= date <= end`, then validate ordering.
    pub fn from_range(
        symbol: impl Into<String>,
        bars: Vec<Bar>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, BarError> {
        let filtered = bars
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        Self::new(symbol, filtered)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn bar(d: u32, close: f64) -> Bar {
        Bar {
            date: day(d),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn detects_void_bar() {
        let mut b = bar(2, 100.0);
        assert!(!b.is_void());
        b.close = f64::NAN;
        assert!(b.is_void());
        assert!(!b.has_tradable_close());
    }

    #[test]
    fn zero_close_is_not_tradable() {
        assert!(!bar(2, 0.0).has_tradable_close());
        assert!(!bar(2, -3.0).has_tradable_close());
        assert!(bar(2, 0.01).has_tradable_close());
    }

    #[test]
    fn window_rejects_duplicate_dates() {
        let err = BarWindow::new("SPY", vec![bar(2, 1.0), bar(2, 2.0)]).unwrap_err();
        assert_eq!(
            err,
            BarError::OutOfOrder {
                index: 1,
                date: day(2),
                previous: day(2)
            }
        );
    }

    #[test]
    fn window_rejects_descending_dates() {
        assert!(BarWindow::new("SPY", vec![bar(5, 1.0), bar(3, 2.0)]).is_err());
    }

    #[test]
    fn from_range_is_inclusive_on_both_ends() {
        let bars = (2..=10).map(|d| bar(d, d as f64)).collect();
        let window = BarWindow::from_range("SPY", bars, day(4), day(7)).unwrap();
        assert_eq!(window.len(), 4);
        assert_eq!(window.first_date(), Some(day(4)));
        assert_eq!(window.last_date(), Some(day(7)));
        assert_eq!(window.symbol(), "SPY");
    }

    #[test]
    fn from_range_outside_data_is_empty() {
        let bars = (2..=5).map(|d| bar(d, 1.0)).collect();
        let window = BarWindow::from_range("SPY", bars, day(20), day(25)).unwrap();
        assert!(window.is_empty());
        assert_eq!(window.first_date(), None);
    }
}
