//! Equity curve with running peak and maximum drawdown.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Mark-to-market portfolio value at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Records one equity point per bar and tracks drawdown from the running peak.
///
/// The peak starts at the initial capital, so a loss on the very first bar
/// already counts as drawdown. `max_drawdown` is a non-negative percentage.
#[derive(Debug, Clone)]
pub struct EquityTracker {
    points: Vec<EquityPoint>,
    peak: f64,
    max_drawdown: f64,
}

impl EquityTracker {
    pub fn new(initial_capital: f64) -> Self {
        Self::with_capacity(initial_capital, 0)
    }

    pub fn with_capacity(initial_capital: f64, capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            peak: initial_capital,
            max_drawdown: 0.0,
        }
    }

    pub fn record(&mut self, date: NaiveDate, equity: f64) {
        self.points.push(EquityPoint { date, equity });
        if equity > self.peak {
            self.peak = equity;
        }
        // Zero peak: no meaningful drawdown.
        if self.peak > 0.0 {
            let dd = (self.peak - equity) / self.peak * 100.0;
            if dd > self.max_drawdown {
                self.max_drawdown = dd;
            }
        }
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    pub fn into_points(self) -> Vec<EquityPoint> {
        self.points
    }
}
