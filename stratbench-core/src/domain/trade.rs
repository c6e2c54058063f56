//! Trade ledger: append-only record of executed buys and sells.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Side of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

/// One executed trade.
///
/// `pnl` is only present on sells: proceeds minus the capital committed at
/// the paired buy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: f64,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
}

impl Trade {
    pub fn is_sell(&self) -> bool {
        self.action == TradeAction::Sell
    }

    /// Notional value of the trade at its execution price.
    pub fn notional(&self) -> f64 {
        self.quantity * self.price
    }
}

/// Append-only list of trades in execution order.
///
/// Entries are only added by the position manager, whose flat/long state
/// machine guarantees strict buy/sell alternation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn last(&self) -> Option<&Trade> {
        self.trades.last()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Closing trades, in order.
    pub fn sells(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_sell())
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }
}

/// True if `trades` is `buy, sell, buy, sell, ...` (possibly ending on a buy).
pub fn is_alternating(trades: &[Trade]) -> bool {
    trades.iter().enumerate().all(|(i, t)| {
        let expected = if i % 2 == 0 {
            TradeAction::Buy
        } else {
            TradeAction::Sell
        };
        t.action == expected
    })
}
