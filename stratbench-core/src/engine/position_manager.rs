//! Position manager: a flat/long state machine with all-in sizing.
//!
//! `Enter` while flat buys `capital / close` units and commits all capital.
//! `Exit` while long sells everything, realizes `proceeds - committed`, and
//! returns the proceeds to capital. Every other (state, signal) pair is a no-op,
//! so the ledger alternates buy/sell by construction.

use crate::domain::{Bar, OpenPosition, Position, PositionState, Trade, TradeAction, TradeLedger};
use crate::strategy::Signal;

use super::SimulationError;

#[derive(Debug, Clone)]
pub struct PositionManager {
    symbol: String,
    capital: f64,
    position: Position,
    ledger: TradeLedger,
}

impl PositionManager {
    pub fn new(symbol: impl Into<String>, initial_capital: f64) -> Self {
        Self {
            symbol: symbol.into(),
            capital: initial_capital,
            position: Position::flat(),
            ledger: TradeLedger::new(),
        }
    }

    pub fn state(&self) -> PositionState {
        self.position.state()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Cash not embodied in the position.
    pub fn available_capital(&self) -> f64 {
        self.capital
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    /// Apply a signal at `index`. Returns the trade it produced, if any.
    pub fn apply(
        &mut self,
        signal: Signal,
        bar: &Bar,
        index: usize,
    ) -> Result<Option<&Trade>, SimulationError> {
        match (self.position.state(), signal) {
            (PositionState::Flat, Signal::Enter) => self.enter(bar, index).map(Some),
            (PositionState::Long, Signal::Exit) => self.exit(bar, index).map(Some),
            _ => Ok(None),
        }
    }

    fn enter(&mut self, bar: &Bar, index: usize) -> Result<&Trade, SimulationError> {
        check_close(bar, index)?;
        let quantity = self.capital / bar.close;
        if !(quantity > 0.0 && quantity.is_finite()) {
            return Err(SimulationError::InvalidSizing {
                index,
                capital: self.capital,
                close: bar.close,
            });
        }

        self.position.open(quantity, bar.close, bar.date, self.capital);
        self.capital = 0.0;
        self.ledger.append(Trade {
            date: bar.date,
            symbol: self.symbol.clone(),
            action: TradeAction::Buy,
            quantity,
            price: bar.close,
            pnl: None,
        });
        Ok(self.last_trade())
    }

    fn exit(&mut self, bar: &Bar, index: usize) -> Result<&Trade, SimulationError> {
        check_close(bar, index)?;
        let quantity = self.position.quantity();
        let proceeds = quantity * bar.close;
        let pnl = proceeds - self.position.committed_capital();

        self.capital = proceeds;
        self.position.close();
        self.ledger.append(Trade {
            date: bar.date,
            symbol: self.symbol.clone(),
            action: TradeAction::Sell,
            quantity,
            price: bar.close,
            pnl: Some(pnl),
        });
        Ok(self.last_trade())
    }

    fn last_trade(&self) -> &Trade {
        // Only called right after an append.
        &self.ledger.trades()[self.ledger.len() - 1]
    }

    /// Mark-to-market equity at `close`: position value when long, cash otherwise.
    pub fn equity(&self, close: f64) -> f64 {
        if self.position.is_long() {
            self.position.market_value(close)
        } else {
            self.capital
        }
    }

    /// Value the book at the final bar without trading.
    ///
    /// Returns final capital and, if still long, the open position marked at
    /// `last.close`. No closing trade is added to the ledger.
    pub fn finish(self, last: &Bar) -> (f64, TradeLedger, Option<OpenPosition>) {
        if !self.position.is_long() {
            return (self.capital, self.ledger, None);
        }
        let market_value = self.position.market_value(last.close);
        let open = OpenPosition {
            symbol: self.symbol,
            // Long implies an entry date.
            entry_date: self.position.entry_date().unwrap_or(last.date),
            entry_price: self.position.entry_price(),
            quantity: self.position.quantity(),
            mark_date: last.date,
            mark_price: last.close,
            market_value,
            unrealized_pnl: market_value - self.position.committed_capital(),
        };
        (market_value, self.ledger, Some(open))
    }
}

fn check_close(bar: &Bar, index: usize) -> Result<(), SimulationError> {
    if bar.has_tradable_close() {
        Ok(())
    } else {
        Err(SimulationError::NonPositiveClose {
            index,
            date: bar.date,
            close: bar.close,
        })
    }
}
