//! Domain types for the simulation.

pub mod bar;
pub mod equity;
pub mod position;
pub mod trade;

pub use bar::{Bar, BarError, BarWindow};
pub use equity::{EquityPoint, EquityTracker};
pub use position::{OpenPosition, Position, PositionState};
pub use trade::{is_alternating, Trade, TradeAction, TradeLedger};
