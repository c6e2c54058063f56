//! Momentum rule: close versus the trailing simple moving average.
//!
//! Enter when flat and the close is strictly above the SMA of the previous
//! `lookback` closes; exit when long and the close is strictly below it.
//! Equality holds.

use crate::domain::{Bar, PositionState};
use crate::indicators::trailing_sma;

use super::{MomentumParams, Signal, StrategyKind, StrategyRule};

#[derive(Debug, Clone)]
pub struct MomentumRule {
    params: MomentumParams,
}

impl MomentumRule {
    pub fn new(params: MomentumParams) -> Self {
        Self { params }
    }

    pub fn lookback(&self) -> usize {
        self.params.lookback
    }
}

impl StrategyRule for MomentumRule {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Momentum
    }

    fn warmup_bars(&self) -> usize {
        self.params.lookback
    }

    fn decide(&self, bars: &[Bar], index: usize, position: PositionState) -> Signal {
        let Some(bar) = bars.get(index) else {
            return Signal::Hold;
        };
        let Some(sma) = trailing_sma(bars, index, self.params.lookback) else {
            return Signal::Hold;
        };

        match position {
            PositionState::Flat if bar.close > sma => Signal::Enter,
            PositionState::Long if bar.close < sma => Signal::Exit,
            _ => Signal::Hold,
        }
    }
}
