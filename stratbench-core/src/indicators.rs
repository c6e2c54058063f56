//! Indicator helpers over bar history.
//!
//! Look-ahead guard: a value used at bar `t` never reads `bars[t..]` unless
//! the function says so.

use crate::domain::Bar;

/// Arithmetic mean. `None` when there are no values.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: ExactSizeIterator,
{
    let values = values.into_iter();
    let n = values.len();
    if n == 0 {
        return None;
    }
    Some(values.sum::<f64>() / n as f64)
}

/// Simple moving average of the `lookback` closes strictly before `index`
/// (bars `index - lookback .. index`).
///
/// Returns `None` when there is not enough history or `lookback == 0`.
pub fn trailing_sma(bars: &[Bar], index: usize, lookback: usize) -> Option<f64> {
    if lookback == 0 || index < lookback || index > bars.len() {
        return None;
    }
    mean(bars[index - lookback..index].iter().map(|b| b.close))
}
