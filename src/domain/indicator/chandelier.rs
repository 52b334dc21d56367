//! Chandelier exit: highest high over `lookback` bars minus `multiplier` x ATR.
//!
//! Emitted only on dates where both the ATR and a full high window exist.

use crate::domain::error::StopError;
use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::{AtrMethod, IndicatorPoint};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_chandelier(
    bars: &[PriceBar],
    atr_period: usize,
    method: AtrMethod,
    multiplier: f64,
    lookback: usize,
) -> Result<Vec<IndicatorPoint>, StopError> {
    if lookback == 0 {
        return Err(StopError::invalid_config(
            "chandelier lookback",
            "must be positive",
        ));
    }
    let atr = calculate_atr(bars, atr_period, method)?;

    // ATR point k belongs to bar index atr_period + k.
    let points = atr
        .points
        .iter()
        .enumerate()
        .filter_map(|(k, point)| {
            let i = atr_period + k;
            if i + 1 < lookback {
                return None;
            }
            let highest = bars[i + 1 - lookback..=i]
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            Some(IndicatorPoint {
                date: point.date,
                value: highest - multiplier * point.value,
            })
        })
        .collect();

    Ok(points)
}
