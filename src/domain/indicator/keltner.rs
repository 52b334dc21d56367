//! Keltner lower band: EMA of close minus `multiplier` x ATR.
//!
//! The EMA is seeded by the first close. Points are emitted on ATR dates once
//! at least `ema_period` closes have been seen.

use crate::domain::error::StopError;
use crate::domain::indicator::atr::{calculate_atr, smooth_ema};
use crate::domain::indicator::{AtrMethod, IndicatorPoint};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_keltner(
    bars: &[PriceBar],
    ema_period: usize,
    atr_period: usize,
    method: AtrMethod,
    multiplier: f64,
) -> Result<Vec<IndicatorPoint>, StopError> {
    if ema_period == 0 {
        return Err(StopError::invalid_config(
            "keltner ema period",
            "must be positive",
        ));
    }
    let atr = calculate_atr(bars, atr_period, method)?;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema = smooth_ema(&closes, ema_period);

    let points = atr
        .points
        .iter()
        .enumerate()
        .filter_map(|(k, point)| {
            let i = atr_period + k;
            if i + 1 < ema_period {
                return None;
            }
            Some(IndicatorPoint {
                date: point.date,
                value: ema[i] - multiplier * point.value,
            })
        })
        .collect();

    Ok(points)
}
