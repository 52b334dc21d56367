//! Average True Range.
//!
//! TR[0] = H[0] - L[0]; TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! Smoothing per `AtrMethod`. Output starts at index N, the first bar with
//! N+1 bars of history, so every method yields the same dates.

use crate::domain::error::StopError;
use crate::domain::indicator::{AtrMethod, AtrSeries, IndicatorPoint};
use crate::domain::ohlcv::PriceBar;
use std::collections::BTreeMap;

pub fn true_range_series(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.range()
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calculate_atr(
    bars: &[PriceBar],
    period: usize,
    method: AtrMethod,
) -> Result<AtrSeries, StopError> {
    if period == 0 {
        return Err(StopError::invalid_config("atr period", "must be positive"));
    }
    let required = period + 1;
    if bars.len() < required {
        return Err(StopError::InsufficientData {
            period,
            required,
            actual: bars.len(),
        });
    }

    let tr = true_range_series(bars);
    let smoothed = match method {
        AtrMethod::Sma => smooth_sma(&tr, period),
        AtrMethod::Ema => smooth_ema(&tr, period),
        AtrMethod::Wilder => smooth_wilder(&tr, period),
    };

    let points = bars
        .iter()
        .zip(smoothed)
        .skip(period)
        .map(|(bar, value)| IndicatorPoint {
            date: bar.date,
            value,
        })
        .collect();

    Ok(AtrSeries {
        period,
        method,
        points,
    })
}

/// Computes each period independently over the same bars. Periods without
/// enough history are left out of the map.
pub fn calculate_atr_periods(
    bars: &[PriceBar],
    periods: &[usize],
    method: AtrMethod,
) -> Result<BTreeMap<usize, AtrSeries>, StopError> {
    let mut out = BTreeMap::new();
    for &period in periods {
        match calculate_atr(bars, period, method) {
            Ok(series) => {
                out.insert(period, series);
            }
            Err(StopError::InsufficientData {
                required, actual, ..
            }) => {
                log::debug!("skipping ATR({period}): need {required} bars, have {actual}");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

// Values before index period-1 are placeholders and never emitted.
fn smooth_sma(tr: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![0.0; tr.len()];
    for i in (period - 1)..tr.len() {
        let window = &tr[i + 1 - period..=i];
        out[i] = window.iter().sum::<f64>() / period as f64;
    }
    out
}

/// EMA with alpha = 2/(N+1), seeded by the first value. One output per input.
pub(crate) fn smooth_ema(tr: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(tr.len());
    let mut ema = tr[0];
    out.push(ema);
    for &value in &tr[1..] {
        ema = alpha * value + (1.0 - alpha) * ema;
        out.push(ema);
    }
    out
}

fn smooth_wilder(tr: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![0.0; tr.len()];
    let seed = tr[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = seed;
    let n = period as f64;
    for i in period..tr.len() {
        out[i] = (out[i - 1] * (n - 1.0) + tr[i]) / n;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    fn stepping_bars() -> Vec<PriceBar> {
        vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 115.0, 105.0, 110.0),
            make_bar(3, 120.0, 110.0, 115.0),
            make_bar(4, 125.0, 115.0, 120.0),
            make_bar(5, 140.0, 118.0, 121.0),
        ]
    }

    #[test]
    fn atr_true_range_series() {
        let tr = true_range_series(&stepping_bars());
        assert_abs_diff_eq!(tr[0], 10.0);
        assert_abs_diff_eq!(tr[1], 10.0);
        // 140-118=22, |140-120|=20, |118-120|=2
        assert_abs_diff_eq!(tr[4], 22.0);
    }

    #[test]
    fn atr_basic() {
        let bars = stepping_bars();
        for method in [AtrMethod::Wilder, AtrMethod::Sma, AtrMethod::Ema] {
            let series = calculate_atr(&bars, 3, method).unwrap();
            assert_eq!(series.len(), 2);
            assert_eq!(series.points[0].date, bars[3].date);
            assert_eq!(series.period, 3);
            assert_eq!(series.method, method);
        }
    }

    #[test]
    fn atr_seed_is_average() {
        // flat closes, ranges 10, 20, 30, 10
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 115.0, 95.0, 105.0),
            make_bar(3, 120.0, 90.0, 105.0),
            make_bar(4, 110.0, 100.0, 105.0),
        ];
        let series = calculate_atr(&bars, 3, AtrMethod::Wilder).unwrap();
        let seed = (10.0 + 20.0 + 30.0) / 3.0;
        let expected = (seed * 2.0 + 10.0) / 3.0;
        assert_eq!(series.len(), 1);
        assert_abs_diff_eq!(series.current(), expected, epsilon = 1e-12);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let series = calculate_atr(&stepping_bars(), 3, AtrMethod::Wilder).unwrap();
        // seed over TR[0..3] = 10; index 3: (10*2 + 10)/3 = 10
        assert_abs_diff_eq!(series.points[0].value, 10.0, epsilon = 1e-12);
        // index 4: (10*2 + 22)/3
        assert_abs_diff_eq!(series.points[1].value, 42.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn atr_sma_rolling_mean() {
        let series = calculate_atr(&stepping_bars(), 3, AtrMethod::Sma).unwrap();
        assert_abs_diff_eq!(series.points[0].value, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(series.points[1].value, 14.0, epsilon = 1e-12);
    }

    #[test]
    fn atr_ema_seeded_by_first_true_range() {
        let series = calculate_atr(&stepping_bars(), 3, AtrMethod::Ema).unwrap();
        let alpha = 0.5;
        let mut ema = 10.0;
        for tr in [10.0, 10.0, 10.0] {
            ema = alpha * tr + (1.0 - alpha) * ema;
        }
        assert_abs_diff_eq!(series.points[0].value, ema, epsilon = 1e-12);
        let next = alpha * 22.0 + (1.0 - alpha) * ema;
        assert_abs_diff_eq!(series.points[1].value, next, epsilon = 1e-12);
    }

    #[test]
    fn atr_flat_prices_are_zero() {
        let bars: Vec<PriceBar> = (1..=15).map(|d| make_bar(d, 50.0, 50.0, 50.0)).collect();
        for method in [AtrMethod::Wilder, AtrMethod::Sma, AtrMethod::Ema] {
            let series = calculate_atr(&bars, 14, method).unwrap();
            assert_eq!(series.len(), 1);
            assert_eq!(series.current(), 0.0);
        }
    }

    #[test]
    fn atr_insufficient_bars() {
        let bars: Vec<PriceBar> = (1..=14).map(|d| make_bar(d, 11.0, 9.0, 10.0)).collect();
        let err = calculate_atr(&bars, 14, AtrMethod::Wilder).unwrap_err();
        assert!(matches!(
            err,
            StopError::InsufficientData {
                period: 14,
                required: 15,
                actual: 14
            }
        ));
    }

    #[test]
    fn atr_handles_gaps() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 130.0, 120.0, 125.0),
            make_bar(3, 120.0, 110.0, 115.0),
        ];
        let tr = true_range_series(&bars);
        // gap up: |130-105| beats the 10-point range
        assert_abs_diff_eq!(tr[1], 25.0);
        // gap down: |110-125|
        assert_abs_diff_eq!(tr[2], 15.0);

        let series = calculate_atr(&bars, 2, AtrMethod::Sma).unwrap();
        assert_eq!(series.len(), 1);
        assert_abs_diff_eq!(series.current(), 20.0, epsilon = 1e-12);
    }

    #[test]
    fn atr_zero_period() {
        let err = calculate_atr(&stepping_bars(), 0, AtrMethod::Sma).unwrap_err();
        assert!(matches!(err, StopError::InvalidConfig { .. }));
    }

    #[test]
    fn periods_computed_independently() {
        let bars = stepping_bars();
        let map = calculate_atr_periods(&bars, &[2, 3, 7], AtrMethod::Wilder).unwrap();
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
        let alone = calculate_atr(&bars, 2, AtrMethod::Wilder).unwrap();
        assert_eq!(map[&2], alone);
    }

    #[test]
    fn periods_propagate_config_errors() {
        let err = calculate_atr_periods(&stepping_bars(), &[0], AtrMethod::Sma).unwrap_err();
        assert!(matches!(err, StopError::InvalidConfig { .. }));
    }
}
