//! Daily price bar and the price-series data contract.

use crate::domain::error::StopError;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Checks the series contract: strictly increasing dates, finite prices,
/// high >= low. Open and close may sit outside [low, high] (gapped feeds).
pub fn validate_series(bars: &[PriceBar]) -> Result<(), StopError> {
    for (i, bar) in bars.iter().enumerate() {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(StopError::InvalidSeries {
                reason: format!("non-finite price on {}", bar.date),
            });
        }
        if bar.high < bar.low {
            return Err(StopError::InvalidSeries {
                reason: format!(
                    "high {} below low {} on {}",
                    bar.high, bar.low, bar.date
                ),
            });
        }
        if i > 0 && bars[i - 1].date >= bar.date {
            return Err(StopError::InvalidSeries {
                reason: format!(
                    "dates not strictly increasing at {} (previous {})",
                    bar.date,
                    bars[i - 1].date
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        // high-low=20, |high-100|=10, |low-100|=10 → 20
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        // high-low=20, |110-130|=20, |90-130|=40 → 40
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_accepts_gapped_close() {
        let mut second = sample_bar();
        second.date = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        second.close = 120.0;
        assert!(validate_series(&[sample_bar(), second]).is_ok());
    }

    #[test]
    fn validate_rejects_inverted_bar() {
        let mut bar = sample_bar();
        bar.low = 115.0;
        let err = validate_series(&[bar]).unwrap_err();
        assert!(matches!(err, StopError::InvalidSeries { .. }));
    }

    #[test]
    fn validate_rejects_duplicate_dates() {
        let err = validate_series(&[sample_bar(), sample_bar()]).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn validate_rejects_nan() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(validate_series(&[bar]).is_err());
    }

    #[test]
    fn validate_empty_is_ok() {
        assert!(validate_series(&[]).is_ok());
    }
}
