//! Volatility regime classification.
//!
//! The current ATR is ranked against a window of historical ATR values.
//! Conventions, applied everywhere in this module:
//! - percentile rank is inclusive: 100 * #{h <= current} / #history
//! - the caller's window includes the current point (the orchestrator passes
//!   the trailing `lookback` values ending at the current bar)
//! - a percentile exactly on a threshold maps to the lower regime
//! - z-score uses the sample standard deviation (n-1); fewer than two points
//!   or zero variance give 0

use crate::domain::error::StopError;
use crate::domain::indicator::AtrSeries;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityRegime {
    Low,
    Normal,
    Elevated,
    Extreme,
}

impl VolatilityRegime {
    pub const ALL: [VolatilityRegime; 4] = [
        VolatilityRegime::Low,
        VolatilityRegime::Normal,
        VolatilityRegime::Elevated,
        VolatilityRegime::Extreme,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for VolatilityRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolatilityRegime::Low => write!(f, "low"),
            VolatilityRegime::Normal => write!(f, "normal"),
            VolatilityRegime::Elevated => write!(f, "elevated"),
            VolatilityRegime::Extreme => write!(f, "extreme"),
        }
    }
}

/// Percentile upper bounds and stop multipliers, one per regime, in
/// `VolatilityRegime::ALL` order. Validated on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeTable {
    thresholds: [f64; 4],
    multipliers: [f64; 4],
}

impl RegimeTable {
    pub fn new(thresholds: [f64; 4], multipliers: [f64; 4]) -> Result<Self, StopError> {
        for (i, &t) in thresholds.iter().enumerate() {
            if !t.is_finite() || t <= 0.0 || t > 100.0 {
                return Err(StopError::invalid_config(
                    "regime thresholds",
                    format!("threshold {t} must be within (0, 100]"),
                ));
            }
            if i > 0 && t <= thresholds[i - 1] {
                return Err(StopError::invalid_config(
                    "regime thresholds",
                    format!(
                        "thresholds must be strictly increasing ({} then {t})",
                        thresholds[i - 1]
                    ),
                ));
            }
        }
        if thresholds[3] != 100.0 {
            return Err(StopError::invalid_config(
                "regime thresholds",
                "last threshold must be 100",
            ));
        }
        if let Some(m) = multipliers.iter().find(|m| !m.is_finite() || **m <= 0.0) {
            return Err(StopError::invalid_config(
                "regime multipliers",
                format!("multiplier {m} must be positive"),
            ));
        }
        Ok(Self {
            thresholds,
            multipliers,
        })
    }

    /// 25/75/90/100 with multipliers 1.5/2.0/2.5/3.0.
    pub fn standard() -> Self {
        Self {
            thresholds: [25.0, 75.0, 90.0, 100.0],
            multipliers: [1.5, 2.0, 2.5, 3.0],
        }
    }

    pub fn threshold(&self, regime: VolatilityRegime) -> f64 {
        self.thresholds[regime.index()]
    }

    pub fn multiplier(&self, regime: VolatilityRegime) -> f64 {
        self.multipliers[regime.index()]
    }

    /// Smallest regime whose upper bound is >= percentile.
    pub fn classify(&self, percentile: f64) -> VolatilityRegime {
        VolatilityRegime::ALL
            .into_iter()
            .find(|r| percentile <= self.threshold(*r))
            .unwrap_or(VolatilityRegime::Extreme)
    }
}

impl Default for RegimeTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeAssessment {
    pub regime: VolatilityRegime,
    pub percentile: f64,
    pub z_score: f64,
    pub multiplier: f64,
    pub current_atr: f64,
    pub historical_mean: f64,
    pub historical_std: f64,
    pub window: usize,
}

pub fn percentile_rank(history: &[f64], current: f64) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let at_or_below = history.iter().filter(|&&h| h <= current).count();
    100.0 * at_or_below as f64 / history.len() as f64
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0 for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

pub fn z_score(history: &[f64], current: f64) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let std = sample_std(history);
    if std <= 0.0 {
        return 0.0;
    }
    (current - mean(history)) / std
}

pub fn classify_regime(
    history: &[f64],
    current: f64,
    table: &RegimeTable,
) -> Result<RegimeAssessment, StopError> {
    if history.len() < 2 {
        return Err(StopError::InsufficientHistory {
            points: history.len(),
        });
    }
    let percentile = percentile_rank(history, current);
    let regime = table.classify(percentile);
    Ok(RegimeAssessment {
        regime,
        percentile,
        z_score: z_score(history, current),
        multiplier: table.multiplier(regime),
        current_atr: current,
        historical_mean: mean(history),
        historical_std: sample_std(history),
        window: history.len(),
    })
}

/// Classifies the latest ATR value against the trailing `lookback` values
/// of its own series (current point included).
pub fn assess_current(
    atr: &AtrSeries,
    lookback: usize,
    table: &RegimeTable,
) -> Result<RegimeAssessment, StopError> {
    let values = atr.values();
    let start = values.len().saturating_sub(lookback);
    classify_regime(&values[start..], atr.current(), table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimePoint {
    pub date: NaiveDate,
    pub atr: f64,
    pub percentile: f64,
    pub regime: VolatilityRegime,
}

/// Regime at every ATR point, each ranked within the window of up to
/// `lookback` values ending at that point. Points with fewer than two
/// values in their window are omitted.
pub fn rolling_regime(atr: &AtrSeries, lookback: usize, table: &RegimeTable) -> Vec<RegimePoint> {
    let values = atr.values();
    atr.points
        .iter()
        .enumerate()
        .filter_map(|(i, point)| {
            let start = (i + 1).saturating_sub(lookback);
            let window = &values[start..=i];
            if window.len() < 2 {
                return None;
            }
            let percentile = percentile_rank(window, point.value);
            Some(RegimePoint {
                date: point.date,
                atr: point.value,
                percentile,
                regime: table.classify(percentile),
            })
        })
        .collect()
}
