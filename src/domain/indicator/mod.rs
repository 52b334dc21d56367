//! Volatility indicators built on True Range.
//!
//! - `IndicatorPoint`: one dated value of an indicator series
//! - `AtrMethod`: smoothing applied to the True-Range series
//! - `AtrSeries`: a smoothed ATR series for one period and method

pub mod atr;
pub mod chandelier;
pub mod keltner;

use crate::domain::error::StopError;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AtrMethod {
    /// Seeded by the mean of the first N true ranges, then smoothed with 1/N.
    #[default]
    Wilder,
    /// Rolling arithmetic mean of the last N true ranges.
    Sma,
    /// Exponential average with alpha = 2/(N+1), seeded by the first true range.
    Ema,
}

impl fmt::Display for AtrMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtrMethod::Wilder => write!(f, "wilder"),
            AtrMethod::Sma => write!(f, "sma"),
            AtrMethod::Ema => write!(f, "ema"),
        }
    }
}

impl FromStr for AtrMethod {
    type Err = StopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wilder" => Ok(AtrMethod::Wilder),
            "sma" => Ok(AtrMethod::Sma),
            "ema" => Ok(AtrMethod::Ema),
            other => Err(StopError::invalid_config(
                "atr method",
                format!("unknown method '{other}' (expected wilder, sma or ema)"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtrSeries {
    pub period: usize,
    pub method: AtrMethod,
    pub points: Vec<IndicatorPoint>,
}

impl AtrSeries {
    /// Most recent ATR value. A computed series always has at least one point.
    pub fn current(&self) -> f64 {
        self.points.last().map(|p| p.value).unwrap_or(0.0)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl fmt::Display for AtrSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ATR({},{})", self.period, self.method)
    }
}
