//! Validated engine configuration.
//!
//! `StopParams` is plain data; `StopConfig` is the same data after
//! validation and is the only form the recommender accepts.

use crate::domain::error::StopError;
use crate::domain::indicator::AtrMethod;
use crate::domain::regime::RegimeTable;
use std::ops::Deref;

#[derive(Debug, Clone, PartialEq)]
pub struct StopParams {
    /// Drives the regime and the stop.
    pub atr_period: usize,
    /// Reported for context only.
    pub display_periods: Vec<usize>,
    pub method: AtrMethod,
    pub regime_table: RegimeTable,
    /// Trailing ATR values the current value is ranked against.
    pub regime_lookback: usize,
    pub use_regime_adjustment: bool,
    /// Multiplier used when regime adjustment is off.
    pub base_multiplier: f64,
    /// Bars searched for the recent high when no entry date is given.
    pub recent_high_lookback: usize,
    pub risk_amounts: Vec<f64>,
}

impl Default for StopParams {
    fn default() -> Self {
        Self {
            atr_period: 14,
            display_periods: vec![7, 14, 21],
            method: AtrMethod::Wilder,
            regime_table: RegimeTable::standard(),
            regime_lookback: 252,
            use_regime_adjustment: true,
            base_multiplier: 2.0,
            recent_high_lookback: 20,
            risk_amounts: vec![500.0, 1000.0, 2000.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopConfig(StopParams);

impl StopConfig {
    pub fn new(params: StopParams) -> Result<Self, StopError> {
        if params.atr_period == 0 {
            return Err(StopError::invalid_config("atr period", "must be positive"));
        }
        if params.display_periods.contains(&0) {
            return Err(StopError::invalid_config(
                "display periods",
                "periods must be positive",
            ));
        }
        if params.regime_lookback < 2 {
            return Err(StopError::invalid_config(
                "regime lookback",
                "must cover at least 2 ATR values",
            ));
        }
        if params.recent_high_lookback == 0 {
            return Err(StopError::invalid_config(
                "recent high lookback",
                "must be positive",
            ));
        }
        if !params.base_multiplier.is_finite() || params.base_multiplier <= 0.0 {
            return Err(StopError::invalid_config(
                "base multiplier",
                format!("{} must be positive", params.base_multiplier),
            ));
        }
        if let Some(r) = params
            .risk_amounts
            .iter()
            .find(|r| !r.is_finite() || **r <= 0.0)
        {
            return Err(StopError::invalid_config(
                "risk amounts",
                format!("{r} must be positive"),
            ));
        }
        Ok(Self(params))
    }

    /// Wilder ATR(14), display 7/14/21, standard regime table, one-year
    /// lookback, 20-bar recent high, $500/$1000/$2000 sizing.
    pub fn standard() -> Self {
        Self(StopParams::default())
    }

    pub fn params(&self) -> &StopParams {
        &self.0
    }

    pub fn into_params(self) -> StopParams {
        self.0
    }
}

impl Deref for StopConfig {
    type Target = StopParams;

    fn deref(&self) -> &StopParams {
        &self.0
    }
}

impl Default for StopConfig {
    fn default() -> Self {
        Self::standard()
    }
}
