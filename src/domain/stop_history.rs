//! Day-by-day volatility and stop-channel history for one ticker.
//!
//! Each row carries the primary ATR, its rolling regime, and the Chandelier
//! and Keltner stop levels on that date. Channels that need more bars than
//! the series has are reported as absent rather than failing the history.

use crate::domain::config::StopConfig;
use crate::domain::error::StopError;
use crate::domain::indicator::IndicatorPoint;
use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::chandelier::calculate_chandelier;
use crate::domain::indicator::keltner::calculate_keltner;
use crate::domain::ohlcv::{PriceBar, validate_series};
use crate::domain::regime::{VolatilityRegime, rolling_regime};
use crate::ports::price_history::{HistoryWindow, PriceHistory};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Parameters of the two channel stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelParams {
    pub chandelier_atr_period: usize,
    pub chandelier_lookback: usize,
    pub chandelier_multiplier: f64,
    pub keltner_ema_period: usize,
    pub keltner_atr_period: usize,
    pub keltner_multiplier: f64,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            chandelier_atr_period: 22,
            chandelier_lookback: 22,
            chandelier_multiplier: 3.0,
            keltner_ema_period: 20,
            keltner_atr_period: 10,
            keltner_multiplier: 2.0,
        }
    }
}

impl ChannelParams {
    pub fn validate(&self) -> Result<(), StopError> {
        let periods = [
            ("chandelier atr period", self.chandelier_atr_period),
            ("chandelier lookback", self.chandelier_lookback),
            ("keltner ema period", self.keltner_ema_period),
            ("keltner atr period", self.keltner_atr_period),
        ];
        for (field, value) in periods {
            if value == 0 {
                return Err(StopError::invalid_config(field, "must be positive"));
            }
        }
        let multipliers = [
            ("chandelier multiplier", self.chandelier_multiplier),
            ("keltner multiplier", self.keltner_multiplier),
        ];
        for (field, value) in multipliers {
            if !value.is_finite() || value <= 0.0 {
                return Err(StopError::invalid_config(
                    field,
                    format!("must be a positive number, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub close: f64,
    pub atr: f64,
    pub percentile: f64,
    pub regime: VolatilityRegime,
    pub chandelier: Option<f64>,
    pub keltner: Option<f64>,
}

/// The last `days` rows of history, oldest first. `days == 0` keeps every row.
pub fn stop_history(
    bars: &[PriceBar],
    config: &StopConfig,
    channels: &ChannelParams,
    days: usize,
) -> Result<Vec<HistoryRow>, StopError> {
    validate_series(bars)?;
    channels.validate()?;

    let atr = calculate_atr(bars, config.atr_period, config.method)?;
    let regimes = rolling_regime(&atr, config.regime_lookback, &config.regime_table);
    if regimes.is_empty() {
        return Err(StopError::InsufficientHistory { points: atr.len() });
    }

    let chandelier = by_date(calculate_chandelier(
        bars,
        channels.chandelier_atr_period,
        config.method,
        channels.chandelier_multiplier,
        channels.chandelier_lookback,
    ))?;
    let keltner = by_date(calculate_keltner(
        bars,
        channels.keltner_ema_period,
        channels.keltner_atr_period,
        config.method,
        channels.keltner_multiplier,
    ))?;
    let closes: BTreeMap<NaiveDate, f64> = bars.iter().map(|b| (b.date, b.close)).collect();

    let skip = if days == 0 {
        0
    } else {
        regimes.len().saturating_sub(days)
    };
    let rows = regimes
        .into_iter()
        .skip(skip)
        .map(|point| HistoryRow {
            date: point.date,
            close: closes.get(&point.date).copied().unwrap_or(f64::NAN),
            atr: point.atr,
            percentile: point.percentile,
            regime: point.regime,
            chandelier: chandelier.get(&point.date).copied(),
            keltner: keltner.get(&point.date).copied(),
        })
        .collect();
    Ok(rows)
}

// Too little data for a channel leaves it empty; other errors propagate.
fn by_date(
    series: Result<Vec<IndicatorPoint>, StopError>,
) -> Result<BTreeMap<NaiveDate, f64>, StopError> {
    match series {
        Ok(points) => Ok(points.into_iter().map(|p| (p.date, p.value)).collect()),
        Err(StopError::InsufficientData {
            period,
            required,
            actual,
        }) => {
            log::warn!("channel ATR({period}) omitted: need {required} bars, have {actual}");
            Ok(BTreeMap::new())
        }
        Err(e) => Err(e),
    }
}

/// Fetches history for one ticker and builds its stop history.
pub fn ticker_history(
    provider: &dyn PriceHistory,
    ticker: &str,
    window: HistoryWindow,
    config: &StopConfig,
    channels: &ChannelParams,
    days: usize,
) -> Result<Vec<HistoryRow>, StopError> {
    log::info!("fetching {window} of {ticker} from {}", provider.name());
    let bars = provider
        .fetch(ticker, window)
        .map_err(|source| StopError::Upstream {
            ticker: ticker.to_string(),
            source,
        })?;
    stop_history(&bars, config, channels, days)
}
