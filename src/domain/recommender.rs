//! Stop recommendation pipeline.
//!
//! bars → primary ATR → regime → recent high → stop → sizing, plus ATR for
//! each display period. Every step is pure; only `analyze_ticker` and
//! `recommend_watchlist` touch a provider.

use crate::domain::config::StopConfig;
use crate::domain::error::StopError;
use crate::domain::indicator::AtrMethod;
use crate::domain::indicator::atr::{calculate_atr, calculate_atr_periods};
use crate::domain::ohlcv::{PriceBar, validate_series};
use crate::domain::regime::{VolatilityRegime, assess_current};
use crate::domain::sizing::{SizingTable, sizing_table};
use crate::domain::trailing_stop::{EntryContext, HighAnchor, StopInput, compute_stop, find_recent_high};
use crate::ports::price_history::{HistoryWindow, PriceHistory};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// An open position the stop should protect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryPosition {
    pub price: f64,
    /// When set, the recent high is searched from this date on and the ATR
    /// on this date is used for the initial stop.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopRecommendation {
    pub ticker: String,
    pub as_of: NaiveDate,
    pub current_price: f64,
    pub suggested_stop: f64,
    pub distance_pct: f64,

    pub atr_period: usize,
    pub atr_method: AtrMethod,
    pub atr: f64,
    pub atr_by_period: BTreeMap<usize, f64>,

    pub base_multiplier: f64,
    pub multiplier: f64,
    pub regime: VolatilityRegime,
    pub percentile: f64,
    pub z_score: f64,
    pub historical_mean: f64,
    pub historical_std: f64,

    pub recent_high: f64,
    pub recent_high_date: NaiveDate,

    pub entry_price: Option<f64>,
    pub initial_stop: Option<f64>,
    pub atr_at_entry: Option<f64>,

    pub risk_per_share: f64,
    pub under_water: bool,
    pub sizing_table: SizingTable,
}

pub fn recommend(
    ticker: &str,
    bars: &[PriceBar],
    entry: Option<&EntryPosition>,
    config: &StopConfig,
) -> Result<StopRecommendation, StopError> {
    validate_series(bars)?;

    let primary = calculate_atr(bars, config.atr_period, config.method)?;
    let atr = primary.current();

    let mut atr_by_period: BTreeMap<usize, f64> =
        calculate_atr_periods(bars, &config.display_periods, config.method)?
            .into_iter()
            .map(|(period, series)| (period, series.current()))
            .collect();
    atr_by_period.insert(config.atr_period, atr);
    for period in &config.display_periods {
        if !atr_by_period.contains_key(period) {
            log::warn!("{ticker}: not enough bars for ATR({period}), omitted");
        }
    }

    let assessment = assess_current(&primary, config.regime_lookback, &config.regime_table)?;
    let multiplier = if config.use_regime_adjustment {
        assessment.multiplier
    } else {
        config.base_multiplier
    };

    let anchor = match entry.and_then(|e| e.date) {
        Some(date) => HighAnchor::SinceEntry(date),
        None => HighAnchor::Lookback(config.recent_high_lookback),
    };
    let (recent_high, recent_high_date) = find_recent_high(bars, anchor)?;

    // validate_series + calculate_atr guarantee at least period + 1 bars
    let last = &bars[bars.len() - 1];
    let current_price = last.close;

    let entry_context = entry.map(|e| EntryContext {
        price: e.price,
        atr_at_entry: e.date.and_then(|d| primary.value_on(d)).unwrap_or(atr),
    });

    let level = compute_stop(&StopInput {
        current_price,
        recent_high,
        atr,
        multiplier,
        entry: entry_context,
    });

    let sizing = match sizing_table(&config.risk_amounts, level.risk_per_share, current_price) {
        Ok(rows) => SizingTable::Rows { rows },
        Err(e) => {
            log::warn!("{ticker}: sizing unavailable ({e})");
            SizingTable::Unavailable {
                reason: e.to_string(),
            }
        }
    };

    log::debug!(
        "{ticker}: atr={atr:.4} regime={} pct={:.1} mult={multiplier} stop={:.4}",
        assessment.regime,
        assessment.percentile,
        level.stop
    );

    Ok(StopRecommendation {
        ticker: ticker.to_string(),
        as_of: last.date,
        current_price,
        suggested_stop: level.stop,
        distance_pct: level.distance_pct,
        atr_period: config.atr_period,
        atr_method: config.method,
        atr,
        atr_by_period,
        base_multiplier: config.base_multiplier,
        multiplier,
        regime: assessment.regime,
        percentile: assessment.percentile,
        z_score: assessment.z_score,
        historical_mean: assessment.historical_mean,
        historical_std: assessment.historical_std,
        recent_high,
        recent_high_date,
        entry_price: entry.map(|e| e.price),
        initial_stop: level.initial_stop,
        atr_at_entry: entry_context.map(|e| e.atr_at_entry),
        risk_per_share: level.risk_per_share,
        under_water: level.under_water(),
        sizing_table: sizing,
    })
}

/// Fetches history for one ticker and builds its recommendation.
pub fn analyze_ticker(
    provider: &dyn PriceHistory,
    ticker: &str,
    window: HistoryWindow,
    entry: Option<&EntryPosition>,
    config: &StopConfig,
) -> Result<StopRecommendation, StopError> {
    log::info!("fetching {window} of {ticker} from {}", provider.name());
    let bars = provider
        .fetch(ticker, window)
        .map_err(|source| StopError::Upstream {
            ticker: ticker.to_string(),
            source,
        })?;
    recommend(ticker, &bars, entry, config)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerRequest {
    pub ticker: String,
    pub entry: Option<EntryPosition>,
}

impl TickerRequest {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            entry: None,
        }
    }

    pub fn with_entry(mut self, entry: EntryPosition) -> Self {
        self.entry = Some(entry);
        self
    }
}

#[derive(Debug)]
pub struct TickerFailure {
    /// Position of the ticker in the request list.
    pub index: usize,
    pub ticker: String,
    pub error: StopError,
}

/// Successful recommendations and per-ticker failures, each in request order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub recommendations: Vec<StopRecommendation>,
    pub failures: Vec<TickerFailure>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// Runs every request independently. A failing ticker is recorded and the
/// rest continue. With `parallel` the requests fan out over rayon; output
/// order is the same either way.
pub fn recommend_watchlist(
    provider: &dyn PriceHistory,
    requests: &[TickerRequest],
    window: HistoryWindow,
    config: &StopConfig,
    parallel: bool,
) -> BatchReport {
    let run = |req: &TickerRequest| {
        analyze_ticker(provider, &req.ticker, window, req.entry.as_ref(), config)
    };

    let outcomes: Vec<Result<StopRecommendation, StopError>> = if parallel {
        requests.par_iter().map(run).collect()
    } else {
        requests.iter().map(run).collect()
    };

    let mut report = BatchReport::default();
    for (index, (req, outcome)) in requests.iter().zip(outcomes).enumerate() {
        match outcome {
            Ok(rec) => report.recommendations.push(rec),
            Err(error) => {
                log::warn!("skipping {} ({error})", req.ticker);
                report.failures.push(TickerFailure {
                    index,
                    ticker: req.ticker.clone(),
                    error,
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::StopParams;
    use approx::assert_abs_diff_eq;

    fn trending_bars(count: usize) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..count)
            .map(|i| {
                let close = 100.0 + i as f64;
                PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 10_000,
                }
            })
            .collect()
    }

    #[test]
    fn recommendation_on_steady_trend() {
        // every TR is 2 (range 2, |gap| 1), so every ATR is 2
        let bars = trending_bars(40);
        let config = StopConfig::standard();
        let rec = recommend("TEST", &bars, None, &config).unwrap();

        assert_abs_diff_eq!(rec.atr, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rec.current_price, 139.0);
        assert_abs_diff_eq!(rec.recent_high, 140.0);
        assert_eq!(rec.recent_high_date, bars[39].date);
        assert_eq!(rec.as_of, bars[39].date);
        // flat ATR history ranks at 100 → extreme
        assert_eq!(rec.regime, VolatilityRegime::Extreme);
        assert_abs_diff_eq!(rec.multiplier, 3.0);
        assert_abs_diff_eq!(rec.suggested_stop, 134.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rec.risk_per_share, 5.0, epsilon = 1e-9);
        assert_eq!(rec.z_score, 0.0);
        assert!(!rec.under_water);
        assert_eq!(rec.sizing_table.shares_for(1000.0), Some(200));
        assert_eq!(
            rec.atr_by_period.keys().copied().collect::<Vec<_>>(),
            vec![7, 14, 21]
        );
    }

    #[test]
    fn regime_adjustment_can_be_disabled() {
        let bars = trending_bars(40);
        let config = StopConfig::new(StopParams {
            use_regime_adjustment: false,
            base_multiplier: 2.5,
            ..StopParams::default()
        })
        .unwrap();
        let rec = recommend("TEST", &bars, None, &config).unwrap();
        assert_abs_diff_eq!(rec.multiplier, 2.5);
        assert_eq!(rec.regime, VolatilityRegime::Extreme);
        assert_abs_diff_eq!(rec.suggested_stop, 135.0, epsilon = 1e-9);
    }

    #[test]
    fn entry_date_anchors_high_and_atr() {
        let bars = trending_bars(40);
        let entry = EntryPosition {
            price: 130.0,
            date: Some(bars[30].date),
        };
        let rec = recommend("TEST", &bars, Some(&entry), &StopConfig::standard()).unwrap();
        assert_eq!(rec.entry_price, Some(130.0));
        assert_abs_diff_eq!(rec.atr_at_entry.unwrap(), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rec.initial_stop.unwrap(), 124.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rec.suggested_stop, 134.0, epsilon = 1e-9);
    }

    #[test]
    fn short_series_is_insufficient_data() {
        let bars = trending_bars(10);
        let err = recommend("TEST", &bars, None, &StopConfig::standard()).unwrap_err();
        assert!(matches!(
            err,
            StopError::InsufficientData {
                required: 15,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn single_atr_point_is_insufficient_history() {
        let bars = trending_bars(15);
        let err = recommend("TEST", &bars, None, &StopConfig::standard()).unwrap_err();
        assert!(matches!(err, StopError::InsufficientHistory { points: 1 }));
    }

    #[test]
    fn display_periods_without_history_are_omitted() {
        let bars = trending_bars(18);
        let rec = recommend("TEST", &bars, None, &StopConfig::standard()).unwrap();
        assert_eq!(
            rec.atr_by_period.keys().copied().collect::<Vec<_>>(),
            vec![7, 14]
        );
    }

    #[test]
    fn under_water_keeps_recommendation() {
        let mut bars = trending_bars(40);
        let last = bars.len() - 1;
        bars[last].close = 120.0;
        bars[last].low = 119.0;
        let rec = recommend("TEST", &bars, None, &StopConfig::standard()).unwrap();
        assert!(rec.under_water);
        assert!(rec.risk_per_share <= 0.0);
        assert!(matches!(rec.sizing_table, SizingTable::Unavailable { .. }));
    }

    #[test]
    fn invalid_series_rejected() {
        let mut bars = trending_bars(40);
        bars.swap(3, 4);
        let err = recommend("TEST", &bars, None, &StopConfig::standard()).unwrap_err();
        assert!(matches!(err, StopError::InvalidSeries { .. }));
    }
}
