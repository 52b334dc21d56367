//! Trailing stop levels anchored on a recent high.
//!
//! base stop  = recent_high - multiplier * ATR
//! entry stop = entry_price - multiplier * ATR_at_entry
//! stop       = max(entry stop, base stop), floored at zero

use crate::domain::error::StopError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;
use serde::Serialize;

/// Which bars the recent high is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighAnchor {
    /// Bars on or after the entry date.
    SinceEntry(NaiveDate),
    /// The last `n` bars.
    Lookback(usize),
    All,
}

/// Highest high within the anchor window and its date. Ties keep the
/// earliest bar.
pub fn find_recent_high(
    bars: &[PriceBar],
    anchor: HighAnchor,
) -> Result<(f64, NaiveDate), StopError> {
    let window: &[PriceBar] = match anchor {
        HighAnchor::SinceEntry(date) => {
            let start = bars.partition_point(|b| b.date < date);
            &bars[start..]
        }
        HighAnchor::Lookback(n) => &bars[bars.len().saturating_sub(n)..],
        HighAnchor::All => bars,
    };

    let mut best: Option<&PriceBar> = None;
    for bar in window {
        if best.is_none_or(|b| bar.high > b.high) {
            best = Some(bar);
        }
    }
    best.map(|b| (b.high, b.date))
        .ok_or_else(|| StopError::InvalidSeries {
            reason: format!("no bars in recent-high window ({anchor:?})"),
        })
}

/// Initial stop set at entry time.
pub fn entry_stop(entry_price: f64, atr_at_entry: f64, multiplier: f64) -> f64 {
    entry_price - multiplier * atr_at_entry
}

/// A stop may only move up.
pub fn ratchet(previous: f64, candidate: f64) -> f64 {
    previous.max(candidate)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryContext {
    pub price: f64,
    pub atr_at_entry: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopInput {
    pub current_price: f64,
    pub recent_high: f64,
    pub atr: f64,
    pub multiplier: f64,
    pub entry: Option<EntryContext>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StopLevel {
    pub base_stop: f64,
    pub initial_stop: Option<f64>,
    pub stop: f64,
    pub distance: f64,
    pub distance_pct: f64,
    pub risk_per_share: f64,
}

impl StopLevel {
    /// Price is at or below the stop.
    pub fn under_water(&self) -> bool {
        self.risk_per_share <= 0.0
    }
}

pub fn compute_stop(input: &StopInput) -> StopLevel {
    let base_stop = input.recent_high - input.multiplier * input.atr;
    let initial_stop = input
        .entry
        .map(|e| entry_stop(e.price, e.atr_at_entry, input.multiplier));
    let stop = initial_stop
        .map_or(base_stop, |initial| ratchet(initial, base_stop))
        .max(0.0);

    let distance = input.current_price - stop;
    let distance_pct = if input.current_price > 0.0 {
        distance / input.current_price * 100.0
    } else {
        0.0
    };

    StopLevel {
        base_stop,
        initial_stop,
        stop,
        distance,
        distance_pct,
        risk_per_share: distance,
    }
}

/// A stop carried across recomputations; `update` never lowers it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingStop {
    level: f64,
}

impl TrailingStop {
    pub fn new(initial_stop: f64) -> Self {
        Self {
            level: initial_stop.max(0.0),
        }
    }

    pub fn from_entry(entry_price: f64, atr_at_entry: f64, multiplier: f64) -> Self {
        Self::new(entry_stop(entry_price, atr_at_entry, multiplier))
    }

    pub fn update(&mut self, recent_high: f64, atr: f64, multiplier: f64) -> f64 {
        self.level = ratchet(self.level, recent_high - multiplier * atr);
        self.level
    }

    pub fn level(&self) -> f64 {
        self.level
    }
}
