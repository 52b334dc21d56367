#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
pub use volstop::domain::error::DataError;
pub use volstop::domain::ohlcv::PriceBar;
use volstop::ports::price_history::{HistoryWindow, PriceHistory};

pub struct MockPriceHistory {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, DataError>,
    pub calls: AtomicUsize,
}

impl MockPriceHistory {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, error: DataError) -> Self {
        self.errors.insert(ticker.to_string(), error);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PriceHistory for MockPriceHistory {
    fn name(&self) -> &str {
        "test"
    }

    fn fetch(&self, ticker: &str, _window: HistoryWindow) -> Result<Vec<PriceBar>, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.errors.get(ticker) {
            return Err(err.clone());
        }
        self.data
            .get(ticker)
            .cloned()
            .ok_or_else(|| DataError::NotFound {
                ticker: ticker.to_string(),
            })
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(date_str: &str, high: f64, low: f64, close: f64) -> PriceBar {
    PriceBar {
        date: date(date_str),
        open: close,
        high,
        low,
        close,
        volume: 1_000_000,
    }
}

/// Daily bars starting 2024-01-01 with a steady rise of `step` per bar and a
/// fixed high-low range.
pub fn trending_bars(count: usize, start_price: f64, step: f64, range: f64) -> Vec<PriceBar> {
    let start = date("2024-01-01");
    (0..count)
        .map(|i| {
            let close = start_price + step * i as f64;
            PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close - step / 2.0,
                high: close + range / 2.0,
                low: close - range / 2.0,
                close,
                volume: 1_000_000,
            }
        })
        .collect()
}

/// Bars whose range widens over time, so the latest ATR is the largest.
pub fn widening_bars(count: usize) -> Vec<PriceBar> {
    let start = date("2024-01-01");
    (0..count)
        .map(|i| {
            let close = 100.0;
            let half = 0.5 + i as f64 * 0.05;
            PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + half,
                low: close - half,
                close,
                volume: 1_000_000,
            }
        })
        .collect()
}

/// Bars whose range narrows over time, so the latest ATR is the smallest.
pub fn narrowing_bars(count: usize) -> Vec<PriceBar> {
    let start = date("2024-01-01");
    (0..count)
        .map(|i| {
            let close = 100.0;
            let half = 0.5 + (count - i) as f64 * 0.05;
            PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + half,
                low: close - half,
                close,
                volume: 1_000_000,
            }
        })
        .collect()
}
