//! Synthetic price-history adapter.
//!
//! Generates daily bars with geometric Brownian motion and a mean-reverting
//! volatility state, so calm and turbulent stretches alternate. Output is a
//! pure function of `(seed, ticker, window, end)`: the per-ticker RNG is
//! derived from the seed and the ticker name, never from call order.

use crate::domain::error::DataError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::price_history::{HistoryWindow, PriceHistory};
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const VOL_PERSISTENCE: f64 = 0.9;
const VOL_SHOCK: f64 = 0.3;
const MAX_GAP: f64 = 0.005;
const INTRADAY_RANGE_FACTOR: f64 = 1.5;
const BASE_VOLUME: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickerProfile {
    pub base_price: f64,
    pub annual_vol: f64,
    pub drift: f64,
}

impl TickerProfile {
    const DEFAULT: TickerProfile = TickerProfile {
        base_price: 100.0,
        annual_vol: 0.30,
        drift: 0.05,
    };

    pub fn for_ticker(ticker: &str) -> Self {
        let (base_price, annual_vol, drift) = match ticker.to_uppercase().as_str() {
            "NVDA" => (140.0, 0.55, 0.15),
            "TSLA" => (250.0, 0.60, 0.10),
            "AAPL" => (195.0, 0.25, 0.08),
            "AMD" => (120.0, 0.50, 0.12),
            "META" => (520.0, 0.40, 0.10),
            "MSFT" => (420.0, 0.22, 0.07),
            "GOOGL" => (175.0, 0.28, 0.08),
            "AMZN" => (200.0, 0.35, 0.09),
            "SPY" => (590.0, 0.15, 0.06),
            "QQQ" => (510.0, 0.20, 0.08),
            _ => return Self::DEFAULT,
        };
        Self {
            base_price,
            annual_vol,
            drift,
        }
    }
}

pub struct SyntheticAdapter {
    seed: u64,
    end: NaiveDate,
}

impl SyntheticAdapter {
    /// Series end on the last business day on or before today.
    pub fn new(seed: u64) -> Self {
        Self::with_end_date(seed, Local::now().date_naive())
    }

    pub fn with_end_date(seed: u64, end: NaiveDate) -> Self {
        Self { seed, end }
    }

    fn rng_for(&self, ticker: &str) -> StdRng {
        // FNV-1a over the ticker, mixed with the seed
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in ticker.to_uppercase().bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        StdRng::seed_from_u64(self.seed ^ hash)
    }

    pub fn generate(&self, ticker: &str, days: usize) -> Vec<PriceBar> {
        let profile = TickerProfile::for_ticker(ticker);
        let mut rng = self.rng_for(ticker);
        let dates = business_days_ending(self.end, days);

        let daily_vol = profile.annual_vol / TRADING_DAYS_PER_YEAR.sqrt();
        let daily_drift = profile.drift / TRADING_DAYS_PER_YEAR;
        let mut vol_state = daily_vol;

        let mut bars = Vec::with_capacity(days);
        let mut prev_close = profile.base_price;
        for (i, date) in dates.into_iter().enumerate() {
            if i == 0 {
                bars.push(PriceBar {
                    date,
                    open: prev_close,
                    high: prev_close * 1.01,
                    low: prev_close * 0.99,
                    close: prev_close,
                    volume: (BASE_VOLUME * rng.gen_range(0.5..1.5)) as u64,
                });
                continue;
            }

            let shock: f64 = rng.sample(StandardNormal);
            vol_state = VOL_PERSISTENCE * vol_state
                + (1.0 - VOL_PERSISTENCE) * daily_vol
                + VOL_SHOCK * daily_vol * shock.abs();

            let z: f64 = rng.sample(StandardNormal);
            let close = prev_close * (1.0 + daily_drift + vol_state * z);
            let open = prev_close * (1.0 + rng.gen_range(-MAX_GAP..MAX_GAP));

            let intraday = vol_state * INTRADAY_RANGE_FACTOR;
            let up: f64 = rng.sample(StandardNormal);
            let down: f64 = rng.sample(StandardNormal);
            let high = open.max(close) * (1.0 + up.abs() * intraday);
            let low = (open.min(close) * (1.0 - down.abs() * intraday)).max(0.01);

            let vol_multiplier = 1.0 + 2.0 * (vol_state / daily_vol - 1.0);
            let volume = (BASE_VOLUME * vol_multiplier.max(0.0) * rng.gen_range(0.5..1.5)) as u64;

            bars.push(PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
            prev_close = close;
        }
        bars
    }
}

fn business_days_ending(end: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut day = end;
    while dates.len() < count {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
        day -= Duration::days(1);
    }
    dates.reverse();
    dates
}

impl PriceHistory for SyntheticAdapter {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch(&self, ticker: &str, window: HistoryWindow) -> Result<Vec<PriceBar>, DataError> {
        if ticker.trim().is_empty() {
            return Err(DataError::NotFound {
                ticker: ticker.to_string(),
            });
        }
        Ok(self.generate(ticker, window.trading_days()))
    }
}
