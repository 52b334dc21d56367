//! Price-history provider port.

use crate::domain::error::{DataError, StopError};
use crate::domain::ohlcv::PriceBar;
use std::fmt;
use std::str::FromStr;

/// How much daily history to request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HistoryWindow {
    OneMonth,
    ThreeMonths,
    SixMonths,
    #[default]
    OneYear,
    TwoYears,
    FiveYears,
}

impl HistoryWindow {
    pub fn trading_days(self) -> usize {
        match self {
            HistoryWindow::OneMonth => 21,
            HistoryWindow::ThreeMonths => 63,
            HistoryWindow::SixMonths => 126,
            HistoryWindow::OneYear => 252,
            HistoryWindow::TwoYears => 504,
            HistoryWindow::FiveYears => 1260,
        }
    }

    /// Calendar span covering `trading_days` with room for weekends and
    /// holidays.
    pub fn calendar_days(self) -> i64 {
        (self.trading_days() * 365).div_ceil(252) as i64 + 7
    }
}

impl fmt::Display for HistoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HistoryWindow::OneMonth => "1mo",
            HistoryWindow::ThreeMonths => "3mo",
            HistoryWindow::SixMonths => "6mo",
            HistoryWindow::OneYear => "1y",
            HistoryWindow::TwoYears => "2y",
            HistoryWindow::FiveYears => "5y",
        };
        write!(f, "{s}")
    }
}

impl FromStr for HistoryWindow {
    type Err = StopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1mo" => Ok(HistoryWindow::OneMonth),
            "3mo" => Ok(HistoryWindow::ThreeMonths),
            "6mo" => Ok(HistoryWindow::SixMonths),
            "1y" => Ok(HistoryWindow::OneYear),
            "2y" => Ok(HistoryWindow::TwoYears),
            "5y" => Ok(HistoryWindow::FiveYears),
            other => Err(StopError::invalid_config(
                "history window",
                format!("unknown window '{other}' (expected 1mo, 3mo, 6mo, 1y, 2y or 5y)"),
            )),
        }
    }
}

/// Supplies daily bars ascending by date. Implementations may block on I/O;
/// the engine itself never does.
pub trait PriceHistory: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self, ticker: &str, window: HistoryWindow) -> Result<Vec<PriceBar>, DataError>;
}
