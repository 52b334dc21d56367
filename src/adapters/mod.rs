//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod json_report;
pub mod synthetic_adapter;
pub mod text_report;
#[cfg(feature = "yahoo")]
pub mod yahoo_adapter;

use crate::domain::error::StopError;
use crate::ports::price_history::{HistoryWindow, PriceHistory};
use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataSource {
    #[default]
    Yahoo,
    Csv,
    Mock,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Yahoo => write!(f, "yahoo"),
            DataSource::Csv => write!(f, "csv"),
            DataSource::Mock => write!(f, "mock"),
        }
    }
}

impl FromStr for DataSource {
    type Err = StopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(DataSource::Yahoo),
            "csv" => Ok(DataSource::Csv),
            "mock" => Ok(DataSource::Mock),
            other => Err(StopError::invalid_config(
                "data source",
                format!("unknown source '{other}' (expected yahoo, csv or mock)"),
            )),
        }
    }
}

/// Where price history comes from and how much of it to request.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub source: DataSource,
    pub window: HistoryWindow,
    pub csv_dir: Option<PathBuf>,
    pub seed: u64,
    /// Last date of synthetic series; today when unset.
    pub mock_end: Option<NaiveDate>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            source: DataSource::default(),
            window: HistoryWindow::default(),
            csv_dir: None,
            seed: 42,
            mock_end: None,
        }
    }
}

pub fn build_provider(settings: &DataSettings) -> Result<Box<dyn PriceHistory>, StopError> {
    log::debug!("using {} price history", settings.source);
    match settings.source {
        DataSource::Mock => {
            let adapter = match settings.mock_end {
                Some(end) => synthetic_adapter::SyntheticAdapter::with_end_date(settings.seed, end),
                None => synthetic_adapter::SyntheticAdapter::new(settings.seed),
            };
            Ok(Box::new(adapter))
        }
        DataSource::Csv => {
            let dir = settings.csv_dir.clone().ok_or_else(|| StopError::ConfigMissing {
                section: "data".into(),
                key: "csv_dir".into(),
            })?;
            Ok(Box::new(csv_adapter::CsvAdapter::new(dir)))
        }
        #[cfg(feature = "yahoo")]
        DataSource::Yahoo => {
            let adapter = yahoo_adapter::YahooAdapter::new().map_err(|source| {
                StopError::Upstream {
                    ticker: settings.source.to_string(),
                    source,
                }
            })?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "yahoo"))]
        DataSource::Yahoo => Err(StopError::Upstream {
            ticker: settings.source.to_string(),
            source: crate::domain::error::DataError::Network("built without the yahoo feature".into()),
        }),
    }
}
