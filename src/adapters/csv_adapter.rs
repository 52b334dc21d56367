//! CSV file price-history adapter.
//!
//! One file per ticker, `<dir>/<TICKER>.csv`, with a header row and columns
//! `date,open,high,low,close,volume` (dates as YYYY-MM-DD).

use crate::domain::error::DataError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::price_history::{HistoryWindow, PriceHistory};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker.to_uppercase()))
    }
}

fn field<'a>(record: &'a csv::StringRecord, idx: usize, name: &str) -> Result<&'a str, DataError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| DataError::Malformed(format!("missing {name} column")))
}

fn price(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, DataError> {
    let raw = field(record, idx, name)?;
    raw.parse()
        .map_err(|e| DataError::Malformed(format!("invalid {name} value '{raw}': {e}")))
}

fn parse_record(record: &csv::StringRecord) -> Result<PriceBar, DataError> {
    let date_str = field(record, 0, "date")?;
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|e| DataError::Malformed(format!("invalid date '{date_str}': {e}")))?;

    let volume_str = field(record, 5, "volume")?;
    let volume = volume_str
        .parse::<u64>()
        .or_else(|_| volume_str.parse::<f64>().map(|v| v.max(0.0) as u64))
        .map_err(|e| DataError::Malformed(format!("invalid volume value '{volume_str}': {e}")))?;

    Ok(PriceBar {
        date,
        open: price(record, 1, "open")?,
        high: price(record, 2, "high")?,
        low: price(record, 3, "low")?,
        close: price(record, 4, "close")?,
        volume,
    })
}

impl PriceHistory for CsvAdapter {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, ticker: &str, window: HistoryWindow) -> Result<Vec<PriceBar>, DataError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DataError::NotFound {
                ticker: ticker.to_string(),
            },
            _ => DataError::Io(format!("failed to read {}: {}", path.display(), e)),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| DataError::Malformed(format!("CSV parse error: {e}")))?;
            bars.push(parse_record(&record)?);
        }

        if bars.is_empty() {
            return Err(DataError::NotFound {
                ticker: ticker.to_string(),
            });
        }

        bars.sort_by_key(|b| b.date);
        let keep = window.trading_days();
        if bars.len() > keep {
            bars.drain(..bars.len() - keep);
        }
        Ok(bars)
    }
}
