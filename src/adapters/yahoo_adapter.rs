//! Yahoo Finance price-history adapter.
//!
//! Fetches daily bars from the v8 chart API with one blocking request per
//! ticker. Failures surface as `DataError` and are not retried.

use crate::domain::error::DataError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::price_history::{HistoryWindow, PriceHistory};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
}

impl YahooAdapter {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn chart_url(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp());
        let end_ts = end
            .and_hms_opt(23, 59, 59)
            .map_or(0, |dt| dt.and_utc().timestamp());
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{ticker}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }
}

fn parse_chart(ticker: &str, body: &str) -> Result<Vec<PriceBar>, DataError> {
    let resp: ChartResponse = serde_json::from_str(body)
        .map_err(|e| DataError::Malformed(format!("failed to parse response for {ticker}: {e}")))?;

    let result = match (resp.chart.result, resp.chart.error) {
        (Some(result), _) => result,
        (None, Some(err)) if err.code == "Not Found" => {
            return Err(DataError::NotFound {
                ticker: ticker.to_string(),
            });
        }
        (None, Some(err)) => {
            return Err(DataError::Malformed(format!("{}: {}", err.code, err.description)));
        }
        (None, None) => return Err(DataError::Malformed("empty result with no error".into())),
    };

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| DataError::Malformed("result array is empty".into()))?;
    let timestamps = data
        .timestamp
        .ok_or_else(|| DataError::NotFound {
            ticker: ticker.to_string(),
        })?;
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::Malformed("no quote data".into()))?;

    let mut bars: Vec<PriceBar> = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.naive_utc().date())
            .ok_or_else(|| DataError::Malformed(format!("invalid timestamp: {ts}")))?;

        let at = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
        // holidays and partial rows come back with nulls
        let (Some(open), Some(high), Some(low), Some(close)) =
            (at(&quote.open), at(&quote.high), at(&quote.low), at(&quote.close))
        else {
            log::debug!("{ticker}: skipping incomplete bar on {date}");
            continue;
        };

        // intraday refresh can repeat the last session's date
        if bars.last().is_some_and(|b| b.date >= date) {
            bars.pop();
        }
        bars.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    if bars.is_empty() {
        return Err(DataError::NotFound {
            ticker: ticker.to_string(),
        });
    }
    Ok(bars)
}

impl PriceHistory for YahooAdapter {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn fetch(&self, ticker: &str, window: HistoryWindow) -> Result<Vec<PriceBar>, DataError> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(window.calendar_days());
        let url = Self::chart_url(ticker, start, end);

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::Network(format!("request for {ticker} failed: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::NotFound {
                ticker: ticker.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::Network(format!("HTTP {status} for {ticker}")));
        }

        let body = resp
            .text()
            .map_err(|e| DataError::Network(format!("failed to read body for {ticker}: {e}")))?;
        let mut bars = parse_chart(ticker, &body)?;

        let keep = window.trading_days();
        if bars.len() > keep {
            bars.drain(..bars.len() - keep);
        }
        Ok(bars)
    }
}
