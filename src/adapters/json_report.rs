//! JSON report for scripting.

use crate::domain::error::StopError;
use crate::domain::recommender::{BatchReport, StopRecommendation};
use crate::domain::stop_history::HistoryRow;
use crate::ports::report_port::ReportPort;
use serde::Serialize;

pub struct JsonReport;

#[derive(Serialize)]
struct FailureJson<'a> {
    index: usize,
    ticker: &'a str,
    error: String,
}

#[derive(Serialize)]
struct BatchJson<'a> {
    recommendations: &'a [StopRecommendation],
    failures: Vec<FailureJson<'a>>,
}

#[derive(Serialize)]
struct HistoryJson<'a> {
    ticker: &'a str,
    rows: &'a [HistoryRow],
}

fn to_json<T: Serialize>(value: &T) -> Result<String, StopError> {
    serde_json::to_string_pretty(value).map_err(|e| StopError::Io(e.into()))
}

impl ReportPort for JsonReport {
    fn render(&self, rec: &StopRecommendation) -> Result<String, StopError> {
        to_json(rec)
    }

    /// Always the full recommendation objects; `detailed` has no effect.
    fn render_batch(&self, report: &BatchReport, _detailed: bool) -> Result<String, StopError> {
        to_json(&BatchJson {
            recommendations: &report.recommendations,
            failures: report
                .failures
                .iter()
                .map(|f| FailureJson {
                    index: f.index,
                    ticker: &f.ticker,
                    error: f.error.to_string(),
                })
                .collect(),
        })
    }

    fn render_history(&self, ticker: &str, rows: &[HistoryRow]) -> Result<String, StopError> {
        to_json(&HistoryJson { ticker, rows })
    }
}
