//! Report rendering port trait.

use crate::domain::error::StopError;
use crate::domain::recommender::{BatchReport, StopRecommendation};
use crate::domain::stop_history::HistoryRow;

/// Renders recommendations for the terminal or for other programs.
pub trait ReportPort {
    fn render(&self, rec: &StopRecommendation) -> Result<String, StopError>;

    /// With `detailed`, each recommendation is rendered in full after the
    /// overview.
    fn render_batch(&self, report: &BatchReport, detailed: bool) -> Result<String, StopError>;

    fn render_history(&self, ticker: &str, rows: &[HistoryRow]) -> Result<String, StopError>;
}
