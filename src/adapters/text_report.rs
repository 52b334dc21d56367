//! Plain-text terminal report.
//!
//! Provides:
//! - A detail panel for one recommendation
//! - A summary table across a watchlist, followed by per-ticker failures
//! - A one-line quick summary
//! - A dated history table of ATR, regime and channel stops

use crate::domain::error::StopError;
use crate::domain::recommender::{BatchReport, StopRecommendation};
use crate::domain::sizing::SizingTable;
use crate::domain::stop_history::HistoryRow;
use crate::ports::report_port::ReportPort;

const PANEL_WIDTH: usize = 52;
const LABEL_WIDTH: usize = 20;

pub struct TextReport;

/// `$1,234.56`; negative values keep their sign in front.
pub fn money(value: f64) -> String {
    money_with(value, 2)
}

fn money_with(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && raw.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}${grouped}.{f}"),
        None => format!("{sign}${grouped}"),
    }
}

fn line(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("  {:<width$}{}\n", format!("{label}:"), value, width = LABEL_WIDTH));
}

pub fn format_panel(rec: &StopRecommendation) -> String {
    let mut out = String::new();
    let title = format!("── {} ", rec.ticker);
    let tail = format!(" as of {} ──", rec.as_of);
    let fill = PANEL_WIDTH.saturating_sub(title.chars().count() + tail.chars().count());
    out.push_str(&format!("{title}{}{tail}\n", "─".repeat(fill)));

    line(&mut out, "Current Price", &money(rec.current_price));
    line(&mut out, "Suggested Stop", &money(rec.suggested_stop));
    line(&mut out, "Stop Distance", &format!("{:.1}%", rec.distance_pct));
    if rec.under_water {
        out.push_str("  ! price is at or below the stop\n");
    }
    out.push('\n');

    if let (Some(entry), Some(initial)) = (rec.entry_price, rec.initial_stop) {
        line(&mut out, "Entry Price", &money(entry));
        line(&mut out, "Initial Stop", &money(initial));
        out.push('\n');
    }

    line(
        &mut out,
        &format!("ATR({})", rec.atr_period),
        &format!("{} ({})", money(rec.atr), rec.atr_method),
    );
    for (period, value) in &rec.atr_by_period {
        if *period != rec.atr_period {
            line(&mut out, &format!("ATR({period})"), &money(*value));
        }
    }
    out.push('\n');

    let mut mult = format!("{:.1}x ATR", rec.multiplier);
    if (rec.multiplier - rec.base_multiplier).abs() > f64::EPSILON {
        mult.push_str(&format!(" (base: {:.1}x)", rec.base_multiplier));
    }
    line(&mut out, "Multiplier", &mult);
    line(&mut out, "Vol Regime", &rec.regime.to_string().to_uppercase());
    line(&mut out, "  Percentile", &format!("{:.0}th", rec.percentile));
    line(&mut out, "  Z-Score", &format!("{:+.2}", rec.z_score));
    out.push('\n');

    line(
        &mut out,
        "Recent High",
        &format!("{} ({})", money(rec.recent_high), rec.recent_high_date),
    );
    line(&mut out, "Risk/Share", &money(rec.risk_per_share));
    out.push('\n');

    match &rec.sizing_table {
        SizingTable::Rows { rows } => {
            out.push_str("  Position Sizing:\n");
            for row in rows {
                out.push_str(&format!(
                    "    {} risk -> {} shares ({})\n",
                    money_with(row.risk_amount, 0),
                    group_int(row.shares),
                    money_with(row.position_value, 0)
                ));
            }
        }
        SizingTable::Unavailable { reason } => {
            out.push_str(&format!("  Position Sizing: unavailable ({reason})\n"));
        }
    }
    out
}

fn group_int(value: u64) -> String {
    // reuse the money grouping without the currency sign
    money_with(value as f64, 0).trim_start_matches('$').to_string()
}

pub fn format_summary_table(recs: &[StopRecommendation]) -> String {
    let mut out = String::new();
    let header = format!(
        "{:<8}{:>12}{:>12}{:>10}{:>10}{:>7}  {:<10}{:>10}",
        "Ticker", "Price", "Stop", "Distance", "ATR", "Mult", "Regime", "Risk/Sh"
    );
    out.push_str("Stop Loss Summary\n");
    out.push_str(&header);
    out.push('\n');
    out.push_str(&"-".repeat(header.len()));
    out.push('\n');

    for rec in recs {
        out.push_str(&format!(
            "{:<8}{:>12}{:>12}{:>10}{:>10}{:>7}  {:<10}{:>10}\n",
            rec.ticker,
            money(rec.current_price),
            money(rec.suggested_stop),
            format!("{:.1}%", rec.distance_pct),
            money(rec.atr),
            format!("{:.1}x", rec.multiplier),
            rec.regime.to_string().to_uppercase(),
            money(rec.risk_per_share),
        ));
    }
    out
}

/// `NVDA: $140.00 -> Stop $131.20 (6.3%) | ATR $3.52 x 2.5 | Vol: ELEVATED`
pub fn format_quick(rec: &StopRecommendation) -> String {
    format!(
        "{}: {} -> Stop {} ({:.1}%) | ATR {} x {:.1} | Vol: {}",
        rec.ticker,
        money(rec.current_price),
        money(rec.suggested_stop),
        rec.distance_pct,
        money(rec.atr),
        rec.multiplier,
        rec.regime.to_string().to_uppercase()
    )
}

pub fn format_history(ticker: &str, rows: &[HistoryRow]) -> String {
    let mut out = format!("{ticker} Volatility History\n");
    let header = format!(
        "{:<12}{:>12}{:>10}{:>8}  {:<10}{:>13}{:>12}",
        "Date", "Close", "ATR", "Pctl", "Regime", "Chandelier", "Keltner"
    );
    out.push_str(&header);
    out.push('\n');
    out.push_str(&"-".repeat(header.len()));
    out.push('\n');

    let level = |v: Option<f64>| v.map(money).unwrap_or_else(|| "-".to_string());
    for row in rows {
        out.push_str(&format!(
            "{:<12}{:>12}{:>10}{:>8}  {:<10}{:>13}{:>12}\n",
            row.date.to_string(),
            money(row.close),
            money(row.atr),
            format!("{:.0}", row.percentile),
            row.regime.to_string().to_uppercase(),
            level(row.chandelier),
            level(row.keltner),
        ));
    }
    out
}

impl ReportPort for TextReport {
    fn render(&self, rec: &StopRecommendation) -> Result<String, StopError> {
        Ok(format_panel(rec))
    }

    fn render_batch(&self, report: &BatchReport, detailed: bool) -> Result<String, StopError> {
        let mut out = String::new();
        if report.recommendations.is_empty() {
            out.push_str("No valid recommendations generated.\n");
        } else {
            out.push_str(&format_summary_table(&report.recommendations));
            if detailed {
                for rec in &report.recommendations {
                    out.push('\n');
                    out.push_str(&format_panel(rec));
                }
            }
        }

        if !report.failures.is_empty() {
            out.push('\n');
            for failure in &report.failures {
                out.push_str(&format!("error analyzing {}: {}\n", failure.ticker, failure.error));
            }
        }
        Ok(out)
    }

    fn render_history(&self, ticker: &str, rows: &[HistoryRow]) -> Result<String, StopError> {
        Ok(format_history(ticker, rows))
    }
}
