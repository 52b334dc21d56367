//! Risk-based position sizing: shares = floor(risk / risk_per_share).

use crate::domain::error::StopError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizingRow {
    pub risk_amount: f64,
    pub shares: u64,
    pub position_value: f64,
}

/// Sizing outcome carried on a recommendation. Unavailable when the
/// position is already through its stop; the rest of the recommendation
/// is still valid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SizingTable {
    Rows { rows: Vec<SizingRow> },
    Unavailable { reason: String },
}

impl SizingTable {
    pub fn rows(&self) -> &[SizingRow] {
        match self {
            SizingTable::Rows { rows } => rows,
            SizingTable::Unavailable { .. } => &[],
        }
    }

    pub fn shares_for(&self, risk_amount: f64) -> Option<u64> {
        self.rows()
            .iter()
            .find(|r| r.risk_amount == risk_amount)
            .map(|r| r.shares)
    }
}

pub fn shares_for_risk(risk_amount: f64, risk_per_share: f64) -> Result<u64, StopError> {
    if risk_per_share <= 0.0 || !risk_per_share.is_finite() {
        return Err(StopError::InvalidRisk { risk_per_share });
    }
    if risk_amount < 0.0 || !risk_amount.is_finite() {
        return Err(StopError::invalid_config(
            "risk amount",
            format!("{risk_amount} must be a non-negative amount"),
        ));
    }
    let mut shares = (risk_amount / risk_per_share).floor();
    // guard against the quotient rounding up across an integer
    if shares * risk_per_share > risk_amount {
        shares -= 1.0;
    }
    Ok(shares as u64)
}

pub fn sizing_table(
    risk_amounts: &[f64],
    risk_per_share: f64,
    current_price: f64,
) -> Result<Vec<SizingRow>, StopError> {
    risk_amounts
        .iter()
        .map(|&risk_amount| {
            let shares = shares_for_risk(risk_amount, risk_per_share)?;
            Ok(SizingRow {
                risk_amount,
                shares,
                position_value: shares as f64 * current_price,
            })
        })
        .collect()
}
