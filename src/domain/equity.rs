//! Equity curve points.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Account net worth at the close of `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Equity of the last point, or `0` for an empty curve.
pub fn last_equity(curve: &[EquityPoint]) -> f64 {
    curve.last().map(|p| p.equity).unwrap_or(0.0)
}
