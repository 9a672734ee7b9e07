//! Trade ledger records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

/// A single executed trade. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub date: NaiveDate,
    pub open_timestamp: Option<DateTime<Utc>>,
    pub side: Side,
    pub account: String,
    pub symbol: String,
    pub broker: String,
    pub strategy: String,
    pub quantity: f64,
    pub price: f64,
    pub fee: f64,
    pub pnl: f64,
    pub currency: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Calendar-month match by string prefix, e.g. `"2024-03"` matches `2024-03-17`.
pub fn in_month(date: NaiveDate, month: &str) -> bool {
    date.format("%Y-%m-%d").to_string().starts_with(month)
}

/// `YYYY-MM` label for a date.
pub fn month_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}
