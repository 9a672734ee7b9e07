//! Trade and equity filtering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::equity::EquityPoint;
use super::trade::Trade;

/// User-selected criteria. `None` on a categorical field means ALL; `None` on a
/// bound means open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub account: Option<String>,
    pub broker: Option<String>,
    pub strategy: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub min_pnl: Option<f64>,
}

impl FilterCriteria {
    /// Criteria that retain everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        selects(self.account.as_deref(), &trade.account)
            && selects(self.broker.as_deref(), &trade.broker)
            && selects(self.strategy.as_deref(), &trade.strategy)
            && within(trade.date, self.date_from, self.date_to)
            && self.min_pnl.is_none_or(|min| trade.pnl >= min)
    }
}

/// Parses a categorical selector where `ALL` (or blank) selects everything.
pub fn parse_selector(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "ALL" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn selects(selector: Option<&str>, value: &str) -> bool {
    selector.is_none_or(|s| s == value)
}

fn within(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.is_none_or(|f| date >= f) && to.is_none_or(|t| date <= t)
}

/// Retains trades matching every criterion, preserving input order.
pub fn filter_trades(trades: &[Trade], criteria: &FilterCriteria) -> Vec<Trade> {
    trades
        .iter()
        .filter(|t| criteria.matches(t))
        .cloned()
        .collect()
}

/// Retains equity points within `[date_from, date_to]`, preserving input order.
pub fn filter_equity(
    curve: &[EquityPoint],
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
) -> Vec<EquityPoint> {
    curve
        .iter()
        .filter(|p| within(p.date, date_from, date_to))
        .cloned()
        .collect()
}
