//! Currency conversion over an optional rate table.
//!
//! Conversion is advisory: a missing table or a missing pair passes the
//! amount through unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::trade::Trade;

/// Multiplicative factors keyed `from -> to -> factor`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    rates: BTreeMap<String, BTreeMap<String, f64>>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a directed pair. Non-positive or non-finite factors are ignored.
    pub fn insert(&mut self, from: &str, to: &str, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.rates
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), factor);
    }

    pub fn get(&self, from: &str, to: &str) -> Option<f64> {
        self.rates.get(from).and_then(|m| m.get(to)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.values().all(|m| m.is_empty())
    }

    /// Builds every directed pair among `base` and the quoted currencies from a
    /// quote of the form `{EUR: 0.92, CHF: 0.88}` (units of quote per one `base`).
    pub fn from_base_quotes(base: &str, quotes: &BTreeMap<String, f64>) -> Self {
        let mut table = RateTable::new();
        let mut legs: Vec<(&str, f64)> = vec![(base, 1.0)];
        legs.extend(
            quotes
                .iter()
                .filter(|(code, f)| code.as_str() != base && f.is_finite() && **f > 0.0)
                .map(|(code, f)| (code.as_str(), *f)),
        );

        for &(from, from_per_base) in &legs {
            for &(to, to_per_base) in &legs {
                if from != to {
                    table.insert(from, to, to_per_base / from_per_base);
                }
            }
        }
        table
    }
}

/// Converts `amount` from one currency to another.
pub fn convert(amount: f64, from: &str, to: &str, table: Option<&RateTable>) -> f64 {
    if from == to {
        return amount;
    }
    match table.and_then(|t| t.get(from, to)) {
        Some(factor) => amount * factor,
        None => amount,
    }
}

/// A reporting currency plus the rate table (if any) used to reach it.
#[derive(Debug, Clone, Copy)]
pub struct Conversion<'a> {
    pub table: Option<&'a RateTable>,
    pub target: &'a str,
}

impl<'a> Conversion<'a> {
    pub fn new(table: Option<&'a RateTable>, target: &'a str) -> Self {
        Self { table, target }
    }

    /// Identity conversion: every amount is reported as-is.
    pub fn identity(target: &'a str) -> Self {
        Self {
            table: None,
            target,
        }
    }

    pub fn amount(&self, amount: f64, from: &str) -> f64 {
        convert(amount, from, self.target, self.table)
    }

    /// Trade PnL in the reporting currency.
    pub fn pnl(&self, trade: &Trade) -> f64 {
        self.amount(trade.pnl, &trade.currency)
    }
}
