#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;
use tradelens::domain::currency::RateTable;
use tradelens::domain::equity::EquityPoint;
use tradelens::domain::error::TradelensError;
pub use tradelens::domain::trade::{Side, Trade};
use tradelens::ports::ledger_port::LedgerPort;

pub struct MockLedgerPort {
    pub trades: Vec<Trade>,
    pub equity: Vec<EquityPoint>,
    pub error: Option<String>,
}

impl MockLedgerPort {
    pub fn new() -> Self {
        Self {
            trades: Vec::new(),
            equity: Vec::new(),
            error: None,
        }
    }

    pub fn with_trades(mut self, trades: Vec<Trade>) -> Self {
        self.trades = trades;
        self
    }

    pub fn with_equity(mut self, equity: Vec<EquityPoint>) -> Self {
        self.equity = equity;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl LedgerPort for MockLedgerPort {
    fn load_trades(&self) -> Result<Vec<Trade>, TradelensError> {
        match &self.error {
            Some(reason) => Err(TradelensError::Data {
                reason: reason.clone(),
            }),
            None => Ok(self.trades.clone()),
        }
    }

    fn load_equity(&self) -> Result<Vec<EquityPoint>, TradelensError> {
        Ok(self.equity.clone())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_trade(id: &str, day: &str, symbol: &str, pnl: f64) -> Trade {
    Trade {
        id: id.to_string(),
        date: date(day),
        open_timestamp: None,
        side: Side::Buy,
        account: "main".to_string(),
        symbol: symbol.to_string(),
        broker: "IBKR".to_string(),
        strategy: "breakout".to_string(),
        quantity: 10.0,
        price: 100.0,
        fee: 1.0,
        pnl,
        currency: "USD".to_string(),
        notes: None,
    }
}

pub fn opened_at(mut trade: Trade, hour: u32) -> Trade {
    let d = trade.date;
    trade.open_timestamp = d
        .and_hms_opt(hour, 15, 0)
        .map(|naive| Utc.from_utc_datetime(&naive));
    trade
}

pub fn in_currency(mut trade: Trade, currency: &str) -> Trade {
    trade.currency = currency.to_string();
    trade
}

pub fn make_curve(start: &str, values: &[f64]) -> Vec<EquityPoint> {
    let start = date(start);
    values
        .iter()
        .enumerate()
        .map(|(i, &equity)| EquityPoint {
            date: start + chrono::Duration::days(i as i64),
            equity,
        })
        .collect()
}

/// USD base with EUR at 0.5 and CHF at 0.8 per dollar.
pub fn sample_rates() -> RateTable {
    let mut quotes = BTreeMap::new();
    quotes.insert("EUR".to_string(), 0.5);
    quotes.insert("CHF".to_string(), 0.8);
    RateTable::from_base_quotes("USD", &quotes)
}
