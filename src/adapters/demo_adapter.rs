//! Seeded demo ledger.
//!
//! Produces a trade ledger and an equity curve consistent with it: each day's
//! equity is the previous close plus that day's PnL (in the trade currency,
//! unconverted), floored at zero.

use crate::domain::equity::EquityPoint;
use crate::domain::error::TradelensError;
use crate::domain::trade::{Side, Trade};
use crate::ports::ledger_port::LedgerPort;
use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const ACCOUNTS: &[&str] = &["main", "swing", "income"];
const BROKERS: &[&str] = &["IBKR", "Saxo", "Swissquote"];
const STRATEGIES: &[&str] = &["breakout", "mean-reversion", "momentum", "carry"];
const SYMBOLS: &[(&str, &str, f64)] = &[
    ("AAPL", "USD", 190.0),
    ("MSFT", "USD", 410.0),
    ("NVDA", "USD", 880.0),
    ("SAP", "EUR", 175.0),
    ("ASML", "EUR", 900.0),
    ("NESN", "CHF", 95.0),
    ("ROG", "CHF", 250.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct DemoSettings {
    pub seed: u64,
    pub start: NaiveDate,
    pub days: u32,
    pub initial_capital: f64,
    pub max_trades_per_day: u32,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            days: 120,
            initial_capital: 100_000.0,
            max_trades_per_day: 4,
        }
    }
}

pub struct DemoAdapter {
    trades: Vec<Trade>,
    equity: Vec<EquityPoint>,
}

impl DemoAdapter {
    pub fn new(settings: DemoSettings) -> Self {
        let (trades, equity) = generate(&settings);
        Self { trades, equity }
    }
}

impl LedgerPort for DemoAdapter {
    fn load_trades(&self) -> Result<Vec<Trade>, TradelensError> {
        Ok(self.trades.clone())
    }

    fn load_equity(&self) -> Result<Vec<EquityPoint>, TradelensError> {
        Ok(self.equity.clone())
    }
}

fn generate(settings: &DemoSettings) -> (Vec<Trade>, Vec<EquityPoint>) {
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut trades = Vec::new();
    let mut equity = Vec::new();
    let mut balance = settings.initial_capital.max(0.0);

    for offset in 0..settings.days {
        let date = settings.start + Duration::days(offset as i64);
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }

        let count = rng.gen_range(0..=settings.max_trades_per_day);
        let mut day_pnl = 0.0;
        for _ in 0..count {
            let trade = random_trade(&mut rng, date, trades.len() + 1, balance);
            day_pnl += trade.pnl;
            trades.push(trade);
        }

        balance = (balance + day_pnl).max(0.0);
        equity.push(EquityPoint {
            date,
            equity: round_cents(balance),
        });
    }

    (trades, equity)
}

fn random_trade(rng: &mut StdRng, date: NaiveDate, seq: usize, balance: f64) -> Trade {
    let &(symbol, currency, base_price) = SYMBOLS.choose(rng).unwrap_or(&SYMBOLS[0]);
    let account = ACCOUNTS.choose(rng).copied().unwrap_or(ACCOUNTS[0]);
    let broker = BROKERS.choose(rng).copied().unwrap_or(BROKERS[0]);
    let strategy = STRATEGIES.choose(rng).copied().unwrap_or(STRATEGIES[0]);

    let price = base_price * rng.gen_range(0.9..1.1);
    let quantity = rng.gen_range(1..=50) as f64;
    let fee = round_cents(quantity * price * 0.0005);
    // Skewed slightly positive; occasional outsized moves feed the risk alerts.
    let move_pct = if rng.gen_bool(0.05) {
        rng.gen_range(-0.3..0.3)
    } else {
        rng.gen_range(-0.025..0.03)
    };
    let pnl = round_cents((quantity * price * move_pct - fee).max(-balance));

    let (hour, minute) = (rng.gen_range(7..=21), rng.gen_range(0..60));
    let open_timestamp = date
        .and_hms_opt(hour, minute, 0)
        .map(|naive| Utc.from_utc_datetime(&naive));

    Trade {
        id: format!("T{:06}", seq),
        date,
        open_timestamp,
        side: if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell },
        account: account.to_string(),
        symbol: symbol.to_string(),
        broker: broker.to_string(),
        strategy: strategy.to_string(),
        quantity,
        price: round_cents(price),
        fee,
        pnl,
        currency: currency.to_string(),
        notes: None,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
