//! Capital-relative risk alerts on trades and synthetic positions.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::currency::Conversion;
use super::trade::{in_month, Trade};

pub const TRADE_ALERT_FRACTION: f64 = 0.01;
pub const POSITION_ALERT_FRACTION: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskThresholds {
    pub capital: f64,
    pub trade: f64,
    pub position: f64,
}

impl RiskThresholds {
    pub fn from_capital(capital: f64) -> Self {
        Self {
            capital,
            trade: TRADE_ALERT_FRACTION * capital,
            position: POSITION_ALERT_FRACTION * capital,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeAlert {
    pub id: String,
    pub symbol: String,
    pub pnl: f64,
    pub date: NaiveDate,
}

/// Converted PnL folded per `(symbol, strategy)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionAlert {
    pub symbol: String,
    pub strategy: String,
    pub pnl: f64,
    pub last_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAlerts {
    pub thresholds: RiskThresholds,
    pub trades: Vec<TradeAlert>,
    pub positions: Vec<PositionAlert>,
}

impl RiskAlerts {
    /// Evaluates both alert kinds; `month` only post-filters the results.
    pub fn evaluate(
        trades: &[Trade],
        capital: f64,
        conversion: Conversion<'_>,
        month: Option<&str>,
    ) -> Self {
        let thresholds = RiskThresholds::from_capital(capital);
        RiskAlerts {
            thresholds,
            trades: trade_alerts(trades, thresholds, conversion, month),
            positions: position_alerts(trades, thresholds, conversion, month),
        }
    }
}

pub fn trade_alerts(
    trades: &[Trade],
    thresholds: RiskThresholds,
    conversion: Conversion<'_>,
    month: Option<&str>,
) -> Vec<TradeAlert> {
    trades
        .iter()
        .filter_map(|t| {
            let pnl = conversion.pnl(t);
            (pnl.abs() > thresholds.trade).then(|| TradeAlert {
                id: t.id.clone(),
                symbol: t.symbol.clone(),
                pnl,
                date: t.date,
            })
        })
        .filter(|a| month.is_none_or(|m| in_month(a.date, m)))
        .collect()
}

pub fn position_alerts(
    trades: &[Trade],
    thresholds: RiskThresholds,
    conversion: Conversion<'_>,
    month: Option<&str>,
) -> Vec<PositionAlert> {
    let mut positions: BTreeMap<(&str, &str), (f64, NaiveDate)> = BTreeMap::new();
    for t in trades {
        let pnl = conversion.pnl(t);
        positions
            .entry((t.symbol.as_str(), t.strategy.as_str()))
            .and_modify(|(sum, last)| {
                *sum += pnl;
                if t.date > *last {
                    *last = t.date;
                }
            })
            .or_insert((pnl, t.date));
    }

    positions
        .into_iter()
        .filter(|(_, (pnl, _))| pnl.abs() > thresholds.position)
        .filter(|(_, (_, last))| month.is_none_or(|m| in_month(*last, m)))
        .map(|((symbol, strategy), (pnl, last_date))| PositionAlert {
            symbol: symbol.to_string(),
            strategy: strategy.to_string(),
            pnl,
            last_date,
        })
        .collect()
}
