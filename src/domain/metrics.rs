//! Return series and risk/performance ratios.
//!
//! All statistics use population variance (divide by `N`).

use serde::Serialize;

use super::currency::Conversion;
use super::equity::{last_equity, EquityPoint};
use super::trade::Trade;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub profit_factor: f64,
    pub hit_ratio: f64,
    pub total_pnl: f64,
    pub last_equity: f64,
    pub trade_count: usize,
}

impl DerivedMetrics {
    pub fn compute(
        curve: &[EquityPoint],
        trades: &[Trade],
        conversion: Conversion<'_>,
        risk_free_annual: f64,
    ) -> Self {
        let returns = daily_returns(curve);

        DerivedMetrics {
            sharpe: sharpe(&returns, risk_free_annual),
            sortino: sortino(&returns, risk_free_annual),
            max_drawdown: max_drawdown(curve),
            profit_factor: profit_factor(trades),
            hit_ratio: hit_ratio(trades),
            total_pnl: trades.iter().map(|t| conversion.pnl(t)).sum(),
            last_equity: last_equity(curve),
            trade_count: trades.len(),
        }
    }
}

/// Simple day-over-day returns; a zero prior equity yields a `0` return.
pub fn daily_returns(curve: &[EquityPoint]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            let curr = w[1].equity;
            if prev == 0.0 {
                0.0
            } else {
                (curr - prev) / prev
            }
        })
        .collect()
}

/// Relative distance below the running peak, one value per point, all `<= 0`.
pub fn drawdown_series(curve: &[EquityPoint]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    curve
        .iter()
        .map(|point| {
            if point.equity > peak {
                peak = point.equity;
            }
            if peak > 0.0 {
                (point.equity - peak) / peak
            } else {
                0.0
            }
        })
        .collect()
}

/// Deepest drawdown as a negative fraction; `0` for an empty curve.
pub fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    drawdown_series(curve).into_iter().fold(0.0, f64::min)
}

/// Daily excess return over annualized volatility.
pub fn sharpe(returns: &[f64], risk_free_annual: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let n = returns.len() as f64;
    let avg = mean(returns);
    let excess = avg - risk_free_annual / TRADING_DAYS_PER_YEAR;
    let variance = returns.iter().map(|r| (r - avg).powi(2)).sum::<f64>() / n;
    let annual_vol = (variance * TRADING_DAYS_PER_YEAR).sqrt();

    if annual_vol == 0.0 {
        0.0
    } else {
        excess / annual_vol
    }
}

/// Like [`sharpe`] but the denominator only sees negative returns.
pub fn sortino(returns: &[f64], risk_free_annual: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let excess = mean(returns) - risk_free_annual / TRADING_DAYS_PER_YEAR;

    let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    let down_count = downside.len().max(1) as f64;
    let down_variance = downside.iter().map(|r| r * r).sum::<f64>() / down_count;
    let down_dev = (down_variance * TRADING_DAYS_PER_YEAR).sqrt();

    if down_dev == 0.0 {
        0.0
    } else {
        excess / down_dev
    }
}

/// Gross wins over gross losses.
///
/// An empty trade set is `0`. A non-empty set without losses is `+inf`.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }

    let (wins, losses) = trades.iter().fold((0.0_f64, 0.0_f64), |(w, l), t| {
        if t.pnl > 0.0 {
            (w + t.pnl, l)
        } else if t.pnl < 0.0 {
            (w, l + t.pnl.abs())
        } else {
            (w, l)
        }
    });

    if losses == 0.0 {
        f64::INFINITY
    } else {
        wins / losses
    }
}

/// Share of trades with positive PnL; `0` when empty.
pub fn hit_ratio(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let won = trades.iter().filter(|t| t.pnl > 0.0).count();
    won as f64 / trades.len() as f64
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
