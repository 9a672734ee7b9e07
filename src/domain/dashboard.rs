//! Full analytics pipeline: filter once, then derive every view from the
//! filtered ledger and curve.

use serde::Serialize;

use super::aggregate::{
    hourly_pnl, pnl_histogram, proportional_split, top_flop, CategoryValue, GroupKey,
    HistogramBucket, HourBucket, TopFlop, DEFAULT_HISTOGRAM_BINS,
};
use super::alerts::RiskAlerts;
use super::currency::{Conversion, RateTable};
use super::equity::{last_equity, EquityPoint};
use super::filter::{filter_equity, filter_trades, FilterCriteria};
use super::metrics::{daily_returns, drawdown_series, DerivedMetrics};
use super::trade::{month_of, Trade};

/// Inputs of a single dashboard evaluation besides the data itself.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRequest {
    pub criteria: FilterCriteria,
    pub reporting_currency: String,
    pub min_share_percent: f64,
    pub histogram_bins: usize,
    pub risk_free_rate: f64,
    pub month: Option<String>,
}

impl Default for DashboardRequest {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::all(),
            reporting_currency: "USD".to_string(),
            min_share_percent: 5.0,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            risk_free_rate: 0.0,
            month: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub reporting_currency: String,
    pub rates_applied: bool,
    pub month: Option<String>,
    pub metrics: DerivedMetrics,
    pub daily_returns: Vec<f64>,
    pub drawdown: Vec<f64>,
    pub asset_split: Vec<CategoryValue>,
    pub strategy_split: Vec<CategoryValue>,
    pub leaderboard: Option<TopFlop>,
    pub hourly: Vec<HourBucket>,
    pub histogram: Vec<HistogramBucket>,
    pub alerts: RiskAlerts,
    pub month_alerts: Option<RiskAlerts>,
    pub trades: Vec<Trade>,
}

impl Dashboard {
    pub fn build(
        trades: &[Trade],
        curve: &[EquityPoint],
        request: &DashboardRequest,
        rates: Option<&RateTable>,
    ) -> Self {
        let criteria = &request.criteria;
        let filtered = filter_trades(trades, criteria);
        let equity = filter_equity(curve, criteria.date_from, criteria.date_to);

        let conversion = Conversion::new(rates, &request.reporting_currency);
        let capital = last_equity(&equity);
        let month = request
            .month
            .clone()
            .or_else(|| default_month(&equity, &filtered));

        let leaderboard = month
            .as_deref()
            .map(|m| top_flop(&filtered, conversion, GroupKey::Symbol, m));
        let month_alerts = month
            .as_deref()
            .map(|m| RiskAlerts::evaluate(&filtered, capital, conversion, Some(m)));

        Dashboard {
            reporting_currency: request.reporting_currency.clone(),
            rates_applied: rates.is_some_and(|t| !t.is_empty()),
            metrics: DerivedMetrics::compute(
                &equity,
                &filtered,
                conversion,
                request.risk_free_rate,
            ),
            daily_returns: daily_returns(&equity),
            drawdown: drawdown_series(&equity),
            asset_split: proportional_split(
                &filtered,
                conversion,
                GroupKey::Symbol,
                request.min_share_percent,
            ),
            strategy_split: proportional_split(
                &filtered,
                conversion,
                GroupKey::Strategy,
                request.min_share_percent,
            ),
            leaderboard,
            hourly: hourly_pnl(&filtered, conversion),
            histogram: pnl_histogram(&filtered, conversion, request.histogram_bins),
            alerts: RiskAlerts::evaluate(&filtered, capital, conversion, None),
            month_alerts,
            month,
            trades: filtered,
        }
    }
}

/// Month of the latest equity point, else of the latest trade.
fn default_month(curve: &[EquityPoint], trades: &[Trade]) -> Option<String> {
    curve
        .last()
        .map(|p| p.date)
        .or_else(|| trades.iter().map(|t| t.date).max())
        .map(month_of)
}
