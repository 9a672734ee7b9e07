//! Categorical aggregation of filtered trades.
//!
//! Every mode sums PnL converted into the reporting currency.

use chrono::Timelike;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::currency::Conversion;
use super::trade::{in_month, Trade};

pub const DEFAULT_HISTOGRAM_BINS: usize = 12;
pub const LEADERBOARD_SIZE: usize = 5;

/// One named entry of a split (share in `[0, 1]`) or a leaderboard (signed PnL).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopFlop {
    pub top: Vec<CategoryValue>,
    pub flop: Vec<CategoryValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourBucket {
    pub hour: String,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub label: String,
    pub lower: f64,
    pub count: usize,
}

/// Categorical key used for splits and leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Symbol,
    Strategy,
    Broker,
    Account,
}

impl GroupKey {
    pub fn of<'t>(&self, trade: &'t Trade) -> &'t str {
        match self {
            GroupKey::Symbol => &trade.symbol,
            GroupKey::Strategy => &trade.strategy,
            GroupKey::Broker => &trade.broker,
            GroupKey::Account => &trade.account,
        }
    }
}

/// Sums `value_fn` of the converted PnL per `key_fn`.
pub fn group_sum<K, V>(
    trades: &[Trade],
    conversion: Conversion<'_>,
    key_fn: K,
    value_fn: V,
) -> BTreeMap<String, f64>
where
    K: Fn(&Trade) -> String,
    V: Fn(f64) -> f64,
{
    let mut groups = BTreeMap::new();
    for trade in trades {
        *groups.entry(key_fn(trade)).or_insert(0.0) += value_fn(conversion.pnl(trade));
    }
    groups
}

/// Share of absolute converted PnL per group, largest first, with groups below
/// `min_share_percent` merged into a trailing "Other" entry.
pub fn proportional_split(
    trades: &[Trade],
    conversion: Conversion<'_>,
    key: GroupKey,
    min_share_percent: f64,
) -> Vec<CategoryValue> {
    let groups = group_sum(trades, conversion, |t| key.of(t).to_string(), f64::abs);
    let total: f64 = groups.values().sum();
    let grand_total = if total > 0.0 { total } else { 1.0 };
    let threshold = min_share_percent / 100.0;

    let mut kept = Vec::new();
    let mut other = 0.0;
    for (name, total) in groups {
        let share = total / grand_total;
        if share >= threshold {
            kept.push(CategoryValue { name, value: share });
        } else {
            other += share;
        }
    }

    sort_descending(&mut kept);
    if other > 0.0 {
        kept.push(CategoryValue {
            name: format!("Other (< {min_share_percent}%)"),
            value: other,
        });
    }
    kept
}

/// Best and worst groups by signed converted PnL within `month` (`YYYY-MM`).
pub fn top_flop(
    trades: &[Trade],
    conversion: Conversion<'_>,
    key: GroupKey,
    month: &str,
) -> TopFlop {
    let in_scope: Vec<Trade> = trades
        .iter()
        .filter(|t| in_month(t.date, month))
        .cloned()
        .collect();
    let groups = group_sum(&in_scope, conversion, |t| key.of(t).to_string(), |v| v);

    let mut ranked: Vec<CategoryValue> = groups
        .into_iter()
        .map(|(name, value)| CategoryValue { name, value })
        .collect();
    sort_descending(&mut ranked);

    let top = ranked.iter().take(LEADERBOARD_SIZE).cloned().collect();
    let flop = ranked.iter().rev().take(LEADERBOARD_SIZE).cloned().collect();
    TopFlop { top, flop }
}

/// Converted PnL per open-timestamp hour (UTC); always 24 slots in order.
pub fn hourly_pnl(trades: &[Trade], conversion: Conversion<'_>) -> Vec<HourBucket> {
    let mut slots = [0.0_f64; 24];
    for trade in trades {
        let hour = trade.open_timestamp.map(|ts| ts.hour()).unwrap_or(0) as usize;
        slots[hour] += conversion.pnl(trade);
    }

    slots
        .iter()
        .enumerate()
        .map(|(hour, &pnl)| HourBucket {
            hour: format!("{hour:02}:00"),
            pnl,
        })
        .collect()
}

/// Equal-width histogram of converted PnL with `bins` buckets (at least one).
pub fn pnl_histogram(
    trades: &[Trade],
    conversion: Conversion<'_>,
    bins: usize,
) -> Vec<HistogramBucket> {
    let bins = bins.max(1);
    let values: Vec<f64> = trades.iter().map(|t| conversion.pnl(t)).collect();

    let (min, max) = if values.is_empty() {
        (0.0, 0.0)
    } else {
        values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    };
    let step = if max == min {
        1.0
    } else {
        (max - min) / bins as f64
    };

    let precision = label_precision(step);
    let mut counts = vec![0usize; bins];
    for v in values {
        let raw = ((v - min) / step).floor();
        let index = if raw.is_nan() || raw < 0.0 {
            0
        } else {
            (raw as usize).min(bins - 1)
        };
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = min + step * i as f64;
            HistogramBucket {
                label: format!("{lower:.precision$}"),
                lower,
                count,
            }
        })
        .collect()
}

/// Decimal places that keep neighbouring bucket edges distinct.
fn label_precision(step: f64) -> usize {
    if step >= 1.0 {
        0
    } else {
        ((-step.log10()).ceil() as usize + 1).min(12)
    }
}

fn sort_descending(values: &mut [CategoryValue]) {
    values.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::currency::RateTable;
    use crate::domain::trade::Side;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn make_trade(symbol: &str, date: &str, pnl: f64) -> Trade {
        Trade {
            id: format!("{symbol}-{date}-{pnl}"),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open_timestamp: None,
            side: Side::Sell,
            account: "main".into(),
            symbol: symbol.into(),
            broker: "IBKR".into(),
            strategy: format!("strat-{symbol}"),
            quantity: 1.0,
            price: 10.0,
            fee: 0.0,
            pnl,
            currency: "USD".into(),
            notes: None,
        }
    }

    fn usd() -> Conversion<'static> {
        Conversion::identity("USD")
    }

    fn names(values: &[CategoryValue]) -> Vec<&str> {
        values.iter().map(|v| v.name.as_str()).collect()
    }

    #[test]
    fn group_sum_converts_before_summing() {
        let mut quotes = BTreeMap::new();
        quotes.insert("EUR".to_string(), 0.5);
        let table = RateTable::from_base_quotes("USD", &quotes);

        let mut eur = make_trade("A", "2024-01-02", 10.0);
        eur.currency = "EUR".into();
        let trades = vec![eur, make_trade("A", "2024-01-03", 5.0)];

        let groups = group_sum(
            &trades,
            Conversion::new(Some(&table), "USD"),
            |t| t.symbol.clone(),
            |v| v,
        );
        assert_relative_eq!(groups["A"], 25.0);
    }

    #[test]
    fn split_keeps_groups_at_threshold() {
        let trades = vec![
            make_trade("A", "2024-01-02", 80.0),
            make_trade("B", "2024-01-02", -20.0),
        ];
        let split = proportional_split(&trades, usd(), GroupKey::Symbol, 20.0);
        assert_eq!(names(&split), vec!["A", "B"]);
        assert_relative_eq!(split[0].value, 0.8);
        assert_relative_eq!(split[1].value, 0.2);
    }

    #[test]
    fn split_collapses_long_tail() {
        let trades = vec![
            make_trade("A", "2024-01-02", 80.0),
            make_trade("B", "2024-01-02", 20.0),
        ];
        let split = proportional_split(&trades, usd(), GroupKey::Symbol, 30.0);
        assert_eq!(names(&split), vec!["A", "Other (< 30%)"]);
        assert_relative_eq!(split[1].value, 0.2);
    }

    #[test]
    fn split_sums_to_one() {
        let trades = vec![
            make_trade("A", "2024-01-02", 50.0),
            make_trade("B", "2024-01-02", -30.0),
            make_trade("C", "2024-01-02", 15.0),
            make_trade("D", "2024-01-02", 5.0),
        ];
        let split = proportional_split(&trades, usd(), GroupKey::Symbol, 10.0);
        let total: f64 = split.iter().map(|v| v.value).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        assert_eq!(names(&split), vec!["A", "B", "C", "Other (< 10%)"]);
    }

    #[test]
    fn split_of_small_pnl_still_sums_to_one() {
        let trades = vec![
            make_trade("A", "2024-01-02", 0.3),
            make_trade("B", "2024-01-02", -0.2),
        ];
        let split = proportional_split(&trades, usd(), GroupKey::Symbol, 0.0);
        assert_relative_eq!(split[0].value, 0.6, epsilon = 1e-12);
        assert_relative_eq!(split[1].value, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn split_of_breakeven_trades_is_all_zero() {
        let trades = vec![make_trade("A", "2024-01-02", 0.0)];
        let split = proportional_split(&trades, usd(), GroupKey::Symbol, 0.0);
        assert_eq!(split.len(), 1);
        assert_eq!(split[0].value, 0.0);
    }

    #[test]
    fn split_by_strategy() {
        let trades = vec![make_trade("A", "2024-01-02", 10.0)];
        let split = proportional_split(&trades, usd(), GroupKey::Strategy, 5.0);
        assert_eq!(names(&split), vec!["strat-A"]);
    }

    #[test]
    fn split_empty_trades_is_empty() {
        assert!(proportional_split(&[], usd(), GroupKey::Symbol, 5.0).is_empty());
    }

    #[test]
    fn top_flop_restricts_to_month() {
        let trades = vec![
            make_trade("A", "2024-03-01", 100.0),
            make_trade("B", "2024-03-02", -40.0),
            make_trade("A", "2024-03-05", 20.0),
            make_trade("C", "2024-04-01", 1000.0),
        ];
        let board = top_flop(&trades, usd(), GroupKey::Symbol, "2024-03");
        assert_eq!(names(&board.top), vec!["A", "B"]);
        assert_relative_eq!(board.top[0].value, 120.0);
        assert_eq!(names(&board.flop), vec!["B", "A"]);
    }

    #[test]
    fn top_flop_limits_to_five() {
        let trades: Vec<Trade> = (0..8)
            .map(|i| make_trade(&format!("S{i}"), "2024-03-01", i as f64 * 10.0 - 30.0))
            .collect();
        let board = top_flop(&trades, usd(), GroupKey::Symbol, "2024-03");
        assert_eq!(board.top.len(), 5);
        assert_eq!(board.flop.len(), 5);
        assert_eq!(board.top[0].name, "S7");
        assert_eq!(board.flop[0].name, "S0");
        assert_relative_eq!(board.flop[0].value, -30.0);
    }

    #[test]
    fn hourly_always_has_24_slots() {
        let buckets = hourly_pnl(&[], usd());
        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets[0].hour, "00:00");
        assert_eq!(buckets[23].hour, "23:00");
        assert!(buckets.iter().all(|b| b.pnl == 0.0));
    }

    #[test]
    fn hourly_uses_open_timestamp_hour() {
        let mut opened = make_trade("A", "2024-01-02", 12.0);
        opened.open_timestamp = Some(Utc.with_ymd_and_hms(2024, 1, 1, 14, 30, 0).unwrap());
        let undated = make_trade("B", "2024-01-02", 3.0);

        let buckets = hourly_pnl(&[opened, undated], usd());
        assert_eq!(buckets[14].pnl, 12.0);
        assert_eq!(buckets[0].pnl, 3.0);
    }

    #[test]
    fn histogram_counts_sum_to_trade_count() {
        let trades: Vec<Trade> = [-50.0, -10.0, 0.0, 5.0, 20.0, 70.0]
            .iter()
            .map(|&p| make_trade("A", "2024-01-02", p))
            .collect();
        let buckets = pnl_histogram(&trades, usd(), 4);
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 6);
        assert_eq!(buckets[0].lower, -50.0);
        assert_eq!(buckets[0].label, "-50");
        assert_eq!(buckets[3].count, 1);
    }

    #[test]
    fn histogram_max_lands_in_last_bin() {
        let trades: Vec<Trade> = [0.0, 10.0]
            .iter()
            .map(|&p| make_trade("A", "2024-01-02", p))
            .collect();
        let buckets = pnl_histogram(&trades, usd(), DEFAULT_HISTOGRAM_BINS);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[DEFAULT_HISTOGRAM_BINS - 1].count, 1);
    }

    #[test]
    fn histogram_identical_values_use_unit_step() {
        let trades: Vec<Trade> = (0..3).map(|_| make_trade("A", "2024-01-02", 7.0)).collect();
        let buckets = pnl_histogram(&trades, usd(), 3);
        assert_eq!(buckets[0].count, 3);
        assert_eq!(buckets[1].lower, 8.0);
    }

    #[test]
    fn histogram_labels_stay_distinct_for_small_steps() {
        let trades: Vec<Trade> = [0.0, 1.0]
            .iter()
            .map(|&p| make_trade("A", "2024-01-02", p))
            .collect();
        let buckets = pnl_histogram(&trades, usd(), 4);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["0.00", "0.25", "0.50", "0.75"]);
    }

    #[test]
    fn histogram_empty_and_zero_bins() {
        let buckets = pnl_histogram(&[], usd(), 0);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 0);
    }
}
