//! Configuration validation.
//!
//! Validates every dashboard config field before a run.

use crate::domain::error::TradelensError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

pub const DATA_SOURCES: &[&str] = &["csv", "demo"];

pub fn validate_dashboard_config(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    validate_data_source(config)?;
    validate_filter_dates(config)?;
    validate_min_pnl(config)?;
    validate_reporting_currency(config)?;
    validate_min_share_percent(config)?;
    validate_histogram_bins(config)?;
    validate_risk_free_rate(config)?;
    validate_month(config)?;
    Ok(())
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let source = config
        .get_non_empty("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    if !DATA_SOURCES.contains(&source.as_str()) {
        return Err(TradelensError::invalid(
            "data",
            "source",
            format!("unknown source '{}', expected one of {:?}", source, DATA_SOURCES),
        ));
    }
    if source == "csv" && config.get_non_empty("data", "path").is_none() {
        return Err(TradelensError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        });
    }
    if let Some(capital) = parse_number::<f64>(config, "data", "initial_capital")? {
        if !capital.is_finite() || capital <= 0.0 {
            return Err(TradelensError::invalid(
                "data",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
    }
    parse_number::<u64>(config, "data", "seed")?;
    parse_number::<u32>(config, "data", "days")?;
    Ok(())
}

/// Parses `[section] key` when present; a value that does not parse is invalid.
pub fn parse_number<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, TradelensError> {
    match config.get_non_empty(section, key) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            TradelensError::invalid(section, key, format!("'{raw}' is not a valid {key}"))
        }),
    }
}

fn validate_filter_dates(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let from = parse_optional_date(config, "date_from")?;
    let to = parse_optional_date(config, "date_to")?;
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(TradelensError::invalid(
                "filter",
                "date_from",
                "date_from must not be after date_to",
            ));
        }
    }
    Ok(())
}

/// Reads an optional `YYYY-MM-DD` value from the `[filter]` section.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, TradelensError> {
    match config.get_non_empty("filter", key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                TradelensError::invalid(
                    "filter",
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
    }
}

/// Reads the optional `[filter] min_pnl` value.
pub fn parse_min_pnl(config: &dyn ConfigPort) -> Result<Option<f64>, TradelensError> {
    match config.get_non_empty("filter", "min_pnl") {
        None => Ok(None),
        Some(s) => match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(TradelensError::invalid(
                "filter",
                "min_pnl",
                "min_pnl must be a number",
            )),
        },
    }
}

fn validate_min_pnl(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    parse_min_pnl(config).map(|_| ())
}

fn validate_reporting_currency(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let Some(code) = config.get_non_empty("dashboard", "reporting_currency") else {
        return Ok(());
    };
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(TradelensError::invalid(
            "dashboard",
            "reporting_currency",
            "reporting_currency must be a 3-letter uppercase code",
        ));
    }
    Ok(())
}

fn validate_min_share_percent(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let value = parse_number::<f64>(config, "dashboard", "min_share_percent")?.unwrap_or(5.0);
    if !(0.0..=100.0).contains(&value) {
        return Err(TradelensError::invalid(
            "dashboard",
            "min_share_percent",
            "min_share_percent must be between 0 and 100",
        ));
    }
    Ok(())
}

fn validate_histogram_bins(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let value = parse_number::<i64>(config, "dashboard", "histogram_bins")?.unwrap_or(12);
    if value < 1 {
        return Err(TradelensError::invalid(
            "dashboard",
            "histogram_bins",
            "histogram_bins must be at least 1",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let value = parse_number::<f64>(config, "dashboard", "risk_free_rate")?.unwrap_or(0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(TradelensError::invalid(
            "dashboard",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_month(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    match config.get_non_empty("dashboard", "month") {
        Some(m) if !is_month(&m) => Err(TradelensError::invalid(
            "dashboard",
            "month",
            "month must be formatted YYYY-MM",
        )),
        _ => Ok(()),
    }
}

/// True for a `YYYY-MM` label with a valid month number.
pub fn is_month(value: &str) -> bool {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d").is_ok()
        && value.trim().len() == 7
}
