//! CLI definition and dispatch.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::{self, CsvAdapter};
use crate::adapters::demo_adapter::{DemoAdapter, DemoSettings};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::rate_cache::{FileStore, OfflineSource, RateCache};
use crate::domain::aggregate::DEFAULT_HISTOGRAM_BINS;
use crate::domain::config_validation::{
    is_month, parse_min_pnl, parse_optional_date, validate_dashboard_config,
};
use crate::domain::currency::RateTable;
use crate::domain::dashboard::{Dashboard, DashboardRequest};
use crate::domain::error::TradelensError;
use crate::domain::filter::{filter_trades, parse_selector, FilterCriteria};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;

pub const DEFAULT_RATE_CACHE: &str = ".tradelens/rates.json";

#[derive(Parser, Debug)]
#[command(name = "tradelens", about = "Trading performance analytics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the dashboard (metrics, breakdowns, alerts) as JSON
    Report {
        #[arg(short, long)]
        config: PathBuf,
        /// Month for leaderboards and month alerts (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export the filtered trades as CSV
    Export {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write a demo ledger (trades.csv, equity.csv) into a directory
    Demo {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 120)]
        days: u32,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Report {
            config,
            month,
            output,
        } => run_report(&config, month.as_deref(), output.as_ref()),
        Command::Export { config, output } => run_export(&config, &output),
        Command::Demo { output, seed, days } => run_demo(&output, seed, days),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &TradelensError) -> ExitCode {
    error!("{err}");
    err.into()
}

/// Loads and validates a config file.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TradelensError> {
    info!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_dashboard_config(&adapter)?;
    Ok(adapter)
}

pub fn build_filter_criteria(config: &dyn ConfigPort) -> Result<FilterCriteria, TradelensError> {
    let selector = |key: &str| {
        config
            .get_string("filter", key)
            .and_then(|v| parse_selector(&v))
    };
    Ok(FilterCriteria {
        account: selector("account"),
        broker: selector("broker"),
        strategy: selector("strategy"),
        date_from: parse_optional_date(config, "date_from")?,
        date_to: parse_optional_date(config, "date_to")?,
        min_pnl: parse_min_pnl(config)?,
    })
}

pub fn build_dashboard_request(
    config: &dyn ConfigPort,
    month_override: Option<&str>,
) -> Result<DashboardRequest, TradelensError> {
    let month = match month_override {
        Some(m) if !is_month(m) => {
            return Err(TradelensError::invalid(
                "dashboard",
                "month",
                format!("'{m}' is not formatted YYYY-MM"),
            ));
        }
        Some(m) => Some(m.trim().to_string()),
        None => config.get_non_empty("dashboard", "month"),
    };

    Ok(DashboardRequest {
        criteria: build_filter_criteria(config)?,
        reporting_currency: config
            .get_non_empty("dashboard", "reporting_currency")
            .unwrap_or_else(|| "USD".to_string()),
        min_share_percent: config.get_double("dashboard", "min_share_percent", 5.0),
        histogram_bins: config
            .get_int("dashboard", "histogram_bins", DEFAULT_HISTOGRAM_BINS as i64)
            .max(1) as usize,
        risk_free_rate: config.get_double("dashboard", "risk_free_rate", 0.0),
        month,
    })
}

pub fn build_demo_settings(config: &dyn ConfigPort) -> DemoSettings {
    let defaults = DemoSettings::default();
    DemoSettings {
        seed: config.get_int("data", "seed", defaults.seed as i64).max(0) as u64,
        start: config
            .get_string("data", "start")
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
            .unwrap_or(defaults.start),
        days: config.get_int("data", "days", defaults.days as i64).max(0) as u32,
        initial_capital: config.get_double("data", "initial_capital", defaults.initial_capital),
        ..defaults
    }
}

/// Ledger source named by `[data] source`.
pub fn build_ledger(config: &dyn ConfigPort) -> Result<Box<dyn LedgerPort>, TradelensError> {
    let source = config
        .get_non_empty("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.as_str() {
        "demo" => Ok(Box::new(DemoAdapter::new(build_demo_settings(config)))),
        "csv" => {
            let path = config
                .get_non_empty("data", "path")
                .ok_or_else(|| TradelensError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(path))))
        }
        other => Err(TradelensError::invalid(
            "data",
            "source",
            format!("unknown source '{other}'"),
        )),
    }
}

/// Rate table per `[rates]`; never fails, degrading to `None`.
pub fn resolve_rates(config: &dyn ConfigPort) -> Option<RateTable> {
    if !config.get_bool("rates", "enabled", true) {
        info!("currency conversion disabled");
        return None;
    }

    let cache_path = config
        .get_non_empty("rates", "cache_path")
        .unwrap_or_else(|| DEFAULT_RATE_CACHE.to_string());
    let store = FileStore::new(PathBuf::from(cache_path));
    let live = config.get_bool("rates", "live", false);

    #[cfg(feature = "live-rates")]
    if live {
        use crate::adapters::http_rate_adapter::{HttpRateAdapter, DEFAULT_RATES_URL};

        let url = config
            .get_non_empty("rates", "url")
            .unwrap_or_else(|| DEFAULT_RATES_URL.to_string());
        let source = match HttpRateAdapter::new(url) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("{e}");
                None
            }
        };
        return RateCache::new(store, source).rates(Utc::now());
    }

    #[cfg(not(feature = "live-rates"))]
    if live {
        warn!("live rates requested but the live-rates feature is not enabled");
    }

    RateCache::new(store, Some(OfflineSource)).rates(Utc::now())
}

fn run_report(config_path: &Path, month: Option<&str>, output: Option<&PathBuf>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let request = match build_dashboard_request(&config, month) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    let ledger = match build_ledger(&config) {
        Ok(l) => l,
        Err(e) => return fail(&e),
    };
    let rates = resolve_rates(&config);

    run_report_pipeline(ledger.as_ref(), &request, rates.as_ref(), output)
}

/// Loads the ledger, builds the dashboard, prints a summary and writes JSON.
pub fn run_report_pipeline(
    ledger: &dyn LedgerPort,
    request: &DashboardRequest,
    rates: Option<&RateTable>,
    output: Option<&PathBuf>,
) -> ExitCode {
    let (trades, equity) = match ledger.load_trades().and_then(|t| Ok((t, ledger.load_equity()?))) {
        Ok(data) => data,
        Err(e) => return fail(&e),
    };
    info!(
        trades = trades.len(),
        equity_points = equity.len(),
        "ledger loaded"
    );

    let dashboard = Dashboard::build(&trades, &equity, request, rates);
    print_summary(&dashboard);

    let json = match serde_json::to_string_pretty(&dashboard) {
        Ok(j) => j,
        Err(e) => {
            return fail(&TradelensError::Export {
                reason: e.to_string(),
            });
        }
    };

    match output {
        Some(path) => match fs::write(path, json) {
            Ok(()) => {
                info!("Dashboard written to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => fail(&TradelensError::from(e)),
        },
        None => {
            println!("{json}");
            ExitCode::SUCCESS
        }
    }
}

fn print_summary(dashboard: &Dashboard) {
    let m = &dashboard.metrics;
    let ccy = &dashboard.reporting_currency;
    eprintln!("\n=== Performance ===");
    eprintln!("Trades:           {}", m.trade_count);
    eprintln!("Total PnL:        {:.2} {}", m.total_pnl, ccy);
    eprintln!("Last Equity:      {:.2}", m.last_equity);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe);
    eprintln!("Sortino Ratio:    {:.2}", m.sortino);
    eprintln!("Max Drawdown:     {:.1}%", m.max_drawdown * 100.0);
    eprintln!("Profit Factor:    {:.2}", m.profit_factor);
    eprintln!("Hit Ratio:        {:.1}%", m.hit_ratio * 100.0);

    if !dashboard.asset_split.is_empty() {
        eprintln!("\n=== Asset Split ===");
        for entry in &dashboard.asset_split {
            eprintln!("  {:<20} {:>5.1}%", entry.name, entry.value * 100.0);
        }
    }

    eprintln!(
        "\nAlerts: {} trades, {} positions (threshold {:.2} / {:.2} {})",
        dashboard.alerts.trades.len(),
        dashboard.alerts.positions.len(),
        dashboard.alerts.thresholds.trade,
        dashboard.alerts.thresholds.position,
        ccy,
    );
    if !dashboard.rates_applied {
        eprintln!("Note: no exchange rates available, amounts are unconverted");
    }
}

fn run_export(config_path: &Path, output: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let result = build_filter_criteria(&config).and_then(|criteria| {
        let ledger = build_ledger(&config)?;
        let trades = filter_trades(&ledger.load_trades()?, &criteria);
        csv_adapter::export_trades(&trades, output)?;
        Ok(trades.len())
    });

    match result {
        Ok(count) => {
            info!("Exported {} trades to {}", count, output.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_demo(output: &Path, seed: u64, days: u32) -> ExitCode {
    let adapter = DemoAdapter::new(DemoSettings {
        seed,
        days,
        ..DemoSettings::default()
    });
    let result = adapter
        .load_trades()
        .and_then(|trades| Ok((trades, adapter.load_equity()?)))
        .and_then(|(trades, equity)| {
            csv_adapter::write_ledger(output, &trades, &equity)?;
            Ok(trades.len())
        });

    match result {
        Ok(count) => {
            info!("Wrote {} demo trades to {}", count, output.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    match build_dashboard_request(&config, None) {
        Ok(request) => {
            eprintln!("Config is valid");
            eprintln!("  reporting currency: {}", request.reporting_currency);
            eprintln!("  min share:          {}%", request.min_share_percent);
            eprintln!("  histogram bins:     {}", request.histogram_bins);
            eprintln!("  filter:             {:?}", request.criteria);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
