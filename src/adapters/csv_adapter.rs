//! CSV ledger adapter and trade export.
//!
//! Reads `trades.csv` and `equity.csv` from a base directory. Export writes
//! every field quoted, columns in `Trade` declaration order.

use crate::domain::equity::EquityPoint;
use crate::domain::error::TradelensError;
use crate::domain::trade::Trade;
use crate::ports::ledger_port::LedgerPort;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TRADES_FILE: &str = "trades.csv";
pub const EQUITY_FILE: &str = "equity.csv";

/// Export header, matching the field order of [`Trade`].
pub const TRADE_COLUMNS: &[&str] = &[
    "id",
    "date",
    "open_timestamp",
    "side",
    "account",
    "symbol",
    "broker",
    "strategy",
    "quantity",
    "price",
    "fee",
    "pnl",
    "currency",
    "notes",
];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn read_records<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, TradelensError> {
        let path = self.base_path.join(file);
        let content = fs::read_to_string(&path).map_err(|e| TradelensError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut records = Vec::new();
        for (line, result) in rdr.deserialize().enumerate() {
            let record: T = result.map_err(|e| TradelensError::Data {
                reason: format!("{} row {}: {}", path.display(), line + 1, e),
            })?;
            records.push(record);
        }
        debug!(file = %path.display(), rows = records.len(), "loaded csv");
        Ok(records)
    }
}

impl LedgerPort for CsvAdapter {
    fn load_trades(&self) -> Result<Vec<Trade>, TradelensError> {
        self.read_records(TRADES_FILE)
    }

    fn load_equity(&self) -> Result<Vec<EquityPoint>, TradelensError> {
        let mut curve: Vec<EquityPoint> = self.read_records(EQUITY_FILE)?;
        if let Some(p) = curve.iter().find(|p| p.equity < 0.0 || p.equity.is_nan()) {
            return Err(TradelensError::Data {
                reason: format!("negative equity {} on {}", p.equity, p.date),
            });
        }
        curve.sort_by_key(|p| p.date);
        Ok(curve)
    }
}

/// Serializes trades as delimited text with a header row.
pub fn write_trades<W: Write>(trades: &[Trade], writer: W) -> Result<(), TradelensError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    wtr.write_record(TRADE_COLUMNS).map_err(export_error)?;
    for trade in trades {
        wtr.serialize(trade).map_err(export_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes an equity curve in the layout [`CsvAdapter`] reads.
pub fn write_equity<W: Write>(curve: &[EquityPoint], writer: W) -> Result<(), TradelensError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(["date", "equity"]).map_err(export_error)?;
    for point in curve {
        wtr.serialize(point).map_err(export_error)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_trades(trades: &[Trade], path: &Path) -> Result<(), TradelensError> {
    let file = fs::File::create(path)?;
    write_trades(trades, file)
}

/// Writes `trades.csv` and `equity.csv` into `dir`, creating it if needed.
pub fn write_ledger(
    dir: &Path,
    trades: &[Trade],
    curve: &[EquityPoint],
) -> Result<(), TradelensError> {
    fs::create_dir_all(dir)?;
    write_trades(trades, fs::File::create(dir.join(TRADES_FILE))?)?;
    write_equity(curve, fs::File::create(dir.join(EQUITY_FILE))?)
}

fn export_error(e: csv::Error) -> TradelensError {
    TradelensError::Export {
        reason: e.to_string(),
    }
}
