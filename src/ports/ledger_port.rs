//! Upstream producer of the trade ledger and equity curve.

use crate::domain::equity::EquityPoint;
use crate::domain::error::TradelensError;
use crate::domain::trade::Trade;

/// Any source of ledger data: files, a demo generator, or a live feed.
pub trait LedgerPort {
    /// Trades in ledger order.
    fn load_trades(&self) -> Result<Vec<Trade>, TradelensError>;

    /// Equity points ordered by date.
    fn load_equity(&self) -> Result<Vec<EquityPoint>, TradelensError>;
}
