//! Exchange-rate lookup and the key/value store backing its cache.

use crate::domain::error::TradelensError;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// External quote source: units of each symbol per one unit of `base`.
pub trait RateSource {
    fn fetch_quotes(
        &self,
        base: &str,
        symbols: &[&str],
    ) -> Result<BTreeMap<String, f64>, TradelensError>;
}

/// String store with per-entry expiry.
pub trait KeyValueStore {
    /// Value for `key` unless missing or expired at `now`.
    fn get(&self, key: &str, now: DateTime<Utc>) -> Option<String>;

    fn set(
        &mut self,
        key: &str,
        value: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(), TradelensError>;
}
