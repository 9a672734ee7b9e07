//! Fetch-or-use-cache policy for the exchange-rate table.
//!
//! A fresh cache entry (younger than [`CACHE_TTL_HOURS`]) is reused; otherwise
//! the source is asked once. Any failure resolves to "no table", which makes
//! every conversion an identity.

use crate::domain::currency::RateTable;
use crate::domain::error::TradelensError;
use crate::ports::rate_port::{KeyValueStore, RateSource};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub const CACHE_TTL_HOURS: i64 = 24;
pub const BASE_CURRENCY: &str = "USD";
pub const QUOTE_CURRENCIES: &[&str] = &["EUR", "CHF"];

/// Cache key for the fixed currency triple.
pub fn cache_key() -> String {
    format!("fx:{}:{}", BASE_CURRENCY, QUOTE_CURRENCIES.join(","))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub at: DateTime<Utc>,
    pub rates: RateTable,
}

pub struct RateCache<S, R> {
    store: S,
    source: Option<R>,
}

impl<S: KeyValueStore, R: RateSource> RateCache<S, R> {
    /// `source` may be absent, in which case only cached tables are served.
    pub fn new(store: S, source: Option<R>) -> Self {
        Self { store, source }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current rate table, or `None` when neither cache nor source can supply one.
    pub fn rates(&mut self, now: DateTime<Utc>) -> Option<RateTable> {
        if let Some(entry) = self.cached(now) {
            debug!(at = %entry.at, "using cached rates");
            return Some(entry.rates);
        }

        let source = self.source.as_ref()?;
        match source.fetch_quotes(BASE_CURRENCY, QUOTE_CURRENCIES) {
            Ok(quotes) => {
                let rates = RateTable::from_base_quotes(BASE_CURRENCY, &quotes);
                if rates.is_empty() {
                    warn!("rate source returned no usable quotes, amounts stay unconverted");
                    return None;
                }
                info!(pairs = quotes.len(), "fetched exchange rates");
                if let Err(e) = self.remember(&rates, now) {
                    warn!("could not cache rates: {e}");
                }
                Some(rates)
            }
            Err(e) => {
                warn!("rate refresh failed, amounts stay unconverted: {e}");
                None
            }
        }
    }

    fn cached(&self, now: DateTime<Utc>) -> Option<CacheEntry> {
        let raw = self.store.get(&cache_key(), now)?;
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("ignoring unreadable rate cache entry: {e}");
                return None;
            }
        };
        (now - entry.at < Duration::hours(CACHE_TTL_HOURS)).then_some(entry)
    }

    fn remember(&mut self, rates: &RateTable, now: DateTime<Utc>) -> Result<(), TradelensError> {
        let entry = CacheEntry {
            at: now,
            rates: rates.clone(),
        };
        let raw = serde_json::to_string(&entry).map_err(|e| TradelensError::Cache {
            reason: e.to_string(),
        })?;
        self.store
            .set(&cache_key(), raw, now, Duration::hours(CACHE_TTL_HOURS))
    }
}

/// Source used when live rates are disabled; every fetch fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

impl RateSource for OfflineSource {
    fn fetch_quotes(
        &self,
        _base: &str,
        _symbols: &[&str],
    ) -> Result<BTreeMap<String, f64>, TradelensError> {
        Err(TradelensError::RateFetch {
            reason: "live rates are disabled".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredValue {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        self.entries
            .get(key)
            .filter(|v| now < v.expires_at)
            .map(|v| v.value.clone())
    }

    fn set(
        &mut self,
        key: &str,
        value: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(), TradelensError> {
        self.entries.insert(
            key.to_string(),
            StoredValue {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }
}

/// Store persisted as one JSON document on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> BTreeMap<String, StoredValue> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        self.read_all()
            .remove(key)
            .filter(|v| now < v.expires_at)
            .map(|v| v.value)
    }

    fn set(
        &mut self,
        key: &str,
        value: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(), TradelensError> {
        let mut entries = self.read_all();
        entries.retain(|_, v| now < v.expires_at);
        entries.insert(
            key.to_string(),
            StoredValue {
                value,
                expires_at: now + ttl,
            },
        );

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&entries).map_err(|e| TradelensError::Cache {
            reason: e.to_string(),
        })?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;

    struct CountingSource {
        calls: Cell<usize>,
        fail: bool,
    }

    impl CountingSource {
        fn ok() -> Self {
            Self {
                calls: Cell::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: Cell::new(0),
                fail: true,
            }
        }
    }

    impl RateSource for &CountingSource {
        fn fetch_quotes(
            &self,
            _base: &str,
            symbols: &[&str],
        ) -> Result<BTreeMap<String, f64>, TradelensError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(TradelensError::RateFetch {
                    reason: "offline".into(),
                });
            }
            Ok(symbols
                .iter()
                .map(|s| (s.to_string(), if *s == "EUR" { 0.5 } else { 0.8 }))
                .collect())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn fetches_once_then_serves_cache() {
        let source = CountingSource::ok();
        let mut cache = RateCache::new(MemoryStore::new(), Some(&source));

        let first = cache.rates(t0()).unwrap();
        let second = cache.rates(t0() + Duration::hours(23)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.get("USD", "EUR"), Some(0.5));
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn refetches_after_ttl() {
        let source = CountingSource::ok();
        let mut cache = RateCache::new(MemoryStore::new(), Some(&source));

        cache.rates(t0());
        cache.rates(t0() + Duration::hours(25));
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn failed_fetch_is_no_table() {
        let source = CountingSource::failing();
        let mut cache = RateCache::new(MemoryStore::new(), Some(&source));
        assert!(cache.rates(t0()).is_none());
        assert!(cache.store().get(&cache_key(), t0()).is_none());
    }

    #[test]
    fn without_source_only_cache_is_used() {
        let mut empty = RateCache::new(MemoryStore::new(), None::<OfflineSource>);
        assert!(empty.rates(t0()).is_none());

        let source = CountingSource::ok();
        let mut warm = RateCache::new(MemoryStore::new(), Some(&source));
        warm.rates(t0());
        let RateCache { store, .. } = warm;

        let mut offline = RateCache::new(store, Some(OfflineSource));
        assert!(offline.rates(t0() + Duration::hours(1)).is_some());
    }

    #[test]
    fn stale_entry_ignored_even_if_store_keeps_it() {
        let mut store = MemoryStore::new();
        let entry = CacheEntry {
            at: t0() - Duration::hours(30),
            rates: RateTable::new(),
        };
        store
            .set(
                &cache_key(),
                serde_json::to_string(&entry).unwrap(),
                t0(),
                Duration::hours(100),
            )
            .unwrap();

        let source = CountingSource::ok();
        let mut cache = RateCache::new(store, Some(&source));
        assert!(cache.rates(t0()).is_some());
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn memory_store_expires_entries() {
        let mut store = MemoryStore::new();
        store
            .set("k", "v".into(), t0(), Duration::hours(1))
            .unwrap();
        assert_eq!(store.get("k", t0()), Some("v".to_string()));
        assert_eq!(store.get("k", t0() + Duration::hours(2)), None);
    }

    #[test]
    fn file_store_persists_between_instances() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache").join("rates.json");

        let mut store = FileStore::new(path.clone());
        store
            .set("k", "v".into(), t0(), Duration::hours(24))
            .unwrap();

        let reopened = FileStore::new(path);
        assert_eq!(reopened.get("k", t0()), Some("v".to_string()));
        assert_eq!(reopened.get("k", t0() + Duration::hours(24)), None);
    }

    #[test]
    fn file_store_tolerates_corrupt_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rates.json");
        fs::write(&path, "not json").unwrap();

        let mut store = FileStore::new(path);
        assert_eq!(store.get("k", t0()), None);
        store
            .set("k", "v".into(), t0(), Duration::hours(1))
            .unwrap();
        assert_eq!(store.get("k", t0()), Some("v".to_string()));
    }
}
