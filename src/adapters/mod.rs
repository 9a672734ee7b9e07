//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod demo_adapter;
pub mod file_config_adapter;
#[cfg(feature = "live-rates")]
pub mod http_rate_adapter;
pub mod rate_cache;
