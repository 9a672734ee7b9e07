//! Core domain types and the analytics pipeline.

pub mod aggregate;
pub mod alerts;
pub mod config_validation;
pub mod currency;
pub mod dashboard;
pub mod equity;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod trade;
