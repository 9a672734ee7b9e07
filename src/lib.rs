//! tradelens: trading performance analytics.
//!
//! Hexagonal architecture: the pure metrics and aggregation pipeline in
//! [`domain`], port traits in [`ports`], concrete collaborators in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
