//! Port traits: the seams between the pipeline and its collaborators.

pub mod config_port;
pub mod ledger_port;
pub mod rate_port;
