//! Analysis modules.
//!
//! Aggregation of per-agent outcomes into run-level status and statistics.

pub mod aggregator;

pub use aggregator::*;
