//! Privacy mode handling.
//!
//! This module maps a caller-declared privacy mode to a concrete backend
//! profile, enforcing availability and the single-hop fallback rule.

pub mod resolver;

pub use resolver::{BackendProfileResolver, ModeAvailability, Resolution};
