//! Data fetching and caching
//!
//! Handles:
//! - The provider contract consumed by the scanner
//! - Yahoo Finance (live) and JSON snapshots (offline)
//! - Per-run lookup caching and request pacing

pub mod cache;
pub mod provider;
pub mod rate_limit;
pub mod snapshot;
pub mod yahoo;

pub use cache::*;
pub use provider::*;
pub use rate_limit::*;
pub use snapshot::*;
pub use yahoo::*;
