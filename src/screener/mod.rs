//! Wheel screening
//!
//! Components:
//! - Config: every threshold, loadable from TOML
//! - Calendar: trading days to expiry
//! - Pipeline: the per-quote filter gates and enrichment
//! - Scoring: batch-relative composite score and ranking
//! - Decision: GO / NO-GO on the best stable candidate
//! - Scanner: concurrent orchestration over a ticker universe

pub mod calendar;
pub mod config;
pub mod decision;
pub mod pipeline;
pub mod scanner;
pub mod scoring;
pub mod universe;

pub use calendar::*;
pub use config::*;
pub use decision::*;
pub use pipeline::*;
pub use scanner::*;
pub use scoring::*;
pub use universe::*;
