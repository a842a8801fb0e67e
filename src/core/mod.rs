//! Core data types for the wheel screener
//!
//! Defines fundamental types:
//! - OptionType / LegType: call or put, CSP or CC
//! - OptionQuote / OptionChain: bid/ask, volume, OI, optional delta and IV
//! - RiskMetrics, DividendInfo: per-ticker reference data
//! - Candidate: a quote that survived screening

pub mod candidate;
pub mod error;
pub mod metrics;
pub mod option;
pub mod quote;

pub use candidate::*;
pub use error::*;
pub use metrics::*;
pub use option::*;
pub use quote::*;
