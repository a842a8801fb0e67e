//! Quantitative models
//!
//! Implements:
//! - Black-Scholes delta and probability of finishing out of the money
//! - Technical indicators (RSI, ADX) and realized risk statistics

pub mod black_scholes;
pub mod indicators;

pub use black_scholes::*;
pub use indicators::*;
