//! Per-ticker reference data
//!
//! Risk statistics, dividend schedule and earnings calendar for an underlying.
//! Fetched once per ticker per scan and never mutated afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Risk statistics for an underlying
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Beta vs the broad market
    pub beta: f64,
    /// Market capitalization in dollars
    pub market_cap: f64,
    /// Annualized historical volatility (0.25 = 25%)
    pub hist_vol: f64,
    /// Average true range as percent of price (2.0 = 2%)
    pub atr_pct: f64,
}

impl RiskMetrics {
    /// Conservative stand-in when the provider has nothing: market beta,
    /// unknown cap, 30% vol, 2% daily range
    pub fn fallback() -> Self {
        Self {
            beta: 1.0,
            market_cap: 0.0,
            hist_vol: 0.30,
            atr_pct: 2.0,
        }
    }
}

impl Default for RiskMetrics {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Next ex-dividend date and per-share amount
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendInfo {
    pub ex_date: NaiveDate,
    pub amount: f64,
}

impl DividendInfo {
    /// Ex-date strictly after `from` and strictly before `expiry`
    pub fn falls_within(&self, from: NaiveDate, expiry: NaiveDate) -> bool {
        self.amount > 0.0 && from < self.ex_date && self.ex_date < expiry
    }
}
