//! Option quote data
//!
//! Market data for options and the underlying: quotes, chains and daily bars.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::option::OptionType;

/// Option market quote, immutable for the duration of a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    /// Underlying symbol
    pub ticker: String,
    /// Expiration date
    pub expiry: NaiveDate,
    /// Strike price
    pub strike: f64,
    /// Option type (Call/Put)
    pub option_type: OptionType,
    /// Bid price (0 when not quoted)
    #[serde(default)]
    pub bid: f64,
    /// Ask price (0 when not quoted)
    #[serde(default)]
    pub ask: f64,
    /// Last traded price
    #[serde(default)]
    pub last: f64,
    /// Trading volume
    #[serde(default)]
    pub volume: u64,
    /// Open interest
    #[serde(default)]
    pub open_interest: u64,
    /// Delta (if provided by the feed)
    #[serde(default)]
    pub delta: Option<f64>,
    /// Implied volatility (if provided by the feed)
    #[serde(default)]
    pub implied_vol: Option<f64>,
    /// Contract symbol (exchange-specific)
    #[serde(default)]
    pub contract_symbol: Option<String>,
}

impl OptionQuote {
    pub fn new(
        ticker: impl Into<String>,
        expiry: NaiveDate,
        strike: f64,
        option_type: OptionType,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            expiry,
            strike,
            option_type,
            bid: 0.0,
            ask: 0.0,
            last: 0.0,
            volume: 0,
            open_interest: 0,
            delta: None,
            implied_vol: None,
            contract_symbol: None,
        }
    }

    /// Mid price from bid/ask
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// Bid-ask spread
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    /// Relative spread (spread / mid), 1.0 when mid is not positive
    pub fn relative_spread(&self) -> f64 {
        let mid = self.mid();
        if mid > 0.0 {
            self.spread() / mid
        } else {
            1.0
        }
    }

    /// Both sides of the market are quoted
    pub fn has_market(&self) -> bool {
        self.bid > 0.0 && self.ask > 0.0
    }

    /// Quoted delta, treating an exact zero as absent
    pub fn quoted_delta(&self) -> Option<f64> {
        self.delta.filter(|d| d.is_finite() && *d != 0.0)
    }

    /// Quoted implied volatility, if positive
    pub fn quoted_iv(&self) -> Option<f64> {
        self.implied_vol.filter(|iv| iv.is_finite() && *iv > 0.0)
    }
}

/// Chain of quotes for a single expiry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionChain {
    /// Call quotes by strike
    #[serde(default)]
    pub calls: Vec<OptionQuote>,
    /// Put quotes by strike
    #[serde(default)]
    pub puts: Vec<OptionQuote>,
}

impl OptionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a call quote
    pub fn add_call(&mut self, quote: OptionQuote) {
        self.calls.push(quote);
        self.calls.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    }

    /// Add a put quote
    pub fn add_put(&mut self, quote: OptionQuote) {
        self.puts.push(quote);
        self.puts.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    }

    /// Rows of one kind
    pub fn side(&self, option_type: OptionType) -> &[OptionQuote] {
        match option_type {
            OptionType::Call => &self.calls,
            OptionType::Put => &self.puts,
        }
    }

    /// Total number of quotes
    pub fn len(&self) -> usize {
        self.calls.len() + self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }
}

/// Daily OHLCV bar of the underlying
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}
