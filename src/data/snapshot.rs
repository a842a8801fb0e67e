//! Offline market snapshot
//!
//! A JSON document holding everything one scan needs per ticker, so runs can
//! be replayed without network access:
//!
//! ```json
//! {
//!   "tickers": {
//!     "KO": {
//!       "price": 62.0,
//!       "history": [{"date": "2025-05-01", "open": 61.0, "high": 62.0, "low": 60.5, "close": 61.8}],
//!       "expirations": [
//!         {"expiry": "2025-06-20",
//!          "puts": [{"strike": 60.0, "bid": 0.95, "ask": 1.05, "volume": 150, "open_interest": 900}],
//!          "calls": []}
//!       ],
//!       "earnings_date": "2025-07-22",
//!       "dividend": {"ex_date": "2025-06-13", "amount": 0.51},
//!       "risk": {"beta": 0.45, "market_cap": 2.6e11, "hist_vol": 0.15, "atr_pct": 1.3}
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::provider::MarketDataProvider;
use crate::core::{
    DividendInfo, OptionChain, OptionQuote, OptionType, PriceBar, RiskMetrics, ScreenerError,
    ScreenerResult,
};
use crate::models::{atr_percent, historical_volatility, DEFAULT_PERIOD};

/// One option row without the fields implied by its position in the snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub strike: f64,
    #[serde(default)]
    pub bid: f64,
    #[serde(default)]
    pub ask: f64,
    #[serde(default)]
    pub last: f64,
    #[serde(default)]
    pub volume: u64,
    #[serde(default)]
    pub open_interest: u64,
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub implied_vol: Option<f64>,
}

impl SnapshotRow {
    fn to_quote(&self, ticker: &str, expiry: NaiveDate, option_type: OptionType) -> OptionQuote {
        let mut quote = OptionQuote::new(ticker, expiry, self.strike, option_type);
        quote.bid = self.bid;
        quote.ask = self.ask;
        quote.last = self.last;
        quote.volume = self.volume;
        quote.open_interest = self.open_interest;
        quote.delta = self.delta;
        quote.implied_vol = self.implied_vol;
        quote
    }
}

/// Chain rows for one expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpirySnapshot {
    pub expiry: NaiveDate,
    #[serde(default)]
    pub calls: Vec<SnapshotRow>,
    #[serde(default)]
    pub puts: Vec<SnapshotRow>,
}

/// Everything recorded for one ticker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub history: Vec<PriceBar>,
    #[serde(default)]
    pub expirations: Vec<ExpirySnapshot>,
    #[serde(default)]
    pub earnings_date: Option<NaiveDate>,
    #[serde(default)]
    pub dividend: Option<DividendInfo>,
    /// Derived from `history` when absent
    #[serde(default)]
    pub risk: Option<RiskMetrics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    tickers: BTreeMap<String, TickerSnapshot>,
}

/// In-memory provider backed by a snapshot
#[derive(Debug, Clone, Default)]
pub struct SnapshotProvider {
    tickers: BTreeMap<String, TickerSnapshot>,
}

impl SnapshotProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot document
    pub fn from_json(json: &str) -> ScreenerResult<Self> {
        let file: SnapshotFile = serde_json::from_str(json)
            .map_err(|e| ScreenerError::Serialization(format!("Invalid snapshot: {}", e)))?;
        Ok(Self {
            tickers: file.tickers,
        })
    }

    /// Load a snapshot from disk
    pub fn from_file(path: impl AsRef<Path>) -> ScreenerResult<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Write the snapshot back out as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> ScreenerResult<()> {
        let file = SnapshotFile {
            tickers: self.tickers.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| ScreenerError::Serialization(e.to_string()))?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn insert(&mut self, ticker: impl Into<String>, snapshot: TickerSnapshot) {
        self.tickers.insert(ticker.into(), snapshot);
    }

    /// Builder-style `insert`
    pub fn with_ticker(mut self, ticker: impl Into<String>, snapshot: TickerSnapshot) -> Self {
        self.insert(ticker, snapshot);
        self
    }

    /// Recorded tickers in sorted order
    pub fn tickers(&self) -> Vec<String> {
        self.tickers.keys().cloned().collect()
    }

    fn get(&self, ticker: &str) -> ScreenerResult<&TickerSnapshot> {
        self.tickers
            .get(ticker)
            .ok_or_else(|| ScreenerError::unavailable(ticker, "not in snapshot"))
    }
}

impl MarketDataProvider for SnapshotProvider {
    fn current_price(&self, ticker: &str) -> ScreenerResult<f64> {
        self.get(ticker)?
            .price
            .filter(|p| *p > 0.0)
            .ok_or_else(|| ScreenerError::unavailable(ticker, "no price"))
    }

    fn expirations(&self, ticker: &str) -> ScreenerResult<Vec<NaiveDate>> {
        let mut expiries: Vec<NaiveDate> =
            self.get(ticker)?.expirations.iter().map(|e| e.expiry).collect();
        expiries.sort();
        expiries.dedup();
        Ok(expiries)
    }

    fn option_chain(&self, ticker: &str, expiry: NaiveDate) -> ScreenerResult<OptionChain> {
        let snapshot = self
            .get(ticker)?
            .expirations
            .iter()
            .find(|e| e.expiry == expiry)
            .ok_or_else(|| ScreenerError::data(format!("{} has no chain for {}", ticker, expiry)))?;

        let mut chain = OptionChain::new();
        for row in &snapshot.calls {
            chain.add_call(row.to_quote(ticker, expiry, OptionType::Call));
        }
        for row in &snapshot.puts {
            chain.add_put(row.to_quote(ticker, expiry, OptionType::Put));
        }
        Ok(chain)
    }

    fn price_history(&self, ticker: &str, lookback_days: u32) -> ScreenerResult<Vec<PriceBar>> {
        let history = &self.get(ticker)?.history;
        let Some(last) = history.last() else {
            return Ok(Vec::new());
        };
        let cutoff = last
            .date
            .checked_sub_days(Days::new(u64::from(lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        Ok(history.iter().filter(|b| b.date > cutoff).copied().collect())
    }

    fn earnings_date(&self, ticker: &str) -> ScreenerResult<Option<NaiveDate>> {
        Ok(self.get(ticker)?.earnings_date)
    }

    fn dividend_info(&self, ticker: &str) -> ScreenerResult<Option<DividendInfo>> {
        Ok(self.get(ticker)?.dividend)
    }

    fn risk_metrics(&self, ticker: &str) -> ScreenerResult<RiskMetrics> {
        let snapshot = self.get(ticker)?;
        if let Some(risk) = snapshot.risk {
            return Ok(risk);
        }
        if snapshot.history.is_empty() {
            return Err(ScreenerError::missing(format!("{} risk metrics", ticker)));
        }

        let bars = self.price_history(ticker, 31)?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        Ok(RiskMetrics {
            hist_vol: historical_volatility(&closes),
            atr_pct: atr_percent(&bars, DEFAULT_PERIOD),
            ..RiskMetrics::fallback()
        })
    }
}
