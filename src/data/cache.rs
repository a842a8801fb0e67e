//! Per-run lookup cache
//!
//! Earnings dates, dividend schedules and risk metrics are fetched at most
//! once per ticker per scan. The cache is read-through and safe to share
//! between workers; a failed lookup is cached as its documented default so
//! the ticker is not retried within the same run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use dashmap::DashMap;
use tracing::warn;

use super::provider::MarketDataProvider;
use crate::core::{DividendInfo, RiskMetrics, ScreenerResult};

type Slot<T> = Arc<OnceLock<T>>;

/// Ticker-keyed memo of slow reference lookups, scoped to one scan
#[derive(Debug, Default)]
pub struct ProviderCache {
    earnings: DashMap<String, Slot<Option<NaiveDate>>>,
    dividends: DashMap<String, Slot<Option<DividendInfo>>>,
    risk: DashMap<String, Slot<RiskMetrics>>,
    fallbacks: AtomicUsize,
}

impl ProviderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next earnings date; None when unscheduled or the lookup failed
    pub fn earnings_date<P>(&self, provider: &P, ticker: &str) -> Option<NaiveDate>
    where
        P: MarketDataProvider + ?Sized,
    {
        self.read_through(&self.earnings, ticker, "earnings date", None, || {
            provider.earnings_date(ticker)
        })
    }

    /// Next dividend; None when there is none or the lookup failed
    pub fn dividend_info<P>(&self, provider: &P, ticker: &str) -> Option<DividendInfo>
    where
        P: MarketDataProvider + ?Sized,
    {
        self.read_through(&self.dividends, ticker, "dividend info", None, || {
            provider.dividend_info(ticker)
        })
    }

    /// Risk metrics; conservative defaults when the lookup failed
    pub fn risk_metrics<P>(&self, provider: &P, ticker: &str) -> RiskMetrics
    where
        P: MarketDataProvider + ?Sized,
    {
        self.read_through(&self.risk, ticker, "risk metrics", RiskMetrics::fallback(), || {
            provider.risk_metrics(ticker)
        })
    }

    /// Number of lookups that failed and were replaced by defaults
    pub fn fallback_count(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    /// Tickers with at least one cached lookup
    pub fn len(&self) -> usize {
        self.risk
            .len()
            .max(self.earnings.len())
            .max(self.dividends.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_through<T, F>(
        &self,
        map: &DashMap<String, Slot<T>>,
        ticker: &str,
        what: &str,
        default: T,
        fetch: F,
    ) -> T
    where
        T: Clone,
        F: FnOnce() -> ScreenerResult<T>,
    {
        // Shard lock is released before the fetch runs
        let slot = Arc::clone(&map.entry(ticker.to_string()).or_default());
        slot.get_or_init(|| match fetch() {
            Ok(value) => value,
            Err(e) => {
                warn!("{}: {} unavailable, using default: {}", ticker, what, e);
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                default
            }
        })
        .clone()
    }
}
