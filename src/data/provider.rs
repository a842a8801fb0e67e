//! Market data source contract
//!
//! Every lookup the scanner needs from the outside world. Implementations
//! must be shareable across worker threads.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::core::{DividendInfo, OptionChain, PriceBar, RiskMetrics, ScreenerResult};

/// External market data provider
pub trait MarketDataProvider: Send + Sync {
    /// Last traded price of the underlying
    fn current_price(&self, ticker: &str) -> ScreenerResult<f64>;

    /// Listed expirations, nearest first
    fn expirations(&self, ticker: &str) -> ScreenerResult<Vec<NaiveDate>>;

    /// Calls and puts for one expiry
    fn option_chain(&self, ticker: &str, expiry: NaiveDate) -> ScreenerResult<OptionChain>;

    /// Daily bars covering roughly the last `lookback_days` calendar days, oldest first
    fn price_history(&self, ticker: &str, lookback_days: u32) -> ScreenerResult<Vec<PriceBar>>;

    /// Next earnings report, if scheduled
    fn earnings_date(&self, ticker: &str) -> ScreenerResult<Option<NaiveDate>>;

    /// Next ex-dividend date and amount, if any
    fn dividend_info(&self, ticker: &str) -> ScreenerResult<Option<DividendInfo>>;

    /// Beta, market cap, realized volatility and ATR%
    fn risk_metrics(&self, ticker: &str) -> ScreenerResult<RiskMetrics>;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Arc<P> {
    fn current_price(&self, ticker: &str) -> ScreenerResult<f64> {
        (**self).current_price(ticker)
    }

    fn expirations(&self, ticker: &str) -> ScreenerResult<Vec<NaiveDate>> {
        (**self).expirations(ticker)
    }

    fn option_chain(&self, ticker: &str, expiry: NaiveDate) -> ScreenerResult<OptionChain> {
        (**self).option_chain(ticker, expiry)
    }

    fn price_history(&self, ticker: &str, lookback_days: u32) -> ScreenerResult<Vec<PriceBar>> {
        (**self).price_history(ticker, lookback_days)
    }

    fn earnings_date(&self, ticker: &str) -> ScreenerResult<Option<NaiveDate>> {
        (**self).earnings_date(ticker)
    }

    fn dividend_info(&self, ticker: &str) -> ScreenerResult<Option<DividendInfo>> {
        (**self).dividend_info(ticker)
    }

    fn risk_metrics(&self, ticker: &str) -> ScreenerResult<RiskMetrics> {
        (**self).risk_metrics(ticker)
    }
}
