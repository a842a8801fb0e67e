//! # Wheel Screener - Options Wheel Candidate Scanner
//!
//! Screens a universe of US equities for cash-secured puts and covered
//! calls worth selling, ranks the survivors with a composite score and
//! makes a GO / NO-GO call on the best stable name.
//!
//! ## Overview
//!
//! For every ticker the scanner fetches the price, daily history and the
//! nearest option expirations, then runs each quote through a fixed
//! sequence of gates:
//! - **Market**: two-sided quote, trading days to expiry inside the window
//! - **Model**: Black-Scholes delta and probability of profit, with
//!   moneyness fallbacks when inputs are missing
//! - **Returns**: cushion, return on capital, annualized yield, collateral
//! - **Liquidity**: spread, volume, open interest
//! - **Event risk**: earnings and ex-dividend dates inside the option's life
//! - **Stability**: beta, realized volatility, ATR%, market cap
//!
//! ## Key Components
//!
//! - **Data**: provider contract, Yahoo Finance client, JSON snapshots,
//!   per-run cache and request pacing
//! - **Models**: Black-Scholes delta/PoP, RSI, ADX, realized volatility
//! - **Screener**: filter pipeline, scoring, decision, scan orchestration
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wheel_screener::prelude::*;
//!
//! let provider = YahooClient::new().unwrap();
//! let scanner = Scanner::new(provider, WheelConfig::default()).unwrap();
//! let as_of = chrono::Local::now().date_naive();
//!
//! let report = scanner.scan(&default_universe(), as_of).unwrap();
//! for c in report.top(10) {
//!     println!("{} score {:.1}", c.contract_label(), c.composite_score);
//! }
//! println!("{}", report.verdict(scanner.config()));
//! ```
//!
//! ## What This Does NOT Do
//!
//! - Place orders or track positions
//! - Forecast prices or volatility
//! - Price American exercise (European Black-Scholes only)

pub mod core;
pub mod data;
pub mod models;
pub mod screener;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        Candidate, DividendInfo, LegType, OpportunityFlag, OptionChain, OptionQuote, OptionType,
        PriceBar, RiskFlag, RiskMetrics, ScreenerError, ScreenerResult, ValueSource,
    };

    // Data
    pub use crate::data::{
        MarketDataProvider, Paced, ProviderCache, RateLimit, SnapshotProvider, YahooClient,
    };

    // Models
    pub use crate::models::{norm_cdf, Technicals};

    // Screening
    pub use crate::screener::{
        decide, default_universe, evaluate, parse_tickers, rank, trading_days_to_expiry,
        FilterStats, Rejection, ScanReport, Scanner, ScreeningContext, Verdict, WheelConfig,
    };
}

// Re-export main types at crate root
pub use crate::core::{ScreenerError, ScreenerResult};
pub use crate::screener::{ScanReport, Scanner, WheelConfig};
