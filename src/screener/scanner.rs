//! Scan orchestrator
//!
//! Per ticker: price, expirations and history are fetched once, technicals
//! computed once, reference data read through the run's cache, then every
//! put/call row of the nearest expirations goes through the filter pipeline.
//! Tickers run on a bounded worker pool; all provider calls share one rate
//! limiter. Scoring waits for every worker to finish.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::config::{RateLimitConfig, WheelConfig};
use super::decision::{decide, Verdict};
use super::pipeline::{evaluate, FilterStats, ScreeningContext};
use super::scoring::rank;
use crate::core::{Candidate, OptionType, ScreenerError, ScreenerResult};
use crate::data::{
    FixedDelay, MarketDataProvider, Paced, ProviderCache, RateLimit, TokenBucket, Unlimited,
};
use crate::models::Technicals;

/// Ticker dropped from a scan and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: String,
}

/// Outcome of one scan run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub as_of: NaiveDate,
    pub tickers_scanned: usize,
    /// Scored, best first
    pub candidates: Vec<Candidate>,
    pub stats: FilterStats,
    pub skipped: Vec<SkippedTicker>,
}

impl ScanReport {
    /// Best `n` candidates
    pub fn top(&self, n: usize) -> &[Candidate] {
        &self.candidates[..n.min(self.candidates.len())]
    }

    pub fn stable_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.is_stable).count()
    }

    pub fn verdict(&self, config: &WheelConfig) -> Verdict {
        decide(
            &self.candidates,
            &config.go_no_go,
            config.stability.yield_ceiling,
        )
    }
}

/// Shared limiter described by the config
pub fn limiter_for(config: &RateLimitConfig) -> Arc<dyn RateLimit> {
    match *config {
        RateLimitConfig::Unlimited => Arc::new(Unlimited),
        RateLimitConfig::FixedDelay { millis } => Arc::new(FixedDelay::from_millis(millis)),
        RateLimitConfig::TokenBucket {
            capacity,
            per_second,
        } => Arc::new(TokenBucket::new(capacity, per_second)),
    }
}

/// Per-ticker result before aggregation
struct TickerScan {
    ticker: String,
    candidates: Vec<Candidate>,
    stats: FilterStats,
    outcome: ScreenerResult<()>,
}

/// Wheel screener over a market data provider
pub struct Scanner<P> {
    provider: Paced<P>,
    config: Arc<WheelConfig>,
}

impl<P: MarketDataProvider> Scanner<P> {
    /// Scanner pacing requests as the config describes
    pub fn new(provider: P, config: WheelConfig) -> ScreenerResult<Self> {
        let limiter = limiter_for(&config.scan.rate_limit);
        Self::with_limiter(provider, config, limiter)
    }

    /// Scanner sharing an externally owned limiter
    pub fn with_limiter(
        provider: P,
        config: WheelConfig,
        limiter: Arc<dyn RateLimit>,
    ) -> ScreenerResult<Self> {
        config.validate()?;
        Ok(Self {
            provider: Paced::new(provider, limiter),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    /// Screen `tickers` as of `as_of` and rank the survivors
    pub fn scan(&self, tickers: &[String], as_of: NaiveDate) -> ScreenerResult<ScanReport> {
        let scan = &self.config.scan;
        info!(
            "Scanning {} tickers as of {} ({} worker(s))",
            tickers.len(),
            as_of,
            scan.workers
        );

        let cache = ProviderCache::new();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(scan.workers)
            .build()
            .map_err(|e| ScreenerError::computation(format!("worker pool: {}", e)))?;

        // Collected in universe order regardless of completion order
        let results: Vec<TickerScan> = pool.install(|| {
            tickers
                .par_iter()
                .map(|ticker| self.scan_ticker(ticker, as_of, &cache))
                .collect()
        });

        let mut candidates = Vec::new();
        let mut stats = FilterStats::new();
        let mut skipped = Vec::new();
        // A skipped ticker contributes neither candidates nor counts
        for result in results {
            match result.outcome {
                Ok(()) => {
                    stats.merge(&result.stats);
                    candidates.extend(result.candidates);
                }
                Err(e) => {
                    if e.is_ticker_scoped() {
                        warn!("Skipping {}: {}", result.ticker, e);
                    } else {
                        error!("Skipping {} after unexpected failure: {}", result.ticker, e);
                    }
                    skipped.push(SkippedTicker {
                        ticker: result.ticker,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let candidates = rank(candidates, &self.config);

        info!(
            "Scan complete: {} evaluated, {} candidates, {} skipped, {} cached lookups fell back",
            stats.evaluated,
            candidates.len(),
            skipped.len(),
            cache.fallback_count()
        );

        Ok(ScanReport {
            as_of,
            tickers_scanned: tickers.len(),
            candidates,
            stats,
            skipped,
        })
    }

    fn scan_ticker(&self, ticker: &str, as_of: NaiveDate, cache: &ProviderCache) -> TickerScan {
        let mut candidates = Vec::new();
        let mut stats = FilterStats::new();
        let outcome = self.screen_ticker(ticker, as_of, cache, &mut candidates, &mut stats);
        TickerScan {
            ticker: ticker.to_string(),
            candidates,
            stats,
            outcome,
        }
    }

    fn screen_ticker(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        cache: &ProviderCache,
        candidates: &mut Vec<Candidate>,
        stats: &mut FilterStats,
    ) -> ScreenerResult<()> {
        let config = &*self.config;
        let provider = &self.provider;
        let deadline = Instant::now() + Duration::from_secs(config.scan.ticker_timeout_secs);
        let check_deadline = || -> ScreenerResult<()> {
            if Instant::now() > deadline {
                Err(ScreenerError::timeout(format!(
                    "{} exceeded {}s",
                    ticker, config.scan.ticker_timeout_secs
                )))
            } else {
                Ok(())
            }
        };

        let price = provider.current_price(ticker)?;
        check_deadline()?;

        let expirations: Vec<NaiveDate> = provider
            .expirations(ticker)?
            .into_iter()
            .filter(|e| *e > as_of)
            .take(config.scan.max_expirations)
            .collect();
        if expirations.is_empty() {
            return Err(ScreenerError::unavailable(ticker, "no option expirations"));
        }
        check_deadline()?;

        let technicals = match provider.price_history(ticker, config.scan.history_lookback_days) {
            Ok(bars) => Technicals::from_bars(&bars),
            Err(e) => {
                warn!("{}: price history unavailable, using neutral technicals: {}", ticker, e);
                Technicals::neutral()
            }
        };
        if technicals.is_fallback {
            debug!("{}: short history, RSI/ADX defaulted", ticker);
        }
        check_deadline()?;

        let ctx = ScreeningContext {
            as_of,
            underlying_price: price,
            technicals,
            risk: cache.risk_metrics(provider, ticker),
            dividend: cache.dividend_info(provider, ticker),
            earnings: cache.earnings_date(provider, ticker),
            high_volatility: config.is_high_volatility(ticker),
        };
        check_deadline()?;

        let legs: Vec<OptionType> = [
            (config.scan.scan_puts, OptionType::Put),
            (config.scan.scan_calls, OptionType::Call),
        ]
        .into_iter()
        .filter_map(|(enabled, kind)| enabled.then_some(kind))
        .collect();

        for expiry in &expirations {
            let chain = match provider.option_chain(ticker, *expiry) {
                Ok(chain) => chain,
                Err(e) => {
                    warn!("{}: chain for {} unavailable: {}", ticker, expiry, e);
                    continue;
                }
            };

            for kind in &legs {
                for quote in chain.side(*kind) {
                    let outcome = evaluate(quote, &ctx, config);
                    stats.record(&outcome);
                    match outcome {
                        Ok(candidate) => candidates.push(candidate),
                        Err(rejection) => debug!(
                            "{} {} {:.2} {}: {}",
                            ticker,
                            expiry,
                            quote.strike,
                            kind.label(),
                            rejection
                        ),
                    }
                }
            }
            check_deadline()?;
        }

        info!(
            "{}: ${:.2}, RSI {:.1}, ADX {:.1}, {} candidate(s) from {} expiration(s)",
            ticker,
            price,
            ctx.technicals.rsi,
            ctx.technicals.adx,
            candidates.len(),
            expirations.len()
        );
        Ok(())
    }
}
