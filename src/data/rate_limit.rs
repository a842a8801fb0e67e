//! Client-side pacing of provider calls
//!
//! The external API is the shared resource, not the CPU: every worker goes
//! through the same limiter before touching the provider.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use parking_lot::Mutex;

use super::provider::MarketDataProvider;
use crate::core::{DividendInfo, OptionChain, PriceBar, RiskMetrics, ScreenerResult};

/// Blocks the caller until one more request may be sent
pub trait RateLimit: Send + Sync {
    fn acquire(&self);
}

/// No pacing at all (offline providers, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl RateLimit for Unlimited {
    fn acquire(&self) {}
}

/// Minimum interval between consecutive requests
#[derive(Debug)]
pub struct FixedDelay {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl FixedDelay {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl RateLimit for FixedDelay {
    fn acquire(&self) {
        // Slot reservation happens under the lock; the sleep does not.
        let wait = {
            let mut last = self.last.lock();
            let now = Instant::now();
            let slot = match *last {
                Some(prev) => (prev + self.interval).max(now),
                None => now,
            };
            *last = Some(slot);
            slot.saturating_duration_since(now)
        };
        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }
}

/// Token bucket: bursts up to `capacity`, refills at `refill_per_sec`
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            capacity,
            refill_per_sec: refill_per_sec.max(f64::MIN_POSITIVE),
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Tokens currently available (after refill)
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }
}

impl RateLimit for TokenBucket {
    fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock();
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.refill_per_sec)
            };
            // Wait outside the lock
            thread::sleep(wait);
        }
    }
}

/// Provider decorator that acquires from a shared limiter before each call
pub struct Paced<P> {
    inner: P,
    limiter: Arc<dyn RateLimit>,
}

impl<P: MarketDataProvider> Paced<P> {
    pub fn new(inner: P, limiter: Arc<dyn RateLimit>) -> Self {
        Self { inner, limiter }
    }
}

impl<P: MarketDataProvider> MarketDataProvider for Paced<P> {
    fn current_price(&self, ticker: &str) -> ScreenerResult<f64> {
        self.limiter.acquire();
        self.inner.current_price(ticker)
    }

    fn expirations(&self, ticker: &str) -> ScreenerResult<Vec<NaiveDate>> {
        self.limiter.acquire();
        self.inner.expirations(ticker)
    }

    fn option_chain(&self, ticker: &str, expiry: NaiveDate) -> ScreenerResult<OptionChain> {
        self.limiter.acquire();
        self.inner.option_chain(ticker, expiry)
    }

    fn price_history(&self, ticker: &str, lookback_days: u32) -> ScreenerResult<Vec<PriceBar>> {
        self.limiter.acquire();
        self.inner.price_history(ticker, lookback_days)
    }

    fn earnings_date(&self, ticker: &str) -> ScreenerResult<Option<NaiveDate>> {
        self.limiter.acquire();
        self.inner.earnings_date(ticker)
    }

    fn dividend_info(&self, ticker: &str) -> ScreenerResult<Option<DividendInfo>> {
        self.limiter.acquire();
        self.inner.dividend_info(ticker)
    }

    fn risk_metrics(&self, ticker: &str) -> ScreenerResult<RiskMetrics> {
        self.limiter.acquire();
        self.inner.risk_metrics(ticker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_token_bucket_burst_then_wait() {
        let bucket = TokenBucket::new(3, 50.0);
        let start = Instant::now();
        for _ in 0..3 {
            bucket.acquire();
        }
        assert!(start.elapsed() < Duration::from_millis(15));

        bucket.acquire();
        assert!(start.elapsed() >= Duration::from_millis(15));
        assert!(bucket.available() < 1.0);
    }

    #[test]
    fn test_fixed_delay_spacing() {
        let delay = FixedDelay::from_millis(20);
        let start = Instant::now();
        delay.acquire();
        delay.acquire();
        delay.acquire();
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_fixed_delay_shared_across_threads() {
        let delay = Arc::new(FixedDelay::from_millis(10));
        let start = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let d = Arc::clone(&delay);
                thread::spawn(move || d.acquire())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    struct Counting(AtomicUsize);

    impl RateLimit for Counting {
        fn acquire(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixed;

    impl MarketDataProvider for Fixed {
        fn current_price(&self, _: &str) -> ScreenerResult<f64> {
            Ok(42.0)
        }
        fn expirations(&self, _: &str) -> ScreenerResult<Vec<NaiveDate>> {
            Ok(Vec::new())
        }
        fn option_chain(&self, _: &str, _: NaiveDate) -> ScreenerResult<OptionChain> {
            Ok(OptionChain::new())
        }
        fn price_history(&self, _: &str, _: u32) -> ScreenerResult<Vec<PriceBar>> {
            Ok(Vec::new())
        }
        fn earnings_date(&self, _: &str) -> ScreenerResult<Option<NaiveDate>> {
            Ok(None)
        }
        fn dividend_info(&self, _: &str) -> ScreenerResult<Option<DividendInfo>> {
            Ok(None)
        }
        fn risk_metrics(&self, _: &str) -> ScreenerResult<RiskMetrics> {
            Ok(RiskMetrics::fallback())
        }
    }

    #[test]
    fn test_paced_acquires_per_call() {
        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        let paced = Paced::new(Fixed, counter.clone());

        assert_eq!(paced.current_price("KO").unwrap(), 42.0);
        paced.expirations("KO").unwrap();
        paced.risk_metrics("KO").unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 3);
    }
}
