//! Configuration for the screening pipeline
//!
//! Every threshold the gates, the scorer and the scanner consult. Sections
//! mirror the order gates are evaluated in; each has reference defaults and
//! any subset can be overridden from a JSON or TOML file.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{OptionType, ScreenerError, ScreenerResult};
use crate::models::DEFAULT_RISK_FREE_RATE;

/// Complete screening configuration, immutable for a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub dte: DteConfig,
    pub delta: DeltaConfig,
    pub returns: ReturnsConfig,
    pub liquidity: LiquidityConfig,
    pub probability: ProbabilityConfig,
    pub technical: TechnicalConfig,
    pub capital: CapitalConfig,
    pub stability: StabilityConfig,
    pub high_volatility: HighVolatilityConfig,
    pub earnings: EarningsConfig,
    pub scoring: ScoringConfig,
    pub go_no_go: GoNoGoConfig,
    pub scan: ScanConfig,
}

impl WheelConfig {
    /// Only stable underlyings survive
    pub fn stability_only() -> Self {
        Self {
            stability: StabilityConfig {
                strict_mode: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Drop every trade with an earnings report before expiry
    pub fn exclude_all_earnings() -> Self {
        Self {
            earnings: EarningsConfig {
                exclude_all: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Load from `.toml` or JSON (any other extension)
    pub fn from_file(path: impl AsRef<Path>) -> ScreenerResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&text)
                .map_err(|e| ScreenerError::config(format!("{}: {}", path.display(), e)))?,
            _ => serde_json::from_str(&text)
                .map_err(|e| ScreenerError::config(format!("{}: {}", path.display(), e)))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject inverted ranges and non-positive caps
    pub fn validate(&self) -> ScreenerResult<()> {
        fn check(ok: bool, msg: &str) -> ScreenerResult<()> {
            if ok {
                Ok(())
            } else {
                Err(ScreenerError::config(msg))
            }
        }
        let unit = |x: f64| (0.0..=1.0).contains(&x);

        check(self.dte.min <= self.dte.max, "dte.min exceeds dte.max")?;
        check(
            self.high_volatility.min_dte <= self.high_volatility.max_dte,
            "high_volatility.min_dte exceeds high_volatility.max_dte",
        )?;
        check(
            unit(self.delta.min_put)
                && unit(self.delta.max_put)
                && self.delta.min_put <= self.delta.max_put,
            "put delta range must satisfy 0 <= min <= max <= 1",
        )?;
        check(
            unit(self.delta.min_call)
                && unit(self.delta.max_call)
                && self.delta.min_call <= self.delta.max_call,
            "call delta range must satisfy 0 <= min <= max <= 1",
        )?;
        check(
            unit(self.probability.min_pop) && unit(self.high_volatility.min_pop),
            "probability minimums must lie in [0, 1]",
        )?;
        check(self.liquidity.max_spread_pct > 0.0, "liquidity.max_spread_pct must be positive")?;
        check(self.capital.max_collateral > 0.0, "capital.max_collateral must be positive")?;
        check(self.stability.yield_ceiling > 0.0, "stability.yield_ceiling must be positive")?;
        check(self.scan.default_iv > 0.0, "scan.default_iv must be positive")?;
        check(self.scan.workers >= 1, "scan.workers must be at least 1")?;
        check(self.scan.max_expirations >= 1, "scan.max_expirations must be at least 1")?;
        check(
            self.scan.scan_puts || self.scan.scan_calls,
            "at least one of scan.scan_puts / scan.scan_calls must be enabled",
        )?;
        self.scan.rate_limit.validate()
    }

    /// Whether `ticker` gets the high-volatility overrides
    pub fn is_high_volatility(&self, ticker: &str) -> bool {
        self.high_volatility
            .tickers
            .iter()
            .any(|t| t.eq_ignore_ascii_case(ticker))
    }

    /// Inclusive trading-day window
    pub fn dte_window(&self, high_vol: bool) -> (u32, u32) {
        if high_vol {
            (self.high_volatility.min_dte, self.high_volatility.max_dte)
        } else {
            (self.dte.min, self.dte.max)
        }
    }

    /// Inclusive |delta| range for a leg
    pub fn delta_range(&self, option_type: OptionType) -> (f64, f64) {
        match option_type {
            OptionType::Put => (self.delta.min_put, self.delta.max_put),
            OptionType::Call => (self.delta.min_call, self.delta.max_call),
        }
    }

    pub fn min_cushion(&self, option_type: OptionType, high_vol: bool) -> f64 {
        if high_vol {
            return self.high_volatility.min_cushion;
        }
        match option_type {
            OptionType::Put => self.probability.min_put_cushion,
            OptionType::Call => self.probability.min_call_cushion,
        }
    }

    pub fn min_pop(&self, high_vol: bool) -> f64 {
        if high_vol {
            self.high_volatility.min_pop
        } else {
            self.probability.min_pop
        }
    }
}

/// Trading days to expiry window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DteConfig {
    /// Default: 15
    pub min: u32,
    /// Default: 60
    pub max: u32,
}

impl Default for DteConfig {
    fn default() -> Self {
        Self { min: 15, max: 60 }
    }
}

/// Absolute delta bounds per leg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaConfig {
    pub min_put: f64,
    pub max_put: f64,
    pub min_call: f64,
    pub max_call: f64,
}

impl Default for DeltaConfig {
    fn default() -> Self {
        Self {
            min_put: 0.05,
            max_put: 0.50,
            min_call: 0.05,
            max_call: 0.50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnsConfig {
    /// Minimum premium / collateral. Default: 0.002
    pub min_roc: f64,
    /// Minimum ROC x 252 / DTE. Default: 0.05
    pub min_annualized: f64,
}

impl Default for ReturnsConfig {
    fn default() -> Self {
        Self {
            min_roc: 0.002,
            min_annualized: 0.05,
        }
    }
}

/// Market quality; volume and open interest are alternatives, not both required
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidityConfig {
    /// Maximum (ask - bid) / mid. Default: 0.10
    pub max_spread_pct: f64,
    pub min_volume: u64,
    pub min_open_interest: u64,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            max_spread_pct: 0.10,
            min_volume: 10,
            min_open_interest: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbabilityConfig {
    /// Default: 0.70
    pub min_pop: f64,
    /// Default: 0.0 (strictly OTM puts are enforced separately)
    pub min_put_cushion: f64,
    /// Default: -0.02
    pub min_call_cushion: f64,
    /// Calls more than this fraction in the money are dropped. Default: 0.02
    pub max_call_itm: f64,
}

impl Default for ProbabilityConfig {
    fn default() -> Self {
        Self {
            min_pop: 0.70,
            min_put_cushion: 0.0,
            min_call_cushion: -0.02,
            max_call_itm: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalConfig {
    /// Overbought ceiling for writing puts. Default: 85
    pub max_put_rsi: f64,
    /// Trend ceiling for writing OTM calls. Default: 70
    pub max_call_adx: f64,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            max_put_rsi: 85.0,
            max_call_adx: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapitalConfig {
    /// Per-contract collateral cap in dollars. Default: 25,000
    pub max_collateral: f64,
}

impl Default for CapitalConfig {
    fn default() -> Self {
        Self {
            max_collateral: 25_000.0,
        }
    }
}

/// "Boring" classification and individual risk-flag triggers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub max_beta: f64,
    pub max_hist_vol: f64,
    /// Percent of price
    pub max_atr_pct: f64,
    pub min_market_cap: f64,
    /// Annualized yields above this are suspicious and capped in scoring
    pub yield_ceiling: f64,
    /// Reject every non-stable candidate
    pub strict_mode: bool,

    pub flag_beta: f64,
    pub flag_hist_vol: f64,
    pub flag_atr_pct: f64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            max_beta: 1.2,
            max_hist_vol: 0.40,
            max_atr_pct: 3.5,
            min_market_cap: 10e9,
            yield_ceiling: 0.25,
            strict_mode: false,
            flag_beta: 1.5,
            flag_hist_vol: 0.45,
            flag_atr_pct: 4.0,
        }
    }
}

/// Gap-prone names with stricter thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighVolatilityConfig {
    pub tickers: BTreeSet<String>,
    pub min_dte: u32,
    pub max_dte: u32,
    pub min_cushion: f64,
    pub min_pop: f64,
    pub exclude_earnings: bool,
}

impl Default for HighVolatilityConfig {
    fn default() -> Self {
        Self {
            tickers: ["ABNB", "PINS", "WDAY", "ZS", "PANW", "FTNT"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_dte: 21,
            max_dte: 45,
            min_cushion: 0.15,
            min_pop: 0.85,
            exclude_earnings: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarningsConfig {
    /// Reject any trade with earnings between now and expiry
    pub exclude_all: bool,
    /// Apply the earnings penalty in the composite score
    pub penalty_in_scoring: bool,
    /// Calendar days after expiry that still mark earnings risk
    pub post_expiry_window_days: i64,
}

impl Default for EarningsConfig {
    fn default() -> Self {
        Self {
            exclude_all: false,
            penalty_in_scoring: true,
            post_expiry_window_days: 7,
        }
    }
}

/// Composite score penalties and their triggers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub yield_penalty: f64,
    pub beta_penalty: f64,
    pub beta_threshold: f64,
    pub hist_vol_penalty: f64,
    pub hist_vol_threshold: f64,
    pub atr_penalty: f64,
    /// Percent of price
    pub atr_threshold: f64,
    pub earnings_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            yield_penalty: 0.30,
            beta_penalty: 0.20,
            beta_threshold: 1.5,
            hist_vol_penalty: 0.20,
            hist_vol_threshold: 0.40,
            atr_penalty: 0.10,
            atr_threshold: 4.0,
            earnings_penalty: 0.40,
        }
    }
}

/// Thresholds the top stable candidate must clear for a GO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoNoGoConfig {
    pub min_composite_score: f64,
    pub min_pop: f64,
    pub min_cushion: f64,
}

impl Default for GoNoGoConfig {
    fn default() -> Self {
        Self {
            min_composite_score: 70.0,
            min_pop: 0.80,
            min_cushion: 0.03,
        }
    }
}

/// Client-side pacing of provider requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateLimitConfig {
    Unlimited,
    FixedDelay { millis: u64 },
    TokenBucket { capacity: u32, per_second: f64 },
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig::FixedDelay { millis: 500 }
    }
}

impl RateLimitConfig {
    fn validate(&self) -> ScreenerResult<()> {
        match self {
            RateLimitConfig::TokenBucket { capacity, per_second }
                if *capacity == 0 || !(*per_second > 0.0) =>
            {
                Err(ScreenerError::config(
                    "token bucket needs capacity >= 1 and a positive refill rate",
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Orchestration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub risk_free_rate: f64,
    /// Volatility assumed when a quote carries none
    pub default_iv: f64,
    /// Calendar days of daily bars for technicals
    pub history_lookback_days: u32,
    /// Nearest expirations examined per ticker
    pub max_expirations: usize,
    pub scan_puts: bool,
    pub scan_calls: bool,
    /// Tickers processed concurrently (1 = sequential)
    pub workers: usize,
    pub rate_limit: RateLimitConfig,
    /// Budget for one ticker's fetch-and-filter work
    pub ticker_timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            default_iv: 0.30,
            history_lookback_days: 90,
            max_expirations: 6,
            scan_puts: true,
            scan_calls: false,
            workers: 1,
            rate_limit: RateLimitConfig::default(),
            ticker_timeout_secs: 60,
        }
    }
}
