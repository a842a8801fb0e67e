//! Black-Scholes Model
//!
//! Provides:
//! - Delta of a European option
//! - Risk-neutral probability that a short option finishes out of the money
//! - Moneyness-tiered fallbacks when volatility/time inputs are unusable
//!
//! Probability of profit is taken from d2, never approximated as `1 - |delta|`.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::core::{OptionType, ValueSource};

/// Annual risk-free rate used when none is configured
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.05;

/// Calendar days per year for time-to-expiry
const DAYS_PER_YEAR: f64 = 365.0;

/// A model output tagged with how it was obtained
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub source: ValueSource,
}

impl Estimate {
    fn model(value: f64) -> Self {
        Self {
            value,
            source: ValueSource::Model,
        }
    }

    fn fallback(value: f64) -> Self {
        Self {
            value,
            source: ValueSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == ValueSource::Fallback
    }
}

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    Normal::new(0.0, 1.0).map_or(f64::NAN, |normal| normal.cdf(x))
}

/// Black-Scholes d1 parameter (no dividend yield)
pub fn d1(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    ((spot / strike).ln() + (rate + 0.5 * vol * vol) * time) / (vol * time.sqrt())
}

/// Black-Scholes d2 parameter
pub fn d2(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    d1(spot, strike, rate, vol, time) - vol * time.sqrt()
}

/// Both d1 and d2, or None when the inputs cannot produce finite values
fn d1_d2(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> Option<(f64, f64)> {
    if !(spot > 0.0 && strike > 0.0 && vol > 0.0 && time > 0.0) {
        return None;
    }
    let d1 = d1(spot, strike, rate, vol, time);
    let d2 = d2(spot, strike, rate, vol, time);
    (d1.is_finite() && d2.is_finite()).then_some((d1, d2))
}

/// Option delta
///
/// # Arguments
/// * `days_to_expiry` - Days until expiration (converted with a 365-day year)
/// * `iv` - Implied volatility as a decimal (0.25 = 25%)
///
/// Falls back to a moneyness table when `iv` or time is non-positive or the
/// formula cannot be evaluated.
pub fn delta(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    days_to_expiry: f64,
    iv: f64,
    rate: f64,
) -> Estimate {
    let time = days_to_expiry / DAYS_PER_YEAR;

    match d1_d2(spot, strike, rate, iv, time) {
        Some((d1, _)) => {
            let value = match option_type {
                OptionType::Call => norm_cdf(d1),
                OptionType::Put => norm_cdf(d1) - 1.0,
            };
            Estimate::model(value.clamp(-1.0, 1.0))
        }
        None => Estimate::fallback(fallback_delta(option_type, spot, strike)),
    }
}

/// Probability that a written option expires worthless
///
/// Short put: P(S_T > K) = N(d2). Short call: P(S_T < K) = N(-d2).
pub fn probability_finishes_otm(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    days_to_expiry: f64,
    iv: f64,
    rate: f64,
) -> Estimate {
    let time = days_to_expiry / DAYS_PER_YEAR;

    match d1_d2(spot, strike, rate, iv, time) {
        Some((_, d2)) => {
            let p = match option_type {
                OptionType::Put => norm_cdf(d2),
                OptionType::Call => norm_cdf(-d2),
            };
            Estimate::model(p.clamp(0.0, 1.0))
        }
        None => Estimate::fallback(fallback_probability(option_type, spot, strike)),
    }
}

/// Delta by moneyness tier: near-the-money 0.40, moderately OTM 0.25, deep 0.15
pub fn fallback_delta(option_type: OptionType, spot: f64, strike: f64) -> f64 {
    match moneyness_tier(option_type, spot, strike) {
        MoneynessTier::Near => 0.40 * option_type.phi(),
        MoneynessTier::Moderate => 0.25 * option_type.phi(),
        MoneynessTier::Deep => 0.15 * option_type.phi(),
    }
}

/// Probability OTM by moneyness tier: 0.60 / 0.75 / 0.85
pub fn fallback_probability(option_type: OptionType, spot: f64, strike: f64) -> f64 {
    match moneyness_tier(option_type, spot, strike) {
        MoneynessTier::Near => 0.60,
        MoneynessTier::Moderate => 0.75,
        MoneynessTier::Deep => 0.85,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoneynessTier {
    Near,
    Moderate,
    Deep,
}

fn moneyness_tier(option_type: OptionType, spot: f64, strike: f64) -> MoneynessTier {
    let moneyness = strike / spot;
    match option_type {
        OptionType::Put => {
            if moneyness > 0.95 {
                MoneynessTier::Near
            } else if moneyness > 0.90 {
                MoneynessTier::Moderate
            } else {
                MoneynessTier::Deep
            }
        }
        OptionType::Call => {
            if moneyness < 1.05 {
                MoneynessTier::Near
            } else if moneyness < 1.10 {
                MoneynessTier::Moderate
            } else {
                MoneynessTier::Deep
            }
        }
    }
}
