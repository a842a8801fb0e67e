//! Technical indicators over daily bars
//!
//! - RSI: rolling-mean gain/loss oscillator
//! - ADX: trend strength from directional movement
//! - Realized volatility and ATR% used for the stability screen
//!
//! All windows are simple rolling means, not Wilder exponential smoothing.

use serde::{Deserialize, Serialize};

use crate::core::PriceBar;

/// Default lookback for RSI / ADX / ATR
pub const DEFAULT_PERIOD: usize = 14;

/// Bars required before technicals are trusted
pub const MIN_TECHNICAL_BARS: usize = 30;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const ZERO_GUARD: f64 = 1e-10;

/// Momentum and trend readings for one ticker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Technicals {
    pub rsi: f64,
    pub adx: f64,
    /// True when the neutral defaults were used instead of computed values
    pub is_fallback: bool,
}

impl Technicals {
    /// Neutral readings used when history is short or unavailable
    pub fn neutral() -> Self {
        Self {
            rsi: 50.0,
            adx: 20.0,
            is_fallback: true,
        }
    }

    /// RSI and ADX from daily bars, neutral when fewer than 30 bars exist
    pub fn from_bars(bars: &[PriceBar]) -> Self {
        if bars.len() < MIN_TECHNICAL_BARS {
            return Self::neutral();
        }
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        Self {
            rsi: rsi(&closes, DEFAULT_PERIOD),
            adx: adx(bars, DEFAULT_PERIOD),
            is_fallback: false,
        }
    }
}

/// Mean of the trailing `window` values, None if not enough values
fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

/// Rolling means for every full window, aligned to the window end
fn rolling_means(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }
    values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Relative Strength Index of the latest close
///
/// Returns 50 (neutral) when fewer than `period` price changes exist.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return 50.0;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();

    let (Some(avg_gain), Some(avg_loss)) = (
        trailing_mean(&gains, period),
        trailing_mean(&losses, period),
    ) else {
        return 50.0;
    };

    let avg_loss = if avg_loss == 0.0 { ZERO_GUARD } else { avg_loss };
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// True range series; the first bar uses high - low only
pub fn true_range(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let hl = bar.high - bar.low;
            match i.checked_sub(1).map(|p| bars[p].close) {
                Some(prev_close) => hl
                    .max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs()),
                None => hl,
            }
        })
        .collect()
}

/// Average Directional Index of the latest bar
///
/// Needs `2 * period - 1` bars for a defined value; returns 0 otherwise.
pub fn adx(bars: &[PriceBar], period: usize) -> f64 {
    if period == 0 || bars.len() < 2 * period - 1 {
        return 0.0;
    }

    let tr = true_range(bars);
    let mut plus_dm = vec![0.0; bars.len()];
    let mut minus_dm = vec![0.0; bars.len()];
    for i in 1..bars.len() {
        let up = bars[i].high - bars[i - 1].high;
        let down = bars[i - 1].low - bars[i].low;
        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
    }

    let atr = rolling_means(&tr, period);
    let plus = rolling_means(&plus_dm, period);
    let minus = rolling_means(&minus_dm, period);

    let dx: Vec<f64> = atr
        .iter()
        .zip(plus.iter().zip(minus.iter()))
        .map(|(&atr, (&p, &m))| {
            let (plus_di, minus_di) = if atr > 0.0 {
                (100.0 * p / atr, 100.0 * m / atr)
            } else {
                (0.0, 0.0)
            };
            let sum = plus_di + minus_di;
            let denom = if sum == 0.0 { ZERO_GUARD } else { sum };
            100.0 * (plus_di - minus_di).abs() / denom
        })
        .collect();

    trailing_mean(&dx, period)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Annualized realized volatility from daily closes
///
/// Sample standard deviation of simple returns scaled by sqrt(252);
/// 0.30 when five or fewer closes are available.
pub fn historical_volatility(closes: &[f64]) -> f64 {
    if closes.len() <= 5 {
        return 0.30;
    }

    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return 0.30;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Average true range as percent of the last close
///
/// 2.0 when `period` or fewer bars are available.
pub fn atr_percent(bars: &[PriceBar], period: usize) -> f64 {
    if bars.len() <= period {
        return 2.0;
    }
    let last_close = bars[bars.len() - 1].close;
    match trailing_mean(&true_range(bars), period) {
        Some(atr) if last_close > 0.0 => atr / last_close * 100.0,
        _ => 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn bars_from(closes: &[f64], range: f64) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar {
                date: start + Duration::days(i as i64),
                open: c,
                high: c + range,
                low: c - range,
                close: c,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn test_rsi_short_history_is_neutral() {
        assert_eq!(rsi(&[1.0, 2.0, 3.0], 14), 50.0);
    }

    #[test]
    fn test_rsi_extremes() {
        let rising: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        assert!(rsi(&rising, 14) > 99.9);

        let falling: Vec<f64> = (0..40).map(|i| 100.0 - i as f64).collect();
        assert!(rsi(&falling, 14) < 0.1);
    }

    #[test]
    fn test_rsi_balanced() {
        let zigzag: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let value = rsi(&zigzag, 14);
        assert!((value - 50.0).abs() < 1e-9, "rsi {}", value);
    }

    #[test]
    fn test_adx_trend_vs_chop() {
        let trend: Vec<f64> = (0..60).map(|i| 100.0 + 2.0 * i as f64).collect();
        let strong = adx(&bars_from(&trend, 0.5), 14);
        assert!(strong > 90.0, "adx {}", strong);

        let chop: Vec<f64> = (0..60)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let weak = adx(&bars_from(&chop, 0.5), 14);
        assert!(weak < strong);
        assert!((0.0..=100.0).contains(&weak));
    }

    #[test]
    fn test_adx_undefined_is_zero() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_eq!(adx(&bars_from(&closes, 1.0), 14), 0.0);
    }

    #[test]
    fn test_technicals_defaults() {
        let closes: Vec<f64> = (0..29).map(|i| 100.0 + i as f64).collect();
        let t = Technicals::from_bars(&bars_from(&closes, 1.0));
        assert!(t.is_fallback);
        assert_eq!(t.rsi, 50.0);
        assert_eq!(t.adx, 20.0);

        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert!(!Technicals::from_bars(&bars_from(&closes, 1.0)).is_fallback);
    }

    #[test]
    fn test_historical_volatility() {
        assert_eq!(historical_volatility(&[100.0; 5]), 0.30);
        assert_eq!(historical_volatility(&[100.0; 10]), 0.0);

        let closes: Vec<f64> = (0..21)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let vol = historical_volatility(&closes);
        assert!(vol > 0.10 && vol < 0.25, "vol {}", vol);
    }

    #[test]
    fn test_atr_percent() {
        let closes = vec![100.0; 20];
        let bars = bars_from(&closes, 1.0);
        assert!((atr_percent(&bars, 14) - 2.0).abs() < 1e-12);

        assert_eq!(atr_percent(&bars[..14], 14), 2.0);

        let wide = bars_from(&closes, 3.0);
        assert!((atr_percent(&wide, 14) - 6.0).abs() < 1e-12);
    }
}
