//! Candidate filter pipeline
//!
//! Evaluates one option quote against an ordered sequence of gates. The first
//! failing gate decides the outcome; a quote that clears every gate becomes a
//! fully enriched [`Candidate`] with a placeholder score.
//!
//! Gate order:
//! 1. two-sided market
//! 2. trading-day DTE window
//! 3. out of the money (puts vs dividend-adjusted price, calls at most 2% ITM)
//! 4. |delta| range
//! 5. cushion
//! 6. probability of profit
//! 7. technicals (RSI for puts, ADX for OTM calls)
//! 8. collateral cap
//! 9. return on capital
//! 10. annualized yield
//! 11. bid-ask spread
//! 12. volume OR open interest
//! 13. earnings policy
//! 14-16. stability classification, volatile-name exclusion, opportunity marker

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar::trading_days_to_expiry;
use super::config::WheelConfig;
use crate::core::{
    Candidate, DividendInfo, OpportunityFlag, OptionQuote, OptionType, RiskFlag, RiskMetrics,
    ValueSource, CONTRACT_MULTIPLIER,
};
use crate::models::{delta, probability_finishes_otm, Technicals};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// The gate that dropped a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rejection {
    NoMarket,
    DteOutOfRange,
    NotOutOfTheMoney,
    DeltaOutOfRange,
    InsufficientCushion,
    LowProbability,
    Technical,
    CollateralTooHigh,
    LowReturnOnCapital,
    LowAnnualizedYield,
    WideSpread,
    Illiquid,
    EarningsBeforeExpiry,
    VolatileUnstable,
    NotStable,
}

impl Rejection {
    /// Every gate in evaluation order
    pub const ALL: [Rejection; 15] = [
        Rejection::NoMarket,
        Rejection::DteOutOfRange,
        Rejection::NotOutOfTheMoney,
        Rejection::DeltaOutOfRange,
        Rejection::InsufficientCushion,
        Rejection::LowProbability,
        Rejection::Technical,
        Rejection::CollateralTooHigh,
        Rejection::LowReturnOnCapital,
        Rejection::LowAnnualizedYield,
        Rejection::WideSpread,
        Rejection::Illiquid,
        Rejection::EarningsBeforeExpiry,
        Rejection::VolatileUnstable,
        Rejection::NotStable,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Rejection::NoMarket => "no bid/ask",
            Rejection::DteOutOfRange => "DTE out of range",
            Rejection::NotOutOfTheMoney => "not OTM",
            Rejection::DeltaOutOfRange => "delta out of range",
            Rejection::InsufficientCushion => "cushion too small",
            Rejection::LowProbability => "PoP too low",
            Rejection::Technical => "RSI/ADX",
            Rejection::CollateralTooHigh => "collateral too high",
            Rejection::LowReturnOnCapital => "ROC too low",
            Rejection::LowAnnualizedYield => "annualized too low",
            Rejection::WideSpread => "spread too wide",
            Rejection::Illiquid => "illiquid",
            Rejection::EarningsBeforeExpiry => "earnings before expiry",
            Rejection::VolatileUnstable => "volatile non-stable",
            Rejection::NotStable => "not stable (strict)",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-ticker inputs shared by every quote of that ticker
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningContext {
    pub as_of: NaiveDate,
    pub underlying_price: f64,
    pub technicals: Technicals,
    pub risk: RiskMetrics,
    pub dividend: Option<DividendInfo>,
    pub earnings: Option<NaiveDate>,
    pub high_volatility: bool,
}

impl ScreeningContext {
    /// Context with neutral technicals, fallback risk and no calendar events
    pub fn new(as_of: NaiveDate, underlying_price: f64) -> Self {
        Self {
            as_of,
            underlying_price,
            technicals: Technicals::neutral(),
            risk: RiskMetrics::fallback(),
            dividend: None,
            earnings: None,
            high_volatility: false,
        }
    }
}

/// Coarse IV regime bucket
pub fn iv_rank_estimate(iv: Option<f64>) -> u8 {
    match iv {
        Some(iv) if iv > 0.60 => 80,
        Some(iv) if iv > 0.40 => 60,
        Some(iv) if iv > 0.25 => 40,
        Some(_) => 20,
        None => 50,
    }
}

/// Run one quote through every gate
pub fn evaluate(
    quote: &OptionQuote,
    ctx: &ScreeningContext,
    config: &WheelConfig,
) -> Result<Candidate, Rejection> {
    let kind = quote.option_type;
    let price = ctx.underlying_price;
    let hv = ctx.high_volatility;

    // 1. Two-sided market on a well-formed contract
    if !(quote.has_market() && quote.strike > 0.0 && price > 0.0) {
        return Err(Rejection::NoMarket);
    }

    // 2. Trading-day window
    let dte = trading_days_to_expiry(ctx.as_of, quote.expiry);
    let (min_dte, max_dte) = config.dte_window(hv);
    if dte < min_dte || dte > max_dte {
        return Err(Rejection::DteOutOfRange);
    }

    // 3. Moneyness; puts see the price net of a dividend paid during the option's life
    let dividend_risk = kind == OptionType::Put
        && ctx
            .dividend
            .is_some_and(|d| d.falls_within(ctx.as_of, quote.expiry));
    let adjusted_price = match (dividend_risk, ctx.dividend) {
        (true, Some(d)) => price - d.amount,
        _ => price,
    };
    let cushion = match kind {
        OptionType::Put => {
            if adjusted_price <= 0.0 || quote.strike >= adjusted_price {
                return Err(Rejection::NotOutOfTheMoney);
            }
            (adjusted_price - quote.strike) / adjusted_price
        }
        OptionType::Call => {
            let cushion = (quote.strike - price) / price;
            if cushion < -config.probability.max_call_itm {
                return Err(Rejection::NotOutOfTheMoney);
            }
            cushion
        }
    };

    // 4. Delta, modelled when the feed has none
    let iv = quote.quoted_iv().unwrap_or(config.scan.default_iv);
    let rate = config.scan.risk_free_rate;
    let days = f64::from(dte);
    let (delta_value, delta_source) = match quote.quoted_delta() {
        Some(d) => (d, ValueSource::Quoted),
        None => {
            let est = delta(kind, adjusted_price, quote.strike, days, iv, rate);
            (est.value, est.source)
        }
    };
    let (min_delta, max_delta) = config.delta_range(kind);
    if delta_value.abs() < min_delta || delta_value.abs() > max_delta {
        return Err(Rejection::DeltaOutOfRange);
    }

    // 5. Cushion
    if cushion < config.min_cushion(kind, hv) {
        return Err(Rejection::InsufficientCushion);
    }

    // 6. Probability of profit
    let pop = probability_finishes_otm(kind, adjusted_price, quote.strike, days, iv, rate);
    if pop.value < config.min_pop(hv) {
        return Err(Rejection::LowProbability);
    }

    // 7. Technicals
    let technical_block = match kind {
        OptionType::Put => ctx.technicals.rsi > config.technical.max_put_rsi,
        OptionType::Call => ctx.technicals.adx > config.technical.max_call_adx && cushion > 0.0,
    };
    if technical_block {
        return Err(Rejection::Technical);
    }

    // 8. Collateral
    let collateral = match kind {
        OptionType::Put => quote.strike * CONTRACT_MULTIPLIER,
        OptionType::Call => price * CONTRACT_MULTIPLIER,
    };
    if collateral > config.capital.max_collateral {
        return Err(Rejection::CollateralTooHigh);
    }

    // 9. Return on capital
    let mid = quote.mid();
    let premium = mid * CONTRACT_MULTIPLIER;
    let roc = premium / collateral;
    if roc < config.returns.min_roc {
        return Err(Rejection::LowReturnOnCapital);
    }

    // 10. Annualized yield
    let annualized_yield = roc * TRADING_DAYS_PER_YEAR / days;
    if annualized_yield < config.returns.min_annualized {
        return Err(Rejection::LowAnnualizedYield);
    }

    // 11. Spread
    let spread_pct = quote.relative_spread();
    if spread_pct > config.liquidity.max_spread_pct {
        return Err(Rejection::WideSpread);
    }

    // 12. Liquidity: either measure suffices
    let liquid = quote.volume >= config.liquidity.min_volume
        || quote.open_interest >= config.liquidity.min_open_interest;
    if !liquid {
        return Err(Rejection::Illiquid);
    }

    // 13. Earnings
    let mut earnings_risk = false;
    let mut has_earnings_before_expiry = false;
    let mut earnings_days_diff = None;
    if let Some(earnings) = ctx.earnings {
        let diff = (earnings - quote.expiry).num_days();
        earnings_days_diff = Some(diff);

        if ctx.as_of < earnings && earnings <= quote.expiry {
            has_earnings_before_expiry = true;
            earnings_risk = true;
            if config.earnings.exclude_all || (hv && config.high_volatility.exclude_earnings) {
                return Err(Rejection::EarningsBeforeExpiry);
            }
        } else if diff > 0 && diff <= config.earnings.post_expiry_window_days {
            earnings_risk = true;
        }
    }

    // 14. Stability
    let risk = &ctx.risk;
    let stab = &config.stability;
    let is_stable = risk.beta <= stab.max_beta
        && risk.hist_vol <= stab.max_hist_vol
        && risk.atr_pct <= stab.max_atr_pct
        && risk.market_cap >= stab.min_market_cap;

    let mut risk_flags = Vec::new();
    if risk.beta > stab.flag_beta {
        risk_flags.push(RiskFlag::HighBeta(risk.beta));
    }
    if risk.hist_vol > stab.flag_hist_vol {
        risk_flags.push(RiskFlag::HighVolatility(risk.hist_vol));
    }
    if risk.atr_pct > stab.flag_atr_pct {
        risk_flags.push(RiskFlag::HighAtr(risk.atr_pct));
    }
    if annualized_yield > stab.yield_ceiling {
        risk_flags.push(RiskFlag::SuspiciousYield(annualized_yield));
    }
    if risk.market_cap < stab.min_market_cap {
        risk_flags.push(RiskFlag::SmallMidCap);
    }
    if has_earnings_before_expiry {
        risk_flags.push(RiskFlag::EarningsBeforeExpiry);
    }

    // 15. Volatile non-stable names, then strict mode
    if !is_stable && risk_flags.iter().any(RiskFlag::is_volatility_flag) {
        return Err(Rejection::VolatileUnstable);
    }
    if stab.strict_mode && !is_stable {
        return Err(Rejection::NotStable);
    }

    // 16. Stable name paying an outsized premium
    let opportunity = (is_stable
        && risk_flags
            .iter()
            .any(|f| matches!(f, RiskFlag::SuspiciousYield(_))))
    .then_some(OpportunityFlag::PossibleOpportunity);

    let breakeven = match kind {
        OptionType::Put => quote.strike - mid,
        OptionType::Call => quote.strike + mid,
    };

    Ok(Candidate {
        ticker: quote.ticker.clone(),
        expiry: quote.expiry,
        strike: quote.strike,
        option_type: kind,
        leg_type: kind.leg(),
        underlying_price: price,
        adjusted_price,
        bid: quote.bid,
        ask: quote.ask,
        mid,
        volume: quote.volume,
        open_interest: quote.open_interest,
        implied_vol: quote.quoted_iv(),
        delta: delta_value,
        delta_source,
        pop: pop.value,
        pop_source: pop.source,
        premium,
        roc,
        annualized_yield,
        cushion,
        spread_pct,
        collateral,
        days_to_expiry: dte,
        profit_per_day: premium / days,
        breakeven,
        rsi: ctx.technicals.rsi,
        adx: ctx.technicals.adx,
        earnings_risk,
        has_earnings_before_expiry,
        earnings_days_diff,
        dividend_risk,
        beta: risk.beta,
        market_cap: risk.market_cap,
        hist_vol: risk.hist_vol,
        atr_pct: risk.atr_pct,
        iv_rank_estimate: iv_rank_estimate(quote.quoted_iv()),
        is_stable,
        risk_flags,
        opportunity,
        composite_score: 0.0,
    })
}

/// Pass / reject tallies across a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub evaluated: u64,
    pub passed: u64,
    pub rejected: BTreeMap<Rejection, u64>,
}

impl FilterStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &Result<Candidate, Rejection>) {
        self.evaluated += 1;
        match outcome {
            Ok(_) => self.passed += 1,
            Err(rejection) => *self.rejected.entry(*rejection).or_insert(0) += 1,
        }
    }

    /// Fold another worker's tallies into these
    pub fn merge(&mut self, other: &FilterStats) {
        self.evaluated += other.evaluated;
        self.passed += other.passed;
        for (rejection, count) in &other.rejected {
            *self.rejected.entry(*rejection).or_insert(0) += count;
        }
    }

    pub fn rejected_by(&self, rejection: Rejection) -> u64 {
        self.rejected.get(&rejection).copied().unwrap_or(0)
    }

    pub fn total_rejected(&self) -> u64 {
        self.rejected.values().sum()
    }
}

impl fmt::Display for FilterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Options evaluated: {}", self.evaluated)?;
        for rejection in Rejection::ALL {
            let count = self.rejected_by(rejection);
            if count > 0 {
                writeln!(f, "  rejected ({:<24}) {:>8}", rejection.label(), count)?;
            }
        }
        write!(f, "Passed all filters: {}", self.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // Monday; 2025-07-03 is 23 trading days out
    fn as_of() -> NaiveDate {
        d(2025, 6, 2)
    }

    fn expiry() -> NaiveDate {
        d(2025, 7, 3)
    }

    fn stable_risk() -> RiskMetrics {
        RiskMetrics {
            beta: 0.6,
            market_cap: 2.5e11,
            hist_vol: 0.18,
            atr_pct: 1.5,
        }
    }

    fn context() -> ScreeningContext {
        ScreeningContext {
            risk: stable_risk(),
            technicals: Technicals {
                rsi: 50.0,
                adx: 20.0,
                is_fallback: false,
            },
            ..ScreeningContext::new(as_of(), 100.0)
        }
    }

    fn put(strike: f64) -> OptionQuote {
        let mut q = OptionQuote::new("KO", expiry(), strike, OptionType::Put);
        q.bid = 0.97;
        q.ask = 1.03;
        q.volume = 50;
        q.open_interest = 500;
        q.implied_vol = Some(0.30);
        q
    }

    fn call(strike: f64) -> OptionQuote {
        OptionQuote {
            option_type: OptionType::Call,
            ..put(strike)
        }
    }

    #[test]
    fn test_put_passes_with_enriched_fields() {
        let c = evaluate(&put(95.0), &context(), &WheelConfig::default()).unwrap();

        assert_eq!(c.leg_type, crate::core::LegType::CashSecuredPut);
        assert_eq!(c.days_to_expiry, 23);
        assert_eq!(c.delta_source, ValueSource::Model);
        assert!(c.delta < -0.2 && c.delta > -0.3, "delta {}", c.delta);
        assert!(c.pop > 0.70 && c.pop < 0.80, "pop {}", c.pop);
        assert!((c.cushion - 0.05).abs() < 1e-12);
        assert!((c.premium - 100.0).abs() < 1e-9);
        assert!((c.roc - 100.0 / 9500.0).abs() < 1e-12);
        assert!((c.annualized_yield - c.roc * 252.0 / 23.0).abs() < 1e-12);
        assert!((c.breakeven - 94.0).abs() < 1e-9);
        assert_eq!(c.collateral, 9500.0);
        assert_eq!(c.iv_rank_estimate, 40);
        assert!(c.is_stable);
        assert!(c.risk_flags.is_empty());
        assert!(c.opportunity.is_none());
        assert!(!c.earnings_risk && !c.dividend_risk);
        assert_eq!(c.composite_score, 0.0);
    }

    #[test]
    fn test_zero_bid_rejected_first() {
        let mut q = put(95.0);
        q.bid = 0.0;
        // Would also fail later gates
        q.volume = 0;
        q.open_interest = 0;
        q.strike = 150.0;
        assert_eq!(
            evaluate(&q, &context(), &WheelConfig::default()),
            Err(Rejection::NoMarket)
        );
    }

    #[test]
    fn test_dte_window() {
        let mut q = put(95.0);
        q.expiry = d(2025, 12, 19);
        assert_eq!(
            evaluate(&q, &context(), &WheelConfig::default()),
            Err(Rejection::DteOutOfRange)
        );

        q.expiry = d(2025, 6, 13);
        assert_eq!(
            evaluate(&q, &context(), &WheelConfig::default()),
            Err(Rejection::DteOutOfRange)
        );
    }

    #[test]
    fn test_put_must_be_otm_after_dividend() {
        let config = WheelConfig::default();
        assert_eq!(
            evaluate(&put(101.0), &context(), &config),
            Err(Rejection::NotOutOfTheMoney)
        );

        let mut ctx = context();
        ctx.dividend = Some(DividendInfo {
            ex_date: d(2025, 6, 13),
            amount: 5.5,
        });
        assert_eq!(
            evaluate(&put(95.0), &ctx, &config),
            Err(Rejection::NotOutOfTheMoney)
        );

        // Ex-date after expiry does not adjust
        ctx.dividend = Some(DividendInfo {
            ex_date: d(2025, 7, 10),
            amount: 5.5,
        });
        let c = evaluate(&put(95.0), &ctx, &config).unwrap();
        assert!(!c.dividend_risk);
        assert_eq!(c.adjusted_price, 100.0);
    }

    #[test]
    fn test_small_dividend_adjusts_cushion() {
        let mut ctx = context();
        ctx.dividend = Some(DividendInfo {
            ex_date: d(2025, 6, 13),
            amount: 0.5,
        });
        let c = evaluate(&put(95.0), &ctx, &WheelConfig::default()).unwrap();
        assert!(c.dividend_risk);
        assert_eq!(c.adjusted_price, 99.5);
        assert!((c.cushion - 4.5 / 99.5).abs() < 1e-12);
    }

    #[test]
    fn test_quoted_delta() {
        let config = WheelConfig::default();

        let mut q = put(95.0);
        q.delta = Some(-0.6);
        assert_eq!(
            evaluate(&q, &context(), &config),
            Err(Rejection::DeltaOutOfRange)
        );

        q.delta = Some(-0.22);
        let c = evaluate(&q, &context(), &config).unwrap();
        assert_eq!(c.delta, -0.22);
        assert_eq!(c.delta_source, ValueSource::Quoted);

        // Zero counts as missing
        q.delta = Some(0.0);
        let c = evaluate(&q, &context(), &config).unwrap();
        assert_eq!(c.delta_source, ValueSource::Model);
    }

    #[test]
    fn test_missing_iv_uses_default() {
        let mut q = put(95.0);
        q.implied_vol = None;
        let c = evaluate(&q, &context(), &WheelConfig::default()).unwrap();
        let with_iv = evaluate(&put(95.0), &context(), &WheelConfig::default()).unwrap();

        assert_eq!(c.delta, with_iv.delta);
        assert_eq!(c.implied_vol, None);
        assert_eq!(c.iv_rank_estimate, 50);
    }

    #[test]
    fn test_high_volatility_overrides() {
        let mut ctx = context();
        ctx.high_volatility = true;
        assert_eq!(
            evaluate(&put(95.0), &ctx, &WheelConfig::default()),
            Err(Rejection::InsufficientCushion)
        );
    }

    #[test]
    fn test_high_volatility_dte_window() {
        // 15 trading days: inside 15-60, outside 21-45
        let mut q = put(95.0);
        q.expiry = d(2025, 6, 23);
        let c = evaluate(&q, &context(), &WheelConfig::default()).unwrap();
        assert_eq!(c.days_to_expiry, 15);

        let mut ctx = context();
        ctx.high_volatility = true;
        assert_eq!(
            evaluate(&q, &ctx, &WheelConfig::default()),
            Err(Rejection::DteOutOfRange)
        );
    }

    #[test]
    fn test_high_volatility_min_pop() {
        // 16% cushion at 80% IV: PoP ~0.78
        let mut q = put(84.0);
        q.implied_vol = Some(0.80);
        let c = evaluate(&q, &context(), &WheelConfig::default()).unwrap();
        assert!(c.pop > 0.70 && c.pop < 0.85, "pop {}", c.pop);

        let mut ctx = context();
        ctx.high_volatility = true;
        assert_eq!(
            evaluate(&q, &ctx, &WheelConfig::default()),
            Err(Rejection::LowProbability)
        );
    }

    #[test]
    fn test_low_probability() {
        let mut config = WheelConfig::default();
        config.probability.min_pop = 0.90;
        assert_eq!(
            evaluate(&put(95.0), &context(), &config),
            Err(Rejection::LowProbability)
        );
    }

    #[test]
    fn test_technical_gates() {
        let config = WheelConfig::default();
        let mut ctx = context();
        ctx.technicals.rsi = 90.0;
        assert_eq!(
            evaluate(&put(95.0), &ctx, &config),
            Err(Rejection::Technical)
        );
        // RSI does not gate calls
        assert!(evaluate(&call(105.0), &ctx, &config).is_ok());

        let mut ctx = context();
        ctx.technicals.adx = 80.0;
        assert_eq!(
            evaluate(&call(105.0), &ctx, &config),
            Err(Rejection::Technical)
        );
    }

    #[test]
    fn test_strong_trend_only_blocks_otm_calls() {
        // Slightly ITM call: PoP ~0.45, so relax the PoP floor to reach the ADX gate
        let mut config = WheelConfig::default();
        config.probability.min_pop = 0.40;
        let mut ctx = context();
        ctx.technicals.adx = 80.0;

        let mut q = call(99.0);
        q.delta = Some(0.45);
        let c = evaluate(&q, &ctx, &config).unwrap();
        assert!(c.cushion < 0.0);
        assert_eq!(c.delta_source, ValueSource::Quoted);

        let mut q = call(105.0);
        q.delta = Some(0.30);
        assert_eq!(evaluate(&q, &ctx, &config), Err(Rejection::Technical));
    }

    #[test]
    fn test_collateral_and_returns() {
        let mut config = WheelConfig::default();
        config.capital.max_collateral = 9000.0;
        assert_eq!(
            evaluate(&put(95.0), &context(), &config),
            Err(Rejection::CollateralTooHigh)
        );

        let mut config = WheelConfig::default();
        config.returns.min_roc = 0.02;
        assert_eq!(
            evaluate(&put(95.0), &context(), &config),
            Err(Rejection::LowReturnOnCapital)
        );

        let mut config = WheelConfig::default();
        config.returns.min_annualized = 0.20;
        assert_eq!(
            evaluate(&put(95.0), &context(), &config),
            Err(Rejection::LowAnnualizedYield)
        );
    }

    #[test]
    fn test_spread_and_liquidity() {
        let config = WheelConfig::default();

        let mut q = put(95.0);
        q.bid = 0.80;
        q.ask = 1.20;
        assert_eq!(evaluate(&q, &context(), &config), Err(Rejection::WideSpread));

        let mut q = put(95.0);
        q.volume = 0;
        assert!(evaluate(&q, &context(), &config).is_ok());

        q.volume = 50;
        q.open_interest = 0;
        assert!(evaluate(&q, &context(), &config).is_ok());

        q.volume = 9;
        q.open_interest = 199;
        assert_eq!(evaluate(&q, &context(), &config), Err(Rejection::Illiquid));
    }

    #[test]
    fn test_earnings_policy() {
        let mut ctx = context();
        ctx.earnings = Some(d(2025, 6, 20));

        let c = evaluate(&put(95.0), &ctx, &WheelConfig::default()).unwrap();
        assert!(c.earnings_risk);
        assert!(c.has_earnings_before_expiry);
        assert_eq!(c.earnings_days_diff, Some(-13));
        assert!(c.risk_flags.contains(&RiskFlag::EarningsBeforeExpiry));

        assert_eq!(
            evaluate(&put(95.0), &ctx, &WheelConfig::exclude_all_earnings()),
            Err(Rejection::EarningsBeforeExpiry)
        );

        // Earnings on expiry day counts as before expiry
        ctx.earnings = Some(expiry());
        assert!(evaluate(&put(95.0), &ctx, &WheelConfig::default())
            .unwrap()
            .has_earnings_before_expiry);
    }

    #[test]
    fn test_high_volatility_earnings_exclusion() {
        let mut config = WheelConfig::default();
        config.high_volatility.min_cushion = 0.0;
        config.high_volatility.min_pop = 0.70;

        let mut ctx = context();
        ctx.high_volatility = true;
        ctx.earnings = Some(d(2025, 6, 20));
        assert_eq!(
            evaluate(&put(95.0), &ctx, &config),
            Err(Rejection::EarningsBeforeExpiry)
        );

        config.high_volatility.exclude_earnings = false;
        assert!(evaluate(&put(95.0), &ctx, &config).is_ok());
    }

    #[test]
    fn test_earnings_after_expiry() {
        let mut ctx = context();
        ctx.earnings = Some(d(2025, 7, 8));
        let c = evaluate(&put(95.0), &ctx, &WheelConfig::default()).unwrap();
        assert!(c.earnings_risk);
        assert!(!c.has_earnings_before_expiry);
        assert_eq!(c.earnings_days_diff, Some(5));

        ctx.earnings = Some(d(2025, 7, 20));
        assert!(!evaluate(&put(95.0), &ctx, &WheelConfig::default())
            .unwrap()
            .earnings_risk);

        // Already reported
        ctx.earnings = Some(d(2025, 5, 1));
        assert!(!evaluate(&put(95.0), &ctx, &WheelConfig::default())
            .unwrap()
            .earnings_risk);
    }

    #[test]
    fn test_volatile_unstable_rejected() {
        let mut ctx = context();
        ctx.risk.beta = 1.8;
        assert_eq!(
            evaluate(&put(95.0), &ctx, &WheelConfig::default()),
            Err(Rejection::VolatileUnstable)
        );

        let mut ctx = context();
        ctx.risk.hist_vol = 0.50;
        assert_eq!(
            evaluate(&put(95.0), &ctx, &WheelConfig::default()),
            Err(Rejection::VolatileUnstable)
        );
    }

    #[test]
    fn test_unstable_but_calm_kept_unless_strict() {
        let mut ctx = context();
        ctx.risk.market_cap = 5e9;

        let c = evaluate(&put(95.0), &ctx, &WheelConfig::default()).unwrap();
        assert!(!c.is_stable);
        assert_eq!(c.risk_flags, vec![RiskFlag::SmallMidCap]);

        assert_eq!(
            evaluate(&put(95.0), &ctx, &WheelConfig::stability_only()),
            Err(Rejection::NotStable)
        );
    }

    #[test]
    fn test_stable_high_yield_is_opportunity() {
        let mut q = put(95.0);
        q.bid = 3.38;
        q.ask = 3.62;
        let c = evaluate(&q, &context(), &WheelConfig::default()).unwrap();

        assert!(c.annualized_yield > 0.40, "yield {}", c.annualized_yield);
        assert!(c.is_stable);
        assert!(c.has_flag(|f| matches!(f, RiskFlag::SuspiciousYield(_))));
        assert_eq!(c.opportunity, Some(OpportunityFlag::PossibleOpportunity));
    }

    #[test]
    fn test_covered_call() {
        let config = WheelConfig::default();
        let c = evaluate(&call(105.0), &context(), &config).unwrap();
        assert_eq!(c.leg_type, crate::core::LegType::CoveredCall);
        assert_eq!(c.collateral, 10_000.0);
        assert!(c.delta > 0.2 && c.delta < 0.35, "delta {}", c.delta);
        assert!((c.cushion - 0.05).abs() < 1e-12);
        assert!((c.breakeven - 106.0).abs() < 1e-9);

        assert_eq!(
            evaluate(&call(97.0), &context(), &config),
            Err(Rejection::NotOutOfTheMoney)
        );
    }

    #[test]
    fn test_call_ignores_dividend() {
        let mut ctx = context();
        ctx.dividend = Some(DividendInfo {
            ex_date: d(2025, 6, 13),
            amount: 0.5,
        });
        let c = evaluate(&call(105.0), &ctx, &WheelConfig::default()).unwrap();
        assert!(!c.dividend_risk);
        assert_eq!(c.adjusted_price, 100.0);
    }

    #[test]
    fn test_deterministic() {
        let config = WheelConfig::default();
        let mut ctx = context();
        ctx.earnings = Some(d(2025, 7, 8));
        let first = evaluate(&put(95.0), &ctx, &config);
        for _ in 0..10 {
            assert_eq!(evaluate(&put(95.0), &ctx, &config), first);
        }
    }

    #[test]
    fn test_iv_rank_buckets() {
        assert_eq!(iv_rank_estimate(Some(0.70)), 80);
        assert_eq!(iv_rank_estimate(Some(0.45)), 60);
        assert_eq!(iv_rank_estimate(Some(0.30)), 40);
        assert_eq!(iv_rank_estimate(Some(0.20)), 20);
        assert_eq!(iv_rank_estimate(None), 50);
    }

    #[test]
    fn test_filter_stats() {
        let config = WheelConfig::default();
        let mut a = FilterStats::new();
        a.record(&evaluate(&put(95.0), &context(), &config));
        a.record(&evaluate(&put(101.0), &context(), &config));

        let mut b = FilterStats::new();
        let mut q = put(95.0);
        q.ask = 0.0;
        b.record(&evaluate(&q, &context(), &config));
        b.record(&evaluate(&put(101.0), &context(), &config));

        a.merge(&b);
        assert_eq!(a.evaluated, 4);
        assert_eq!(a.passed, 1);
        assert_eq!(a.rejected_by(Rejection::NotOutOfTheMoney), 2);
        assert_eq!(a.rejected_by(Rejection::NoMarket), 1);
        assert_eq!(a.total_rejected(), 3);

        let text = a.to_string();
        assert!(text.contains("not OTM"));
        assert!(text.ends_with("Passed all filters: 1"));
    }
}
