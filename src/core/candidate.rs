//! Screened candidates
//!
//! A `Candidate` is the enriched record produced for an option quote that
//! survived every gate of the filter pipeline. The composite score is filled
//! in afterwards by the scoring pass over the whole candidate set.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::option::{LegType, OptionType};

/// Where a derived number came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueSource {
    /// Supplied by the data feed
    Quoted,
    /// Computed with the pricing model
    Model,
    /// Moneyness-table fallback (missing or invalid model inputs)
    Fallback,
}

/// Individually elevated risk attribute of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RiskFlag {
    HighBeta(f64),
    /// Annualized historical volatility (fraction)
    HighVolatility(f64),
    /// ATR as percent of price
    HighAtr(f64),
    /// Annualized yield above the stability ceiling (fraction)
    SuspiciousYield(f64),
    SmallMidCap,
    EarningsBeforeExpiry,
}

impl RiskFlag {
    /// Flags that exclude a non-stable name outright
    pub fn is_volatility_flag(&self) -> bool {
        matches!(self, RiskFlag::HighBeta(_) | RiskFlag::HighVolatility(_))
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskFlag::HighBeta(beta) => write!(f, "HIGH_BETA_{:.1}", beta),
            RiskFlag::HighVolatility(vol) => write!(f, "HIGH_VOL_{:.0}%", vol * 100.0),
            RiskFlag::HighAtr(atr) => write!(f, "HIGH_ATR_{:.1}%", atr),
            RiskFlag::SuspiciousYield(y) => write!(f, "SUSPICIOUSLY_HIGH_YIELD_{:.0}%", y * 100.0),
            RiskFlag::SmallMidCap => write!(f, "SMALL_MID_CAP"),
            RiskFlag::EarningsBeforeExpiry => write!(f, "EARNINGS_BEFORE_EXPIRY"),
        }
    }
}

/// Positive marker attached instead of a penalty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityFlag {
    /// Stable name temporarily paying an outsized premium
    PossibleOpportunity,
}

/// Option that passed every screening gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub ticker: String,
    pub expiry: NaiveDate,
    pub strike: f64,
    pub option_type: OptionType,
    pub leg_type: LegType,

    /// Underlying price at scan time
    pub underlying_price: f64,
    /// Underlying price net of any ex-dividend inside the option's life
    pub adjusted_price: f64,
    pub bid: f64,
    pub ask: f64,
    pub mid: f64,
    pub volume: u64,
    pub open_interest: u64,
    /// Quoted implied volatility, if any
    pub implied_vol: Option<f64>,

    pub delta: f64,
    pub delta_source: ValueSource,
    /// Probability the short option expires worthless
    pub pop: f64,
    pub pop_source: ValueSource,

    /// Premium per contract (mid x 100)
    pub premium: f64,
    /// Premium / collateral
    pub roc: f64,
    /// ROC annualized on 252 trading days
    pub annualized_yield: f64,
    /// Distance to strike as a fraction of price, positive when OTM
    pub cushion: f64,
    /// Bid-ask spread as a fraction of mid
    pub spread_pct: f64,
    pub collateral: f64,
    /// Trading days to expiry (at least 1)
    pub days_to_expiry: u32,
    /// Premium per trading day
    pub profit_per_day: f64,
    pub breakeven: f64,

    pub rsi: f64,
    pub adx: f64,

    pub earnings_risk: bool,
    pub has_earnings_before_expiry: bool,
    /// Earnings date minus expiry, in calendar days
    pub earnings_days_diff: Option<i64>,
    pub dividend_risk: bool,

    pub beta: f64,
    pub market_cap: f64,
    pub hist_vol: f64,
    pub atr_pct: f64,
    /// Coarse IV regime bucket (20/40/60/80, 50 when IV unknown)
    pub iv_rank_estimate: u8,

    pub is_stable: bool,
    pub risk_flags: Vec<RiskFlag>,
    pub opportunity: Option<OpportunityFlag>,

    /// Composite score in [0, 100], set by the scoring pass
    pub composite_score: f64,
}

impl Candidate {
    pub fn has_flag(&self, pred: impl Fn(&RiskFlag) -> bool) -> bool {
        self.risk_flags.iter().any(pred)
    }

    /// Risk flags joined with '|', empty when none
    pub fn flags_label(&self) -> String {
        self.risk_flags
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join("|")
    }

    /// "KO 2025-06-20 $60.00 PUT"
    pub fn contract_label(&self) -> String {
        format!(
            "{} {} ${:.2} {}",
            self.ticker,
            self.expiry,
            self.strike,
            self.option_type.label()
        )
    }
}

#[cfg(test)]
impl Candidate {
    /// Stable, unflagged 95 put on a 100 underlying, 23 trading days out
    pub(crate) fn sample(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            expiry: NaiveDate::from_ymd_opt(2025, 7, 3).unwrap(),
            strike: 95.0,
            option_type: OptionType::Put,
            leg_type: LegType::CashSecuredPut,
            underlying_price: 100.0,
            adjusted_price: 100.0,
            bid: 0.97,
            ask: 1.03,
            mid: 1.0,
            volume: 50,
            open_interest: 500,
            implied_vol: Some(0.30),
            delta: -0.22,
            delta_source: ValueSource::Model,
            pop: 0.75,
            pop_source: ValueSource::Model,
            premium: 100.0,
            roc: 100.0 / 9500.0,
            annualized_yield: 0.115,
            cushion: 0.05,
            spread_pct: 0.06,
            collateral: 9500.0,
            days_to_expiry: 23,
            profit_per_day: 100.0 / 23.0,
            breakeven: 94.0,
            rsi: 50.0,
            adx: 20.0,
            earnings_risk: false,
            has_earnings_before_expiry: false,
            earnings_days_diff: None,
            dividend_risk: false,
            beta: 0.6,
            market_cap: 2.5e11,
            hist_vol: 0.18,
            atr_pct: 1.5,
            iv_rank_estimate: 40,
            is_stable: true,
            risk_flags: Vec::new(),
            opportunity: None,
            composite_score: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let mut c = Candidate::sample("KO");
        assert_eq!(c.contract_label(), "KO 2025-07-03 $95.00 PUT");
        assert_eq!(c.flags_label(), "");

        c.risk_flags = vec![RiskFlag::SmallMidCap, RiskFlag::EarningsBeforeExpiry];
        assert_eq!(c.flags_label(), "SMALL_MID_CAP|EARNINGS_BEFORE_EXPIRY");
        assert!(c.has_flag(|f| *f == RiskFlag::SmallMidCap));
    }

    #[test]
    fn test_flag_labels() {
        assert_eq!(RiskFlag::HighBeta(1.73).to_string(), "HIGH_BETA_1.7");
        assert_eq!(RiskFlag::HighVolatility(0.52).to_string(), "HIGH_VOL_52%");
        assert_eq!(RiskFlag::HighAtr(4.25).to_string(), "HIGH_ATR_4.2%");
        assert_eq!(
            RiskFlag::SuspiciousYield(0.4).to_string(),
            "SUSPICIOUSLY_HIGH_YIELD_40%"
        );
        assert!(RiskFlag::HighBeta(2.0).is_volatility_flag());
        assert!(!RiskFlag::SmallMidCap.is_volatility_flag());
    }
}
