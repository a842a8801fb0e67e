//! Composite scoring
//!
//! Every component is normalized across the whole candidate set, so scores
//! are only comparable within one batch and must be computed after all
//! candidates are known:
//!
//! ```text
//! raw = 2*annualized + 2*cushion + roc + pop + liquidity + 2*stability - penalty
//! composite = clamp(raw / 10 * 100, 0, 100)
//! ```
//!
//! The annualized yield is capped at the stability ceiling before it is
//! normalized, so outsized premiums earn no extra credit.

use serde::{Deserialize, Serialize};

use super::config::WheelConfig;
use crate::core::Candidate;

/// Total of the component weights
const WEIGHT_SUM: f64 = 10.0;

/// Percentile rank of each value within the set, scaled to [0, 1]
///
/// - empty input: empty output
/// - all values equal: 0.5 everywhere
/// - fewer than three values: min-max scaling
/// - otherwise: mean-rank percentile (ties share a rank)
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(max > min) {
        return vec![0.5; n];
    }

    if n < 3 {
        return values.iter().map(|v| (v - min) / (max - min)).collect();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    values
        .iter()
        .map(|v| {
            let left = sorted.partition_point(|x| x < v);
            let right = sorted.partition_point(|x| x <= v);
            let bump = usize::from(right > left);
            let pct = (left + right + bump) as f64 * 50.0 / n as f64;
            (pct / 100.0).clamp(0.0, 1.0)
        })
        .collect()
}

/// Combined inverse of beta, realized volatility and ATR%; higher is calmer
pub fn stability_raw(beta: f64, hist_vol: f64, atr_pct: f64) -> f64 {
    let beta_inv = (2.0 - beta.clamp(0.5, 2.0)).max(0.0);
    let vol_inv = (60.0 - (hist_vol * 100.0).min(60.0)).max(0.0);
    let atr_inv = (5.0 - atr_pct.min(5.0)).max(0.0);
    (beta_inv / 1.5 + vol_inv / 60.0 + atr_inv / 5.0) / 3.0
}

/// Additive penalty for individually risky attributes
pub fn risk_penalty(candidate: &Candidate, config: &WheelConfig) -> f64 {
    let s = &config.scoring;
    let mut penalty = 0.0;
    if candidate.annualized_yield > config.stability.yield_ceiling {
        penalty += s.yield_penalty;
    }
    if candidate.beta > s.beta_threshold {
        penalty += s.beta_penalty;
    }
    if candidate.hist_vol > s.hist_vol_threshold {
        penalty += s.hist_vol_penalty;
    }
    if candidate.atr_pct > s.atr_threshold {
        penalty += s.atr_penalty;
    }
    if config.earnings.penalty_in_scoring && candidate.has_earnings_before_expiry {
        penalty += s.earnings_penalty;
    }
    penalty
}

/// Normalized components behind one candidate's score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub annualized: f64,
    pub cushion: f64,
    pub roc: f64,
    pub pop: f64,
    pub liquidity: f64,
    pub stability: f64,
    pub penalty: f64,
}

impl ScoreComponents {
    /// Weighted sum scaled to [0, 100]
    pub fn composite(&self) -> f64 {
        let raw = 2.0 * self.annualized
            + 2.0 * self.cushion
            + self.roc
            + self.pop
            + self.liquidity
            + 2.0 * self.stability
            - self.penalty;
        (raw / WEIGHT_SUM * 100.0).clamp(0.0, 100.0)
    }
}

/// Components for every candidate, aligned with the input order
pub fn component_scores(candidates: &[Candidate], config: &WheelConfig) -> Vec<ScoreComponents> {
    let column = |f: &dyn Fn(&Candidate) -> f64| -> Vec<f64> {
        normalize(&candidates.iter().map(f).collect::<Vec<_>>())
    };

    let ceiling = config.stability.yield_ceiling;
    let annualized = column(&|c| c.annualized_yield.min(ceiling));
    let cushion = column(&|c| c.cushion);
    let roc = column(&|c| c.roc);
    let pop = column(&|c| c.pop);
    let volume = column(&|c| c.volume as f64);
    let open_interest = column(&|c| c.open_interest as f64);
    let spread = column(&|c| c.spread_pct);
    let stability = column(&|c| stability_raw(c.beta, c.hist_vol, c.atr_pct));

    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| ScoreComponents {
            annualized: annualized[i],
            cushion: cushion[i],
            roc: roc[i],
            pop: pop[i],
            liquidity: (volume[i] + open_interest[i] + (1.0 - spread[i])) / 3.0,
            stability: stability[i],
            penalty: risk_penalty(c, config),
        })
        .collect()
}

/// Fill in `composite_score` for the whole set
pub fn score_candidates(candidates: &mut [Candidate], config: &WheelConfig) {
    let components = component_scores(candidates, config);
    for (candidate, parts) in candidates.iter_mut().zip(components) {
        candidate.composite_score = parts.composite();
    }
}

/// Score, then order best first; ties keep their input order
pub fn rank(mut candidates: Vec<Candidate>, config: &WheelConfig) -> Vec<Candidate> {
    score_candidates(&mut candidates, config);
    candidates.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
    candidates
}
