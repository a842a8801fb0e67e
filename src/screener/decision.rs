//! GO / NO-GO call on the best stable candidate

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::GoNoGoConfig;
use crate::core::Candidate;

/// Whether today's best stable trade is worth taking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    /// Top stable candidate clears every threshold
    Go(Candidate),
    /// Top stable candidate falls short, or there is none
    NoGo(Option<Candidate>),
}

impl Verdict {
    pub fn is_go(&self) -> bool {
        matches!(self, Verdict::Go(_))
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Verdict::Go(c) => Some(c),
            Verdict::NoGo(c) => c.as_ref(),
        }
    }
}

/// Highest-scoring stable candidate; the first one wins ties
pub fn top_stable(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates
        .iter()
        .filter(|c| c.is_stable)
        .reduce(|best, c| {
            if c.composite_score > best.composite_score {
                c
            } else {
                best
            }
        })
}

/// Judge the top stable candidate against the GO thresholds
pub fn decide(candidates: &[Candidate], config: &GoNoGoConfig, yield_ceiling: f64) -> Verdict {
    let Some(top) = top_stable(candidates) else {
        return Verdict::NoGo(None);
    };

    let meets = top.composite_score >= config.min_composite_score
        && top.pop >= config.min_pop
        && top.cushion >= config.min_cushion
        && top.annualized_yield <= yield_ceiling;

    if meets {
        Verdict::Go(top.clone())
    } else {
        Verdict::NoGo(Some(top.clone()))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = |c: &Candidate| {
            format!(
                "top stable candidate {} {} ${:.2} scores {:.1} with {:.0}% PoP and {:.1}% cushion",
                c.ticker,
                c.expiry,
                c.strike,
                c.composite_score,
                c.pop * 100.0,
                c.cushion * 100.0
            )
        };

        match self {
            Verdict::Go(c) => write!(f, "GO - {}. Looks worthy of a trade.", summary(c)),
            Verdict::NoGo(Some(c)) => write!(
                f,
                "NO GO - {}, but does not meet thresholds. Better to wait for a more optimal day to trade.",
                summary(c)
            ),
            Verdict::NoGo(None) => write!(
                f,
                "NO GO - No stable candidates passed filters today. Better to wait for a more optimal day to trade."
            ),
        }
    }
}
