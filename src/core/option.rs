//! Option contract definitions
//!
//! Option kind and the wheel leg each kind is written as.

use serde::{Deserialize, Serialize};

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Payoff direction: +1 for call, -1 for put
    pub fn phi(&self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// The wheel leg a short position in this kind represents
    pub fn leg(&self) -> LegType {
        match self {
            OptionType::Call => LegType::CoveredCall,
            OptionType::Put => LegType::CashSecuredPut,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OptionType::Call => "CALL",
            OptionType::Put => "PUT",
        }
    }
}

/// Wheel leg: sell puts against cash, then calls against assigned shares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegType {
    /// Short put backed by strike x 100 in cash
    CashSecuredPut,
    /// Short call against 100 owned shares
    CoveredCall,
}

impl LegType {
    /// Short label used in tables ("CSP" / "CC")
    pub fn short_label(&self) -> &'static str {
        match self {
            LegType::CashSecuredPut => "CSP",
            LegType::CoveredCall => "CC",
        }
    }
}

/// Shares per equity option contract
pub const CONTRACT_MULTIPLIER: f64 = 100.0;
