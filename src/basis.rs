//! Pricing bases and ledger types

use serde::{Deserialize, Serialize};

/// Set of interest and charge assumptions under which a policy is projected
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// Current (illustrated) rates
    Current,
    /// Contractually guaranteed rates
    Guaranteed,
    /// Mean of current and guaranteed rates
    Midpoint,
}

impl Basis {
    pub const ALL: [Basis; 3] = [Basis::Current, Basis::Guaranteed, Basis::Midpoint];

    pub fn is_current(&self) -> bool {
        matches!(self, Basis::Current)
    }

    /// Short label used in logs and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            Basis::Current => "curr",
            Basis::Guaranteed => "guar",
            Basis::Midpoint => "mdpt",
        }
    }

    /// Pick the value for this basis from a current/guaranteed pair
    pub fn select(&self, current: f64, guaranteed: f64) -> f64 {
        match self {
            Basis::Current => current,
            Basis::Guaranteed => guaranteed,
            Basis::Midpoint => 0.5 * (current + guaranteed),
        }
    }

    /// Whether asset-tiered dynamic rates are recomputed each month
    pub fn uses_dynamic_rates(&self) -> bool {
        match self {
            Basis::Current => true,
            Basis::Guaranteed | Basis::Midpoint => false,
        }
    }

    /// Whether a honeymoon value is projected
    pub fn has_honeymoon(&self) -> bool {
        match self {
            Basis::Current => true,
            Basis::Guaranteed | Basis::Midpoint => false,
        }
    }
}

/// Regulatory treatment of an illustration, which determines its bases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerType {
    /// Subject to the illustration regulation: current, guaranteed and midpoint
    IllustrationReg,
    /// Not subject to the illustration regulation: current and guaranteed only
    NonIllustrationReg,
}

impl LedgerType {
    /// Bases to run, current first
    pub fn run_bases(&self) -> &'static [Basis] {
        match self {
            LedgerType::IllustrationReg => &[Basis::Current, Basis::Guaranteed, Basis::Midpoint],
            LedgerType::NonIllustrationReg => &[Basis::Current, Basis::Guaranteed],
        }
    }

    pub fn is_subject_to_ill_reg(&self) -> bool {
        matches!(self, LedgerType::IllustrationReg)
    }

    pub fn allows(&self, basis: Basis) -> bool {
        self.run_bases().contains(&basis)
    }
}
