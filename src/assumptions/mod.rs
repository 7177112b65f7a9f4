//! Product rate tables and scalar product features
//!
//! Rate tables are immutable once built and shared read-only by every
//! (life, basis) run. Each table is indexed by attained age or by policy
//! duration; lookups past the end of a table reuse its last value, so a
//! level rate is stored as a one-element table.

mod interest;
mod mortality;
mod product;
mod sample;

pub use interest::{annual_from_monthly, monthly_discount, monthly_from_annual, period_from_annual};
pub use mortality::{MonthlyConversion, MortalityCurve};
pub use product::{MonthlyCharge, ProductFeatures, TierMethod, TieredSchedule};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::basis::Basis;
use crate::error::{IllustrationError, Result};

/// Identifies one rate table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RateKey {
    /// Monthly COI rate per dollar of NAAR, specamt band 0
    CoiBand0,
    CoiBand1,
    CoiBand2,
    /// Annual effective general-account credited rate
    GenAcctInterest,
    /// Annual gross separate-account return before asset charges
    SepAcctGrossInterest,
    /// Annual M&E charge used when the rate is not asset-tiered
    SepAcctMandE,
    RegLoanCredited,
    RegLoanDue,
    PrfLoanCredited,
    PrfLoanDue,
    /// Annual rate at which the honeymoon value accumulates
    HoneymoonRate,
    /// Load on premium up to target
    TargetPremiumLoad,
    /// Load on premium in excess of target
    ExcessPremiumLoad,
    MonthlyPolicyFee,
    AnnualPolicyFee,
    /// Monthly load per dollar of specified amount
    SpecAmtLoad,
    /// Monthly load per dollar of account value
    AcctValLoad,
    /// Surrender-charge layer per dollar of specamt, by duration since the layer began
    SurrChgSpecAmtFactor,
    SurrChgAvMult,
    SurrChgPremMult,
    /// Proportion of cumulative sales load refunded on surrender
    RefundableSalesLoad,
    /// Annual target premium per dollar of specamt, by issue age
    TargetPremiumRate,
    MinPremiumRate,
    /// 7702 corridor factor by attained age
    Corridor,
    /// Monthly term rider COI rate
    TermCoi,
    /// Annual 7702 mortality
    Qc7702,
    /// Annual mortality for partial-mortality decrements
    PartialMortality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indexing {
    AttainedAge,
    Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RateValues {
    Invariant(Vec<f64>),
    ByBasis { current: Vec<f64>, guaranteed: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSeries {
    pub indexing: Indexing,
    pub values: RateValues,
}

impl RateSeries {
    pub fn invariant(indexing: Indexing, values: Vec<f64>) -> Self {
        Self {
            indexing,
            values: RateValues::Invariant(values),
        }
    }

    pub fn by_basis(indexing: Indexing, current: Vec<f64>, guaranteed: Vec<f64>) -> Self {
        Self {
            indexing,
            values: RateValues::ByBasis { current, guaranteed },
        }
    }

    /// A single rate for every duration and basis
    pub fn level(rate: f64) -> Self {
        Self::invariant(Indexing::Duration, vec![rate])
    }

    /// A single rate per basis for every duration
    pub fn level_by_basis(current: f64, guaranteed: f64) -> Self {
        Self::by_basis(Indexing::Duration, vec![current], vec![guaranteed])
    }

    fn at(&self, basis: Basis, index: usize) -> Option<f64> {
        fn clamped(v: &[f64], index: usize) -> Option<f64> {
            v.get(index.min(v.len().checked_sub(1)?)).copied()
        }
        match &self.values {
            RateValues::Invariant(v) => clamped(v, index),
            RateValues::ByBasis { current, guaranteed } => {
                Some(basis.select(clamped(current, index)?, clamped(guaranteed, index)?))
            }
        }
    }
}

/// Immutable product data behind a key-based query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTables {
    pub product: ProductFeatures,
    tables: HashMap<RateKey, RateSeries>,
}

impl RateTables {
    pub fn new(product: ProductFeatures) -> Self {
        Self {
            product,
            tables: HashMap::new(),
        }
    }

    /// Builder-style insertion
    pub fn with_table(mut self, key: RateKey, series: RateSeries) -> Self {
        self.tables.insert(key, series);
        self
    }

    pub fn insert(&mut self, key: RateKey, series: RateSeries) {
        self.tables.insert(key, series);
    }

    pub fn has(&self, key: RateKey) -> bool {
        self.tables.contains_key(&key)
    }

    /// Built-in sample product used by tests and the command-line tools
    pub fn sample_product() -> Self {
        sample::sample_tables()
    }

    /// Rate for one policy duration
    pub fn rate(&self, key: RateKey, basis: Basis, issue_age: usize, duration: usize) -> Result<f64> {
        let series = self
            .tables
            .get(&key)
            .ok_or_else(|| IllustrationError::MissingRate(format!("{:?}", key)))?;
        let index = match series.indexing {
            Indexing::AttainedAge => issue_age + duration,
            Indexing::Duration => duration,
        };
        series
            .at(basis, index)
            .ok_or_else(|| IllustrationError::MissingRate(format!("{:?} is empty", key)))
    }

    /// Rates for durations `0..len`
    pub fn series(&self, key: RateKey, basis: Basis, issue_age: usize, len: usize) -> Result<Vec<f64>> {
        (0..len).map(|t| self.rate(key, basis, issue_age, t)).collect()
    }

    /// COI table for the band selected by `specamt`
    pub fn coi_band_key(&self, specamt: f64) -> RateKey {
        match self.product.coi_band(specamt) {
            0 => RateKey::CoiBand0,
            1 => RateKey::CoiBand1,
            _ => RateKey::CoiBand2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_missing_rate_is_error() {
        let tables = RateTables::new(ProductFeatures::default());
        let err = tables.rate(RateKey::Corridor, Basis::Current, 45, 0).unwrap_err();
        assert!(matches!(err, IllustrationError::MissingRate(_)));
    }

    #[test]
    fn test_indexing_and_clamping() {
        let tables = RateTables::new(ProductFeatures::default())
            .with_table(
                RateKey::Corridor,
                RateSeries::invariant(Indexing::AttainedAge, (0..=100).map(|a| a as f64).collect()),
            )
            .with_table(RateKey::MonthlyPolicyFee, RateSeries::level_by_basis(5.0, 8.0));

        assert_eq!(tables.rate(RateKey::Corridor, Basis::Current, 45, 3).unwrap(), 48.0);
        // Past the end of the table the last value is reused.
        assert_eq!(tables.rate(RateKey::Corridor, Basis::Current, 90, 30).unwrap(), 100.0);
        assert_eq!(tables.rate(RateKey::MonthlyPolicyFee, Basis::Guaranteed, 45, 20).unwrap(), 8.0);
        assert_relative_eq!(tables.rate(RateKey::MonthlyPolicyFee, Basis::Midpoint, 45, 0).unwrap(), 6.5);
    }

    #[test]
    fn test_sample_product_is_complete() {
        let tables = RateTables::sample_product();
        let len = tables.product.policy_length(45);
        for basis in Basis::ALL {
            let coi = tables.series(tables.coi_band_key(100_000.0), basis, 45, len).unwrap();
            assert_eq!(coi.len(), len);
            assert!(coi.iter().all(|&q| (0.0..=1.0).contains(&q)));
        }
        let corridor = tables.series(RateKey::Corridor, Basis::Current, 45, len).unwrap();
        assert!(corridor.windows(2).all(|w| w[1] <= w[0]));
    }
}
