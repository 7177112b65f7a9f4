//! Scalar product features and asset- or premium-tiered charge schedules

use serde::{Deserialize, Serialize};

use crate::error::{IllustrationError, Result};

/// Monthly deductions, applied in the order the product lists them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonthlyCharge {
    PolicyFee,
    SpecAmtLoad,
    RiderCharges,
    Coi,
    AcctValLoad,
}

/// How a tiered rate applies to an amount that spans several bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TierMethod {
    /// The whole amount takes the rate of the band it falls in
    Banded,
    /// Each slice of the amount takes the rate of its own band
    Stratified,
}

/// Rates by amount band
///
/// `limits[k]` is the upper edge of band `k`; the last band is unbounded, so
/// `rates.len() == limits.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredSchedule {
    pub method: TierMethod,
    pub limits: Vec<f64>,
    pub rates: Vec<f64>,
}

impl TieredSchedule {
    pub fn flat(rate: f64) -> Self {
        Self {
            method: TierMethod::Banded,
            limits: Vec::new(),
            rates: vec![rate],
        }
    }

    pub fn new(method: TierMethod, limits: Vec<f64>, rates: Vec<f64>) -> Result<Self> {
        if rates.len() != limits.len() + 1 {
            return Err(IllustrationError::SizeMismatch {
                what: "tiered rates",
                expected: limits.len() + 1,
                actual: rates.len(),
            });
        }
        if limits.windows(2).any(|w| w[1] <= w[0]) || limits.iter().any(|&l| l <= 0.0) {
            return Err(IllustrationError::invalid_input(
                "tier limits",
                "must be positive and strictly increasing",
            ));
        }
        Ok(Self { method, limits, rates })
    }

    /// Whether the rate depends on the amount at all
    pub fn is_tiered(&self) -> bool {
        !self.limits.is_empty()
    }

    /// Total charge on `amount`
    pub fn charge(&self, amount: f64) -> f64 {
        let amount = amount.max(0.0);
        match self.method {
            TierMethod::Banded => amount * self.band_rate(amount),
            TierMethod::Stratified => {
                let mut total = 0.0;
                let mut floor = 0.0;
                for (k, &rate) in self.rates.iter().enumerate() {
                    let ceiling = self.limits.get(k).copied().unwrap_or(f64::INFINITY);
                    if amount <= floor {
                        break;
                    }
                    total += rate * (amount.min(ceiling) - floor);
                    floor = ceiling;
                }
                total
            }
        }
    }

    /// Effective rate on `amount`
    pub fn rate_for(&self, amount: f64) -> f64 {
        if amount <= 0.0 {
            return self.rates.first().copied().unwrap_or(0.0);
        }
        match self.method {
            TierMethod::Banded => self.band_rate(amount),
            TierMethod::Stratified => self.charge(amount) / amount,
        }
    }

    fn band_rate(&self, amount: f64) -> f64 {
        let band = self.limits.iter().take_while(|&&limit| limit <= amount).count();
        self.rates.get(band).copied().unwrap_or(0.0)
    }
}

/// Product-level scalar features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFeatures {
    pub name: String,

    /// Attained age at which the contract endows
    pub maturity_age: usize,

    /// Specified amounts at or above which COI bands 1 and 2 apply
    pub coi_band_limits: [f64; 2],

    /// Multiplicative COI retention, e.g. 1.05 for 5%
    pub coi_retention_multiplier: f64,

    /// Additive COI retention, per dollar of NAAR
    pub coi_retention_additive: f64,

    pub allow_gen_acct: bool,
    pub allow_sep_acct: bool,

    /// Years during which the no-lapse guarantee can keep the contract in force
    pub no_lapse_years: usize,

    /// No-lapse guarantee only for death-benefit option A
    pub no_lapse_option_a_only: bool,

    /// First policy year in which preferred loans are available
    pub preferred_loan_year: Option<usize>,

    pub min_specamt: f64,

    /// Term rider coverage ends at this attained age
    pub term_rider_max_age: usize,

    /// Target premium stays at its issue value after specamt changes
    pub target_premium_fixed_at_issue: bool,

    /// Add a surrender-charge layer on specamt increases
    pub surrender_charge_on_increase: bool,

    /// Fraction of unloaned account value available for a new loan
    pub max_loan_av_mult: f64,

    pub deduction_order: Vec<MonthlyCharge>,

    /// Current M&E charge by case assets (annual rate)
    pub tiered_m_and_e: TieredSchedule,

    /// Asset-based compensation by case assets (annual rate)
    pub tiered_asset_comp: TieredSchedule,

    /// Separate-account load after deduction by case assets (annual rate)
    pub tiered_sep_acct_load: TieredSchedule,

    /// Additional premium load by premium paid in the policy year
    pub tiered_premium_load: TieredSchedule,
}

impl Default for ProductFeatures {
    fn default() -> Self {
        Self {
            name: "sample_ul".to_string(),
            maturity_age: 100,
            coi_band_limits: [500_000.0, 1_000_000.0],
            coi_retention_multiplier: 1.05,
            coi_retention_additive: 0.0,
            allow_gen_acct: true,
            allow_sep_acct: true,
            no_lapse_years: 5,
            no_lapse_option_a_only: false,
            preferred_loan_year: Some(10),
            min_specamt: 50_000.0,
            term_rider_max_age: 70,
            target_premium_fixed_at_issue: false,
            surrender_charge_on_increase: true,
            max_loan_av_mult: 0.9,
            deduction_order: vec![
                MonthlyCharge::PolicyFee,
                MonthlyCharge::SpecAmtLoad,
                MonthlyCharge::RiderCharges,
                MonthlyCharge::Coi,
                MonthlyCharge::AcctValLoad,
            ],
            tiered_m_and_e: TieredSchedule {
                method: TierMethod::Banded,
                limits: vec![10_000_000.0, 50_000_000.0],
                rates: vec![0.0090, 0.0070, 0.0050],
            },
            tiered_asset_comp: TieredSchedule::flat(0.0),
            tiered_sep_acct_load: TieredSchedule {
                method: TierMethod::Stratified,
                limits: vec![1_000_000.0],
                rates: vec![0.0010, 0.0005],
            },
            tiered_premium_load: TieredSchedule::flat(0.0),
        }
    }
}

impl ProductFeatures {
    /// Policy length in years for a given issue age
    pub fn policy_length(&self, issue_age: usize) -> usize {
        self.maturity_age.saturating_sub(issue_age)
    }

    /// COI band for a specified amount
    pub fn coi_band(&self, specamt: f64) -> usize {
        self.coi_band_limits
            .iter()
            .take_while(|&&limit| limit <= specamt)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_banded_schedule() {
        let s = TieredSchedule::new(TierMethod::Banded, vec![100.0, 200.0], vec![0.03, 0.02, 0.01]).unwrap();
        assert_relative_eq!(s.rate_for(50.0), 0.03);
        assert_relative_eq!(s.rate_for(100.0), 0.02);
        assert_relative_eq!(s.charge(250.0), 2.5);
    }

    #[test]
    fn test_stratified_schedule() {
        let s = TieredSchedule::new(TierMethod::Stratified, vec![100.0, 200.0], vec![0.03, 0.02, 0.01]).unwrap();
        // 100 at 3% + 100 at 2% + 50 at 1%
        assert_relative_eq!(s.charge(250.0), 5.5, epsilon = 1e-12);
        assert_relative_eq!(s.rate_for(250.0), 0.022, epsilon = 1e-12);
        assert_relative_eq!(s.charge(40.0), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn test_schedule_validation() {
        assert!(TieredSchedule::new(TierMethod::Banded, vec![100.0], vec![0.01]).is_err());
        assert!(TieredSchedule::new(TierMethod::Banded, vec![200.0, 100.0], vec![0.0; 3]).is_err());
    }

    #[test]
    fn test_coi_band() {
        let p = ProductFeatures::default();
        assert_eq!(p.coi_band(100_000.0), 0);
        assert_eq!(p.coi_band(500_000.0), 1);
        assert_eq!(p.coi_band(2_000_000.0), 2);
        assert_eq!(p.policy_length(45), 55);
    }
}
