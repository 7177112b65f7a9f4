//! Per-life run parameters

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{IllustrationError, Result};

/// Death benefit option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DbOption {
    /// Level: death benefit is the specified amount
    A,
    /// Increasing: death benefit is the specified amount plus account value
    B,
}

/// Premium payment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Annual,
    Semiannual,
    Quarterly,
    Monthly,
}

impl Mode {
    /// Payments per year
    pub fn frequency(&self) -> usize {
        match self {
            Mode::Annual => 1,
            Mode::Semiannual => 2,
            Mode::Quarterly => 4,
            Mode::Monthly => 12,
        }
    }

    /// Whether a modal payment falls due in this policy month
    pub fn is_payment_month(&self, month: usize) -> bool {
        0 == month % (12 / self.frequency())
    }
}

/// Definition of life insurance under IRC 7702
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefnLifeIns {
    /// Guideline premium test
    Gpt,
    /// Cash value accumulation test
    Cvat,
}

/// Values carried over from an administration system for an inforce contract
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InforceValues {
    pub year: usize,
    pub month: usize,
    pub av_gen_acct: f64,
    pub av_sep_acct: f64,
    pub av_reg_ln: f64,
    pub av_prf_ln: f64,
    pub reg_ln_bal: f64,
    pub prf_ln_bal: f64,
    pub cum_pmts: f64,
    pub tax_basis: f64,
    pub cum_no_lapse_prem: f64,
    pub honeymoon_value: f64,
    pub is_mec: bool,
    /// Gross premium by contract year, from issue
    pub premium_history: Vec<f64>,
    /// Specified amount by policy year, from issue
    pub specamt_history: Vec<f64>,
    pub least_death_benefit: f64,
}

impl InforceValues {
    pub fn is_inforce(&self) -> bool {
        0 != self.year || 0 != self.month
    }
}

/// Immutable input for one life
///
/// Every vector runs by policy year from issue to maturity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunParameters {
    pub issue_age: usize,
    pub effective_date: NaiveDate,

    pub specamt: Vec<f64>,
    pub term_specamt: Vec<f64>,
    pub db_option: Vec<DbOption>,

    /// Employee modal payment
    pub ee_payment: Vec<f64>,
    pub ee_mode: Vec<Mode>,
    /// Employer modal payment
    pub er_payment: Vec<f64>,
    pub er_mode: Vec<Mode>,

    /// New loan requested at the start of each year
    pub loan: Vec<f64>,
    /// Withdrawal requested at the start of each year
    pub withdrawal: Vec<f64>,

    /// Annual rate applied to account value to offset the surrender charge
    pub cash_value_enhancement: Vec<f64>,

    /// Case assets for asset-tiered charges; zero means use this life's own account value
    pub case_assumed_assets: Vec<f64>,

    pub dumpin: f64,
    pub external_1035: f64,
    pub internal_1035: f64,
    pub external_1035_from_mec: bool,
    pub internal_1035_from_mec: bool,

    /// Proportion of net premium allocated to the separate account
    pub sep_acct_allocation: f64,

    pub honeymoon: bool,

    pub use_partial_mortality: bool,
    pub partial_mortality_multiplier: Vec<f64>,
    pub num_identical_lives: f64,

    pub defn_life_ins: DefnLifeIns,

    /// Premium tax rate of the issue jurisdiction
    pub premium_tax_rate: f64,
    /// Premium tax rate of the insurer's domicile
    pub domicile_premium_tax_rate: f64,
    /// First-year premium above which retaliatory tax applies
    pub retaliation_limit: f64,

    pub daily_interest_accounting: bool,

    pub inforce: InforceValues,
}

impl RunParameters {
    /// A new-business life with level specamt and a level annual employee premium
    pub fn level(issue_age: usize, length: usize, specamt: f64, annual_premium: f64) -> Self {
        Self {
            issue_age,
            effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            specamt: vec![specamt; length],
            term_specamt: vec![0.0; length],
            db_option: vec![DbOption::A; length],
            ee_payment: vec![annual_premium; length],
            ee_mode: vec![Mode::Annual; length],
            er_payment: vec![0.0; length],
            er_mode: vec![Mode::Annual; length],
            loan: vec![0.0; length],
            withdrawal: vec![0.0; length],
            cash_value_enhancement: vec![0.0; length],
            case_assumed_assets: vec![0.0; length],
            dumpin: 0.0,
            external_1035: 0.0,
            internal_1035: 0.0,
            external_1035_from_mec: false,
            internal_1035_from_mec: false,
            sep_acct_allocation: 0.0,
            honeymoon: false,
            use_partial_mortality: false,
            partial_mortality_multiplier: vec![1.0; length],
            num_identical_lives: 1.0,
            defn_life_ins: DefnLifeIns::Gpt,
            premium_tax_rate: 0.02,
            domicile_premium_tax_rate: 0.02,
            retaliation_limit: f64::INFINITY,
            daily_interest_accounting: false,
            inforce: InforceValues::default(),
        }
    }

    /// Check vector lengths and value ranges against the policy length
    pub fn validate(&self, length: usize) -> Result<()> {
        if 0 == length {
            return Err(IllustrationError::invalid_input(
                "issue_age",
                format!("{} is at or beyond maturity", self.issue_age),
            ));
        }

        let lengths: [(&'static str, usize); 12] = [
            ("specamt", self.specamt.len()),
            ("term_specamt", self.term_specamt.len()),
            ("db_option", self.db_option.len()),
            ("ee_payment", self.ee_payment.len()),
            ("ee_mode", self.ee_mode.len()),
            ("er_payment", self.er_payment.len()),
            ("er_mode", self.er_mode.len()),
            ("loan", self.loan.len()),
            ("withdrawal", self.withdrawal.len()),
            ("cash_value_enhancement", self.cash_value_enhancement.len()),
            ("case_assumed_assets", self.case_assumed_assets.len()),
            ("partial_mortality_multiplier", self.partial_mortality_multiplier.len()),
        ];
        for (what, actual) in lengths {
            if actual != length {
                return Err(IllustrationError::SizeMismatch {
                    what,
                    expected: length,
                    actual,
                });
            }
        }

        let non_negative: [(&'static str, &[f64]); 6] = [
            ("specamt", &self.specamt),
            ("term_specamt", &self.term_specamt),
            ("ee_payment", &self.ee_payment),
            ("er_payment", &self.er_payment),
            ("loan", &self.loan),
            ("withdrawal", &self.withdrawal),
        ];
        for (what, values) in non_negative {
            if let Some(&value) = values.iter().find(|&&v| v < 0.0) {
                return Err(IllustrationError::NegativeValue { what, value });
            }
        }
        for (what, value) in [
            ("dumpin", self.dumpin),
            ("external_1035", self.external_1035),
            ("internal_1035", self.internal_1035),
        ] {
            if value < 0.0 {
                return Err(IllustrationError::NegativeValue { what, value });
            }
        }

        if !(0.0..=1.0).contains(&self.sep_acct_allocation) {
            return Err(IllustrationError::DisallowedAllocation(format!(
                "separate-account allocation {} is outside [0, 1]",
                self.sep_acct_allocation
            )));
        }
        if self.num_identical_lives <= 0.0 {
            return Err(IllustrationError::invalid_input(
                "num_identical_lives",
                "must be positive",
            ));
        }
        if length <= self.inforce.year || 12 <= self.inforce.month {
            return Err(IllustrationError::invalid_input(
                "inforce",
                format!("year {} month {} is outside the policy", self.inforce.year, self.inforce.month),
            ));
        }
        Ok(())
    }

    pub fn gen_acct_allocation(&self) -> f64 {
        // 100% separate account is exactly zero general account.
        if 1.0 == self.sep_acct_allocation {
            0.0
        } else {
            1.0 - self.sep_acct_allocation
        }
    }

    /// Premium tax rate when first-year premium does or does not reach the retaliation limit
    pub fn premium_tax_load_rate(&self, exceeds_retaliation_limit: bool) -> f64 {
        if exceeds_retaliation_limit {
            self.premium_tax_rate.max(self.domicile_premium_tax_rate)
        } else {
            self.premium_tax_rate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_payment_months() {
        assert!(Mode::Annual.is_payment_month(0));
        assert!(!Mode::Annual.is_payment_month(6));
        assert!(Mode::Semiannual.is_payment_month(6));
        assert!(Mode::Quarterly.is_payment_month(9));
        assert!(!Mode::Quarterly.is_payment_month(10));
        assert!((0..12).all(|m| Mode::Monthly.is_payment_month(m)));
    }

    #[test]
    fn test_validate_size_mismatch() {
        let mut p = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        assert!(p.validate(55).is_ok());
        p.loan.pop();
        match p.validate(55) {
            Err(IllustrationError::SizeMismatch { what, expected, actual }) => {
                assert_eq!(what, "loan");
                assert_eq!(expected, 55);
                assert_eq!(actual, 54);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_validate_negative_and_allocation() {
        let mut p = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        p.withdrawal[3] = -1.0;
        assert!(matches!(p.validate(55), Err(IllustrationError::NegativeValue { what: "withdrawal", .. })));

        let mut p = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        p.sep_acct_allocation = 1.5;
        assert!(matches!(p.validate(55), Err(IllustrationError::DisallowedAllocation(_))));
    }

    #[test]
    fn test_premium_tax_rate_selection() {
        let mut p = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        p.premium_tax_rate = 0.02;
        p.domicile_premium_tax_rate = 0.035;
        assert_eq!(p.premium_tax_load_rate(true), 0.035);
        assert_eq!(p.premium_tax_load_rate(false), 0.02);
    }
}
