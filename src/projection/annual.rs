//! Year-end values
//!
//! Runs after month 11 of each policy year (or after the lapse month) and
//! reads the state without changing it.

use serde::{Deserialize, Serialize};

use crate::currency::{materially_equal, RoundingRules};
use crate::error::{IllustrationError, Result};

use super::state::PolicyState;

/// Values recorded in the ledger for one policy year on one basis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearEndValues {
    pub acct_value: f64,
    pub av_gen: f64,
    pub av_sep: f64,
    pub av_loaned: f64,
    pub csv_net: f64,
    pub cv_7702: f64,
    pub death_benefit: f64,
    pub term_death_benefit: f64,
    pub specamt: f64,
    pub surrender_charge: f64,
    pub refundable_sales_load: f64,
    pub honeymoon_value: f64,
    pub loan_balance: f64,

    pub coi_charge: f64,
    pub net_coi_charge: f64,
    pub rider_charges: f64,
    pub policy_fees: f64,
    pub specamt_load: f64,
    pub acct_val_load: f64,
    pub premium_load: f64,
    pub premium_tax: f64,

    pub int_credited_gen: f64,
    pub int_credited_sep: f64,
    pub int_credited_loaned: f64,
    pub loan_int_accrued: f64,

    pub partial_q: f64,
    pub claims_gross: f64,
    pub claims_net: f64,

    pub ee_gross_pmt: f64,
    pub er_gross_pmt: f64,
    pub gross_pmt: f64,
    pub net_pmt: f64,
    pub forceout: f64,
    pub net_withdrawal: f64,
    pub withdrawal_ullage: f64,
    pub new_loan: f64,
    pub loan_ullage: f64,
    pub outlay: f64,
    pub target_premium: f64,
}

pub struct AnnualFinalizer<'a> {
    pub rounding: &'a RoundingRules,
}

impl<'a> AnnualFinalizer<'a> {
    pub fn new(rounding: &'a RoundingRules) -> Self {
        Self { rounding }
    }

    pub fn finalize(&self, state: &PolicyState, year: usize) -> Result<YearEndValues> {
        let av = state.total_av();
        let surrchg = self.rounding.surrender_charge.apply(state.surrender_charge());
        let refundable = state.refundable_sales_load();
        let honeymoon = state.honeymoon_value.unwrap_or(0.0);

        let mut csv_net = av - surrchg - state.loan_balance() + refundable;
        if let Some(hv) = state.honeymoon_value {
            csv_net = csv_net.max(hv);
        }
        if !state.mode.is_solving() {
            csv_net = csv_net.max(0.0);
        }

        let mut cv_7702 = av + refundable;
        if surrchg < 0.0 {
            cv_7702 -= surrchg;
        }
        if let Some(hv) = state.honeymoon_value {
            cv_7702 = cv_7702.max(hv);
        }

        let q = state.partial_q.get(year).copied().unwrap_or(0.0);
        // No claims are paid in the year of lapse.
        let claims_q = if state.lapsed { 0.0 } else { q };
        let claims_gross = claims_q * state.death_benefit;
        let claims_net = if materially_equal(state.death_benefit, av) {
            0.0
        } else {
            claims_gross - claims_q * av
        };

        let ytd = &state.ytd;
        let mut gross_pmt = ytd.gross_pmt;
        let mut net_pmt = ytd.net_pmt;
        let mut ee_gross_pmt = ytd.ee_pmt;
        if state.basis.is_current() {
            for month in 0..12 {
                let (gross, ee, er) = (ytd.monthly_gross[month], ytd.monthly_ee[month], ytd.monthly_er[month]);
                if !materially_equal(gross, ee + er) {
                    return Err(IllustrationError::PaymentSplitMismatch { year, month, gross, ee, er });
                }
            }
            gross_pmt -= ytd.forceout;
            net_pmt -= ytd.forceout;
            ee_gross_pmt -= ytd.forceout;
        }

        Ok(YearEndValues {
            acct_value: av,
            av_gen: state.av_gen,
            av_sep: state.av_sep,
            av_loaned: state.av_reg_ln + state.av_prf_ln,
            csv_net,
            cv_7702,
            death_benefit: state.death_benefit,
            term_death_benefit: state.term_death_benefit,
            specamt: state.specamt,
            surrender_charge: surrchg,
            refundable_sales_load: refundable,
            honeymoon_value: honeymoon,
            loan_balance: state.loan_balance(),

            coi_charge: ytd.coi,
            net_coi_charge: ytd.net_coi,
            rider_charges: ytd.rider_charges,
            policy_fees: ytd.policy_fees,
            specamt_load: ytd.specamt_load,
            acct_val_load: ytd.acct_val_load,
            premium_load: ytd.sales_load + ytd.tiered_premium_load,
            premium_tax: ytd.premium_tax,

            int_credited_gen: ytd.int_gen,
            int_credited_sep: ytd.int_sep,
            int_credited_loaned: ytd.int_loaned,
            loan_int_accrued: ytd.loan_int_accrued,

            partial_q: q,
            claims_gross,
            claims_net,

            ee_gross_pmt,
            er_gross_pmt: ytd.er_pmt,
            gross_pmt,
            net_pmt,
            forceout: ytd.forceout,
            net_withdrawal: ytd.withdrawal,
            withdrawal_ullage: ytd.withdrawal_ullage,
            new_loan: ytd.new_loan,
            loan_ullage: ytd.loan_ullage,
            outlay: gross_pmt - ytd.withdrawal - ytd.new_loan,
            target_premium: state.target_premium,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::RateTables;
    use crate::basis::Basis;
    use crate::policy::{Outlay, RunParameters, Schedules};
    use crate::projection::state::RunMode;
    use approx::assert_relative_eq;

    fn state(mode: RunMode, params: &RunParameters) -> PolicyState {
        let tables = RateTables::sample_product();
        let rounding = RoundingRules::default();
        let outlay = Outlay::requested(&Schedules::from_params(params), params);
        let mut s = PolicyState::initialize(Basis::Current, mode, params, &tables, outlay, false, &rounding).unwrap();
        s.begin_year(0, params, &tables, &rounding).unwrap();
        s
    }

    #[test]
    fn test_csv_floor_only_outside_solves() {
        let rounding = RoundingRules::default();
        let params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        let mut s = state(RunMode::Normal, &params);
        s.av_gen = 1_000.0;
        let normal = AnnualFinalizer::new(&rounding).finalize(&s, 0).unwrap();
        assert_eq!(normal.csv_net, 0.0);
        assert_relative_eq!(normal.surrender_charge, 3_000.0);
        assert_relative_eq!(normal.cv_7702, 1_000.0);

        s.mode = RunMode::Solving;
        let solving = AnnualFinalizer::new(&rounding).finalize(&s, 0).unwrap();
        assert_relative_eq!(solving.csv_net, -2_000.0);
    }

    #[test]
    fn test_honeymoon_floor() {
        let rounding = RoundingRules::default();
        let mut params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        params.honeymoon = true;
        let mut s = state(RunMode::Normal, &params);
        s.av_gen = 1_000.0;
        s.honeymoon_value = Some(950.0);
        let v = AnnualFinalizer::new(&rounding).finalize(&s, 0).unwrap();
        assert_relative_eq!(v.csv_net, 950.0);
        assert_relative_eq!(v.honeymoon_value, 950.0);
    }

    #[test]
    fn test_partial_mortality_claims() {
        let rounding = RoundingRules::default();
        let mut params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        params.use_partial_mortality = true;
        let mut s = state(RunMode::Normal, &params);
        s.av_gen = 10_000.0;
        s.death_benefit = 100_000.0;
        let v = AnnualFinalizer::new(&rounding).finalize(&s, 0).unwrap();
        assert!(0.0 < v.partial_q);
        assert_relative_eq!(v.claims_gross, v.partial_q * 100_000.0);
        assert_relative_eq!(v.claims_net, v.partial_q * 90_000.0, epsilon = 1e-9);

        // No claim beyond the account value when the two coincide.
        s.death_benefit = 10_000.0;
        let v = AnnualFinalizer::new(&rounding).finalize(&s, 0).unwrap();
        assert_eq!(v.claims_net, 0.0);
    }

    #[test]
    fn test_no_claims_in_lapse_year() {
        let rounding = RoundingRules::default();
        let mut params = RunParameters::level(45, 55, 100_000.0, 0.0);
        params.use_partial_mortality = true;
        let mut s = state(RunMode::Normal, &params);
        s.av_gen = 0.0;
        s.death_benefit = 100_000.0;
        s.lapsed = true;
        let v = AnnualFinalizer::new(&rounding).finalize(&s, 0).unwrap();
        assert!(0.0 < v.partial_q);
        assert_eq!(v.claims_gross, 0.0);
        assert_eq!(v.claims_net, 0.0);
    }

    #[test]
    fn test_forceout_comes_out_of_employee_premium() {
        let rounding = RoundingRules::default();
        let params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        let mut s = state(RunMode::Normal, &params);
        s.ytd.gross_pmt = 2_000.0;
        s.ytd.net_pmt = 1_880.0;
        s.ytd.ee_pmt = 1_500.0;
        s.ytd.er_pmt = 500.0;
        s.ytd.forceout = 300.0;
        let v = AnnualFinalizer::new(&rounding).finalize(&s, 0).unwrap();
        assert_relative_eq!(v.gross_pmt, 1_700.0);
        assert_relative_eq!(v.ee_gross_pmt, 1_200.0);
        assert_relative_eq!(v.gross_pmt, v.ee_gross_pmt + v.er_gross_pmt);
    }

    #[test]
    fn test_payment_split_checked_on_current_basis() {
        let rounding = RoundingRules::default();
        let params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        let mut s = state(RunMode::Normal, &params);
        s.ytd.monthly_gross[3] = 100.0;
        s.ytd.monthly_ee[3] = 60.0;
        s.ytd.monthly_er[3] = 30.0;
        let err = AnnualFinalizer::new(&rounding).finalize(&s, 0).unwrap_err();
        assert!(matches!(err, IllustrationError::PaymentSplitMismatch { year: 0, month: 3, .. }));
    }
}
