//! Basis-specific ledger values

use serde::{Deserialize, Serialize};

use crate::basis::Basis;
use crate::projection::YearEndValues;

/// Values that differ by basis, one entry per policy year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerVariant {
    pub basis: Basis,

    pub acct_value: Vec<f64>,
    pub av_gen: Vec<f64>,
    pub av_sep: Vec<f64>,
    pub av_loaned: Vec<f64>,
    pub csv_net: Vec<f64>,
    pub cv_7702: Vec<f64>,
    pub death_benefit: Vec<f64>,
    pub term_death_benefit: Vec<f64>,
    pub specamt: Vec<f64>,
    pub surrender_charge: Vec<f64>,
    pub honeymoon_value: Vec<f64>,
    pub loan_balance: Vec<f64>,

    pub coi_charge: Vec<f64>,
    pub net_coi_charge: Vec<f64>,
    pub rider_charges: Vec<f64>,
    pub policy_fees: Vec<f64>,
    pub specamt_load: Vec<f64>,
    pub acct_val_load: Vec<f64>,
    pub premium_load: Vec<f64>,
    pub premium_tax: Vec<f64>,

    pub int_credited_gen: Vec<f64>,
    pub int_credited_sep: Vec<f64>,
    pub int_credited_loaned: Vec<f64>,
    pub loan_int_accrued: Vec<f64>,

    pub claims_gross: Vec<f64>,
    pub claims_net: Vec<f64>,
    pub net_pmt: Vec<f64>,
    pub withdrawal_ullage: Vec<f64>,
    pub loan_ullage: Vec<f64>,

    /// Policy year and month of lapse; the last month of the policy if none
    pub lapse_year: usize,
    pub lapse_month: usize,
    pub is_mec: bool,
    pub mec_year: usize,
    pub mec_month: usize,
}

impl LedgerVariant {
    pub fn new(basis: Basis, length: usize) -> Self {
        let zeros = vec![0.0; length];
        Self {
            basis,
            acct_value: zeros.clone(),
            av_gen: zeros.clone(),
            av_sep: zeros.clone(),
            av_loaned: zeros.clone(),
            csv_net: zeros.clone(),
            cv_7702: zeros.clone(),
            death_benefit: zeros.clone(),
            term_death_benefit: zeros.clone(),
            specamt: zeros.clone(),
            surrender_charge: zeros.clone(),
            honeymoon_value: zeros.clone(),
            loan_balance: zeros.clone(),
            coi_charge: zeros.clone(),
            net_coi_charge: zeros.clone(),
            rider_charges: zeros.clone(),
            policy_fees: zeros.clone(),
            specamt_load: zeros.clone(),
            acct_val_load: zeros.clone(),
            premium_load: zeros.clone(),
            premium_tax: zeros.clone(),
            int_credited_gen: zeros.clone(),
            int_credited_sep: zeros.clone(),
            int_credited_loaned: zeros.clone(),
            loan_int_accrued: zeros.clone(),
            claims_gross: zeros.clone(),
            claims_net: zeros.clone(),
            net_pmt: zeros.clone(),
            withdrawal_ullage: zeros.clone(),
            loan_ullage: zeros,
            lapse_year: length,
            lapse_month: 11,
            is_mec: false,
            mec_year: length,
            mec_month: 11,
        }
    }

    pub fn len(&self) -> usize {
        self.acct_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acct_value.is_empty()
    }

    pub fn record(&mut self, year: usize, v: &YearEndValues) {
        self.acct_value[year] = v.acct_value;
        self.av_gen[year] = v.av_gen;
        self.av_sep[year] = v.av_sep;
        self.av_loaned[year] = v.av_loaned;
        self.csv_net[year] = v.csv_net;
        self.cv_7702[year] = v.cv_7702;
        self.death_benefit[year] = v.death_benefit;
        self.term_death_benefit[year] = v.term_death_benefit;
        self.specamt[year] = v.specamt;
        self.surrender_charge[year] = v.surrender_charge;
        self.honeymoon_value[year] = v.honeymoon_value;
        self.loan_balance[year] = v.loan_balance;
        self.coi_charge[year] = v.coi_charge;
        self.net_coi_charge[year] = v.net_coi_charge;
        self.rider_charges[year] = v.rider_charges;
        self.policy_fees[year] = v.policy_fees;
        self.specamt_load[year] = v.specamt_load;
        self.acct_val_load[year] = v.acct_val_load;
        self.premium_load[year] = v.premium_load;
        self.premium_tax[year] = v.premium_tax;
        self.int_credited_gen[year] = v.int_credited_gen;
        self.int_credited_sep[year] = v.int_credited_sep;
        self.int_credited_loaned[year] = v.int_credited_loaned;
        self.loan_int_accrued[year] = v.loan_int_accrued;
        self.claims_gross[year] = v.claims_gross;
        self.claims_net[year] = v.claims_net;
        self.net_pmt[year] = v.net_pmt;
        self.withdrawal_ullage[year] = v.withdrawal_ullage;
        self.loan_ullage[year] = v.loan_ullage;
    }

    fn columns_mut(&mut self) -> [&mut Vec<f64>; 29] {
        [
            &mut self.acct_value,
            &mut self.av_gen,
            &mut self.av_sep,
            &mut self.av_loaned,
            &mut self.csv_net,
            &mut self.cv_7702,
            &mut self.death_benefit,
            &mut self.term_death_benefit,
            &mut self.specamt,
            &mut self.surrender_charge,
            &mut self.honeymoon_value,
            &mut self.loan_balance,
            &mut self.coi_charge,
            &mut self.net_coi_charge,
            &mut self.rider_charges,
            &mut self.policy_fees,
            &mut self.specamt_load,
            &mut self.acct_val_load,
            &mut self.premium_load,
            &mut self.premium_tax,
            &mut self.int_credited_gen,
            &mut self.int_credited_sep,
            &mut self.int_credited_loaned,
            &mut self.loan_int_accrued,
            &mut self.claims_gross,
            &mut self.claims_net,
            &mut self.net_pmt,
            &mut self.withdrawal_ullage,
            &mut self.loan_ullage,
        ]
    }

    fn columns(&self) -> [&Vec<f64>; 29] {
        [
            &self.acct_value,
            &self.av_gen,
            &self.av_sep,
            &self.av_loaned,
            &self.csv_net,
            &self.cv_7702,
            &self.death_benefit,
            &self.term_death_benefit,
            &self.specamt,
            &self.surrender_charge,
            &self.honeymoon_value,
            &self.loan_balance,
            &self.coi_charge,
            &self.net_coi_charge,
            &self.rider_charges,
            &self.policy_fees,
            &self.specamt_load,
            &self.acct_val_load,
            &self.premium_load,
            &self.premium_tax,
            &self.int_credited_gen,
            &self.int_credited_sep,
            &self.int_credited_loaned,
            &self.loan_int_accrued,
            &self.claims_gross,
            &self.claims_net,
            &self.net_pmt,
            &self.withdrawal_ullage,
            &self.loan_ullage,
        ]
    }

    /// Add another life's values, each year weighted by that life's inforce count
    pub fn plus_eq(&mut self, other: &LedgerVariant, weights: &[f64]) {
        for (dst, src) in self.columns_mut().into_iter().zip(other.columns()) {
            super::add_weighted(dst, src, weights);
        }
        // A composite lapses when its last life lapses.
        if (self.lapse_year, self.lapse_month) < (other.lapse_year, other.lapse_month) {
            self.lapse_year = other.lapse_year;
            self.lapse_month = other.lapse_month;
        }
        self.is_mec |= other.is_mec;
    }
}
