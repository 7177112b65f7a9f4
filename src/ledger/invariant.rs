//! Ledger values shared by every basis

use serde::{Deserialize, Serialize};

use crate::projection::YearEndValues;

/// Values common to all bases, taken from the current-basis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerInvariant {
    pub issue_age: usize,
    pub length: usize,

    pub ee_gross_pmt: Vec<f64>,
    pub er_gross_pmt: Vec<f64>,
    pub gross_pmt: Vec<f64>,
    pub forceout: Vec<f64>,
    pub net_withdrawal: Vec<f64>,
    pub new_loan: Vec<f64>,
    /// Gross payments less withdrawals and new loans
    pub outlay: Vec<f64>,
    pub specamt: Vec<f64>,
    pub target_premium: Vec<f64>,
    pub partial_mortality_q: Vec<f64>,
    /// Lives in force at the start of each year, with one trailing entry for maturity
    pub inforce_lives: Vec<f64>,

    /// First-year gross premium
    pub init_prem: f64,
    pub glp: f64,
    pub gsp: f64,
    pub seven_pay_premium: f64,

    pub is_mec: bool,
    pub mec_year: usize,
    pub mec_month: usize,

    /// Level annual employee premium that endows on the guaranteed basis
    pub guar_premium: Option<f64>,
}

impl LedgerInvariant {
    pub fn new(issue_age: usize, length: usize) -> Self {
        let zeros = vec![0.0; length];
        Self {
            issue_age,
            length,
            ee_gross_pmt: zeros.clone(),
            er_gross_pmt: zeros.clone(),
            gross_pmt: zeros.clone(),
            forceout: zeros.clone(),
            net_withdrawal: zeros.clone(),
            new_loan: zeros.clone(),
            outlay: zeros.clone(),
            specamt: zeros.clone(),
            target_premium: zeros.clone(),
            partial_mortality_q: zeros,
            inforce_lives: vec![0.0; length + 1],
            init_prem: 0.0,
            glp: 0.0,
            gsp: 0.0,
            seven_pay_premium: 0.0,
            is_mec: false,
            mec_year: length,
            mec_month: 11,
            guar_premium: None,
        }
    }

    pub fn record(&mut self, year: usize, v: &YearEndValues) {
        self.ee_gross_pmt[year] = v.ee_gross_pmt;
        self.er_gross_pmt[year] = v.er_gross_pmt;
        self.gross_pmt[year] = v.gross_pmt;
        self.forceout[year] = v.forceout;
        self.net_withdrawal[year] = v.net_withdrawal;
        self.new_loan[year] = v.new_loan;
        self.outlay[year] = v.outlay;
        self.target_premium[year] = v.target_premium;
        if 0 == year {
            self.init_prem = v.gross_pmt;
        }
    }

    /// Inforce lives from the partial-mortality rates and the number of identical lives
    pub fn set_inforce_lives(&mut self, partial_q: &[f64], num_lives: f64) {
        self.partial_mortality_q = partial_q.to_vec();
        self.inforce_lives = Vec::with_capacity(partial_q.len() + 1);
        let mut lives = num_lives;
        self.inforce_lives.push(lives);
        for q in partial_q {
            lives *= 1.0 - q;
            self.inforce_lives.push(lives);
        }
    }

    /// No lives remain in force after the year of lapse
    pub fn zero_inforce_after_lapse(&mut self, lapse_year: usize) {
        for lives in self.inforce_lives.iter_mut().skip(lapse_year + 1) {
            *lives = 0.0;
        }
    }

    fn columns_mut(&mut self) -> [&mut Vec<f64>; 9] {
        [
            &mut self.ee_gross_pmt,
            &mut self.er_gross_pmt,
            &mut self.gross_pmt,
            &mut self.forceout,
            &mut self.net_withdrawal,
            &mut self.new_loan,
            &mut self.outlay,
            &mut self.specamt,
            &mut self.target_premium,
        ]
    }

    fn columns(&self) -> [&Vec<f64>; 9] {
        [
            &self.ee_gross_pmt,
            &self.er_gross_pmt,
            &self.gross_pmt,
            &self.forceout,
            &self.net_withdrawal,
            &self.new_loan,
            &self.outlay,
            &self.specamt,
            &self.target_premium,
        ]
    }

    /// Add another life's values, each year weighted by that life's inforce count
    pub fn plus_eq(&mut self, other: &LedgerInvariant) {
        let weights = &other.inforce_lives;
        for (dst, src) in self.columns_mut().into_iter().zip(other.columns()) {
            super::add_weighted(dst, src, weights);
        }
        if self.inforce_lives.len() < other.inforce_lives.len() {
            self.inforce_lives.resize(other.inforce_lives.len(), 0.0);
        }
        for (dst, src) in self.inforce_lives.iter_mut().zip(&other.inforce_lives) {
            *dst += src;
        }
        let first = weights.first().copied().unwrap_or(0.0);
        self.init_prem += first * other.init_prem;
        self.glp += first * other.glp;
        self.gsp += first * other.gsp;
        self.seven_pay_premium += first * other.seven_pay_premium;
        self.is_mec |= other.is_mec;
        self.length = self.length.max(other.length);
    }
}
