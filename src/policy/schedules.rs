//! Payment, loan, withdrawal and specified-amount schedules
//!
//! [`Schedules`] is the editable, yearly form that solves modify.
//! [`Outlay`] is the form a simulation consumes: payments by month, plus
//! the amounts actually realized once a run has written them back. The
//! outlay realized on the current basis overrides the requested one on
//! every other basis. Its specified amount stays as requested: each basis
//! applies option A withdrawal reductions from the realized withdrawals.

use serde::{Deserialize, Serialize};

use super::data::{DbOption, Mode, RunParameters};

/// Editable yearly schedules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedules {
    pub ee_payment: Vec<f64>,
    pub ee_mode: Vec<Mode>,
    pub er_payment: Vec<f64>,
    pub er_mode: Vec<Mode>,
    pub specamt: Vec<f64>,
    pub term_specamt: Vec<f64>,
    pub db_option: Vec<DbOption>,
    pub loan: Vec<f64>,
    pub withdrawal: Vec<f64>,
}

impl Schedules {
    pub fn from_params(params: &RunParameters) -> Self {
        Self {
            ee_payment: params.ee_payment.clone(),
            ee_mode: params.ee_mode.clone(),
            er_payment: params.er_payment.clone(),
            er_mode: params.er_mode.clone(),
            specamt: params.specamt.clone(),
            term_specamt: params.term_specamt.clone(),
            db_option: params.db_option.clone(),
            loan: params.loan.clone(),
            withdrawal: params.withdrawal.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.specamt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specamt.is_empty()
    }
}

/// Schedules as seen by a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlay {
    /// Employee gross payment by month since issue
    pub ee_monthly: Vec<f64>,
    /// Employer gross payment by month since issue
    pub er_monthly: Vec<f64>,
    pub loan: Vec<f64>,
    pub withdrawal: Vec<f64>,
    pub specamt: Vec<f64>,
    pub term_specamt: Vec<f64>,
    pub db_option: Vec<DbOption>,
    pub dumpin: f64,
    pub external_1035: f64,
    pub internal_1035: f64,
}

impl Outlay {
    /// Expand modal schedules into monthly payments
    pub fn requested(schedules: &Schedules, params: &RunParameters) -> Self {
        let len = schedules.len();
        let mut ee_monthly = vec![0.0; 12 * len];
        let mut er_monthly = vec![0.0; 12 * len];
        for year in 0..len {
            for month in 0..12 {
                if schedules.ee_mode[year].is_payment_month(month) {
                    ee_monthly[12 * year + month] = schedules.ee_payment[year];
                }
                if schedules.er_mode[year].is_payment_month(month) {
                    er_monthly[12 * year + month] = schedules.er_payment[year];
                }
            }
        }
        Self {
            ee_monthly,
            er_monthly,
            loan: schedules.loan.clone(),
            withdrawal: schedules.withdrawal.clone(),
            specamt: schedules.specamt.clone(),
            term_specamt: schedules.term_specamt.clone(),
            db_option: schedules.db_option.clone(),
            dumpin: params.dumpin,
            external_1035: params.external_1035,
            internal_1035: params.internal_1035,
        }
    }

    pub fn len(&self) -> usize {
        self.specamt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specamt.is_empty()
    }

    pub fn ee(&self, year: usize, month: usize) -> f64 {
        self.ee_monthly[12 * year + month]
    }

    pub fn er(&self, year: usize, month: usize) -> f64 {
        self.er_monthly[12 * year + month]
    }

    /// Gross payments planned for one policy year, including issue-date amounts in year 0
    pub fn planned_year_premium(&self, year: usize) -> f64 {
        let months = 12 * year..12 * (year + 1);
        let modal: f64 = self.ee_monthly[months.clone()].iter().sum::<f64>()
            + self.er_monthly[months].iter().sum::<f64>();
        if 0 == year {
            modal + self.dumpin + self.external_1035 + self.internal_1035
        } else {
            modal
        }
    }

    /// Scale dump-in and 1035 amounts when only part of them can be accepted
    pub fn scale_issue_amounts(&mut self, factor: f64) {
        self.dumpin *= factor;
        self.external_1035 *= factor;
        self.internal_1035 *= factor;
    }

    /// Zero every payment, loan and withdrawal after the given month since issue
    pub fn cease_after(&mut self, months_since_issue: usize) {
        let first = months_since_issue + 1;
        for p in self.ee_monthly.iter_mut().skip(first) {
            *p = 0.0;
        }
        for p in self.er_monthly.iter_mut().skip(first) {
            *p = 0.0;
        }
        let first_year = first.div_ceil(12);
        for v in self.loan.iter_mut().skip(first_year) {
            *v = 0.0;
        }
        for v in self.withdrawal.iter_mut().skip(first_year) {
            *v = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_expansion() {
        let mut params = RunParameters::level(45, 3, 100_000.0, 600.0);
        params.ee_mode = vec![Mode::Annual, Mode::Quarterly, Mode::Monthly];
        params.er_payment = vec![0.0, 0.0, 10.0];
        params.er_mode = vec![Mode::Annual; 3];
        params.dumpin = 1_000.0;
        let outlay = Outlay::requested(&Schedules::from_params(&params), &params);

        assert_eq!(outlay.ee(0, 0), 600.0);
        assert_eq!(outlay.ee(0, 1), 0.0);
        assert_eq!(outlay.ee(1, 3), 600.0);
        assert_eq!(outlay.ee(1, 4), 0.0);
        assert_eq!(outlay.ee(2, 7), 600.0);
        assert_eq!(outlay.er(2, 0), 10.0);
        assert_eq!(outlay.planned_year_premium(0), 1_600.0);
        assert_eq!(outlay.planned_year_premium(1), 2_400.0);
    }

    #[test]
    fn test_cease_after() {
        let params = RunParameters::level(45, 3, 100_000.0, 600.0);
        let mut outlay = Outlay::requested(&Schedules::from_params(&params), &params);
        outlay.loan = vec![1.0, 2.0, 3.0];
        outlay.cease_after(13);
        assert_eq!(outlay.ee(1, 0), 600.0);
        assert_eq!(outlay.planned_year_premium(2), 0.0);
        assert_eq!(outlay.loan, vec![1.0, 2.0, 0.0]);
    }
}
