//! One month's transactions
//!
//! [`MonthlyEngine::apply`] takes a [`PolicyState`] by value, applies the
//! month's transactions in a fixed order and hands the state back with the
//! assets used for next month's tiered rates:
//!
//! 1. counter checks
//! 2. asset-tiered rates (current basis only)
//! 3. premium, limited by the guideline premium limit, net of loads
//! 4. monthly deductions in product order
//! 5. withdrawal and loan, in month 0 only
//! 6. interest credits and loan interest accrual; honeymoon roll-forward
//! 7. death benefit
//! 8. lapse

use log::debug;

use crate::assumptions::{monthly_from_annual, period_from_annual, MonthlyCharge, RateTables};
use crate::currency::{materially_equal, RoundingRules};
use crate::error::{IllustrationError, Result};
use crate::policy::{DbOption, RunParameters};

use super::state::PolicyState;

/// State after one month, with the total account value it ended on
#[derive(Debug, Clone)]
pub struct MonthResult {
    pub state: PolicyState,
    pub assets: f64,
}

pub struct MonthlyEngine<'a> {
    pub tables: &'a RateTables,
    pub params: &'a RunParameters,
    pub rounding: &'a RoundingRules,
}

impl<'a> MonthlyEngine<'a> {
    pub fn new(tables: &'a RateTables, params: &'a RunParameters, rounding: &'a RoundingRules) -> Self {
        Self { tables, params, rounding }
    }

    /// Apply the transactions of (`year`, `month`)
    ///
    /// A lapsed state is returned untouched with zero assets.
    pub fn apply(&self, mut state: PolicyState, year: usize, month: usize) -> Result<MonthResult> {
        if state.lapsed {
            return Ok(MonthResult { state, assets: 0.0 });
        }

        self.verify_counters(&state, year, month)?;

        if state.basis.uses_dynamic_rates() {
            let case_assets = self.params.case_assumed_assets[year];
            let assets = if 0.0 < case_assets { case_assets } else { state.total_av() };
            state.rates.apply_tiered(self.tables, assets);
        }

        self.accept_premium(&mut state);
        self.deduct_charges(&mut state);
        if 0 == month {
            self.take_withdrawal(&mut state);
            self.take_loan(&mut state);
        }
        self.credit_interest(&mut state);
        state.death_benefit = state.corridor_death_benefit(&self.rounding.death_benefit);
        state.term_death_benefit = state.term_benefit(self.tables);
        self.test_lapse(&mut state);

        let assets = if state.lapsed { 0.0 } else { state.total_av() };
        Ok(MonthResult { state, assets })
    }

    fn verify_counters(&self, state: &PolicyState, year: usize, month: usize) -> Result<()> {
        if state.year != year || state.month != month || state.months_since_issue != month + 12 * year || 12 <= month {
            return Err(IllustrationError::CounterMismatch {
                expected_year: year,
                expected_month: month,
                year: state.year,
                month: state.month,
                months_since_issue: state.months_since_issue,
            });
        }
        if state.daily_interest_accounting
            && (!(365..=366).contains(&state.days_in_year) || !(28..=31).contains(&state.days_in_month))
        {
            return Err(IllustrationError::DayCountOutOfRange {
                days_in_year: state.days_in_year,
                days_in_month: state.days_in_month,
            });
        }
        Ok(())
    }

    /// Effective rate for this month from an annual effective rate
    fn periodic(&self, state: &PolicyState, annual: f64) -> f64 {
        let rate = if state.daily_interest_accounting {
            period_from_annual(annual, state.days_in_month, state.days_in_year)
        } else {
            monthly_from_annual(annual)
        };
        self.rounding.interest_rate.apply(rate)
    }

    fn accept_premium(&self, state: &mut PolicyState) {
        let (year, month) = (state.year, state.month);
        let index = state.months_since_issue;
        let at_issue = 0 == index && !self.params.inforce.is_inforce();

        let issue_amount = if at_issue {
            state.outlay.dumpin + state.outlay.external_1035 + state.outlay.internal_1035
        } else {
            0.0
        };
        let requested_ee = state.outlay.ee_monthly[index] + issue_amount;
        let requested_er = state.outlay.er_monthly[index];
        if 0.0 == requested_ee && 0.0 == requested_er {
            return;
        }

        // The guideline limit cuts employer premium before employee premium.
        let allowed = state.irc7702.limit_payment(state.cum_pmts, requested_ee + requested_er);
        let ee = self.rounding.gross_premium.apply(requested_ee.min(allowed));
        let er = self.rounding.gross_premium.apply(requested_er.min((allowed - ee).max(0.0)));
        if ee < requested_ee || er < requested_er {
            debug!(
                "{} year {} month {}: premium limited to {:.2} of {:.2}",
                state.basis.label(),
                year,
                month,
                ee + er,
                requested_ee + requested_er
            );
        }

        let issue_paid = issue_amount.min(ee);
        state.outlay.ee_monthly[index] = ee - issue_paid;
        state.outlay.er_monthly[index] = er;
        if 0.0 < issue_amount && issue_paid < issue_amount {
            state.outlay.scale_issue_amounts(issue_paid / issue_amount);
        }

        let gross = ee + er;
        let to_target = gross.min(state.unused_target.max(0.0));
        state.unused_target -= to_target;
        let sales_load = state.rates.target_load * to_target + state.rates.excess_load * (gross - to_target);
        let premium_tax = state.premium_tax_rate * gross;
        let tiered = &self.tables.product.tiered_premium_load;
        let tiered_load = tiered.charge(state.ytd.gross_pmt + gross) - tiered.charge(state.ytd.gross_pmt);
        let net = self.rounding.net_premium.apply(gross - sales_load - premium_tax - tiered_load);

        let to_sep = net * self.params.sep_acct_allocation;
        state.av_sep += to_sep;
        state.av_gen += net - to_sep;

        state.cum_pmts += gross;
        state.tax_basis += gross;
        state.cum_no_lapse_prem += gross;
        state.cum_sales_load += sales_load;
        if let Some(hv) = state.honeymoon_value.as_mut() {
            *hv += net;
        }
        if state.irc7702.record_payment(year, month, gross) {
            debug!("{} became a MEC in year {} month {}", state.basis.label(), year, month);
        }

        let ytd = &mut state.ytd;
        ytd.ee_pmt += ee;
        ytd.er_pmt += er;
        ytd.gross_pmt += gross;
        ytd.net_pmt += net;
        ytd.sales_load += sales_load;
        ytd.premium_tax += premium_tax;
        ytd.tiered_premium_load += tiered_load;
        ytd.monthly_gross[month] += gross;
        ytd.monthly_ee[month] += ee;
        ytd.monthly_er[month] += er;
    }

    fn deduct_charges(&self, state: &mut PolicyState) {
        let product = &self.tables.product;
        let mut total = 0.0;
        for charge in &product.deduction_order {
            let amount = match charge {
                MonthlyCharge::PolicyFee => {
                    let fee = state.rates.monthly_fee + if 0 == state.month { state.rates.annual_fee } else { 0.0 };
                    state.ytd.policy_fees += fee;
                    fee
                }
                MonthlyCharge::SpecAmtLoad => {
                    let load = state.rates.specamt_load * state.specamt;
                    state.ytd.specamt_load += load;
                    load
                }
                MonthlyCharge::RiderCharges => {
                    let charge = self.rounding.coi_charge.apply(state.term_death_benefit * state.rates.term_coi);
                    state.ytd.rider_charges += charge;
                    charge
                }
                MonthlyCharge::Coi => {
                    let naar = (state.death_benefit * state.rates.naar_discount - state.total_av()).max(0.0);
                    let coi = self.rounding.coi_charge.apply(naar * state.rates.coi);
                    state.ytd.coi += coi;
                    state.ytd.net_coi +=
                        (coi - product.coi_retention_additive * naar) / product.coi_retention_multiplier;
                    coi
                }
                MonthlyCharge::AcctValLoad => {
                    let load = state.rates.acct_val_load * state.unloaned_av().max(0.0)
                        + state.rates.sep_acct_load / 12.0 * state.av_sep.max(0.0);
                    state.ytd.acct_val_load += load;
                    load
                }
            };
            state.deduct(amount);
            total += amount;
        }
        state.month_deductions = total;
    }

    fn take_withdrawal(&self, state: &mut PolicyState) {
        let year = state.year;
        let requested = state.outlay.withdrawal[year];
        if requested <= 0.0 {
            return;
        }

        let surrchg = self.rounding.surrender_charge.apply(state.surrender_charge());
        let available = state.csv_raw(surrchg).max(0.0).min(state.unloaned_av().max(0.0));
        let paid = self.rounding.withdrawal.apply(requested.min(available));
        state.outlay.withdrawal[year] = paid;
        state.ytd.withdrawal += paid;
        state.ytd.withdrawal_ullage += requested - paid;
        if paid <= 0.0 {
            return;
        }

        state.deduct(paid);
        state.cum_pmts -= paid;
        state.tax_basis -= paid;
        if let Some(hv) = state.honeymoon_value.as_mut() {
            *hv -= paid;
        }
        if DbOption::A == state.db_option {
            let reduced = (state.specamt - paid).max(self.tables.product.min_specamt);
            state.reduce_specamt(self.rounding.specified_amount.apply(reduced));
        }
    }

    fn take_loan(&self, state: &mut PolicyState) {
        let year = state.year;
        let requested = state.outlay.loan[year];
        if requested <= 0.0 {
            return;
        }

        let product = &self.tables.product;
        let surrchg = self.rounding.surrender_charge.apply(state.surrender_charge()).max(0.0);
        let loaned_av = state.av_reg_ln + state.av_prf_ln;
        let funded = state.unloaned_av().max(0.0) * product.max_loan_av_mult + loaned_av
            - surrchg
            - 11.0 * state.month_deductions;
        let max_loan = (funded / (1.0 + state.rates.reg_ln_due) - state.loan_balance()).max(0.0);

        let amount = self.rounding.loan.apply(requested.min(max_loan));
        state.outlay.loan[year] = amount;
        state.ytd.new_loan += amount;
        state.ytd.loan_ullage += requested - amount;
        if amount <= 0.0 {
            return;
        }

        let preferred = match product.preferred_loan_year {
            Some(first) if first <= year => {
                let gain = (state.total_av() - state.tax_basis).max(0.0);
                amount.min((gain - state.prf_ln_bal).max(0.0))
            }
            _ => 0.0,
        };
        let regular = amount - preferred;

        state.deduct(amount);
        state.av_reg_ln += regular;
        state.av_prf_ln += preferred;
        state.reg_ln_bal += regular;
        state.prf_ln_bal += preferred;
    }

    fn credit_interest(&self, state: &mut PolicyState) {
        let round = &self.rounding.interest_credit;
        let gen_rate = self.periodic(state, state.rates.gen_acct);
        let sep_rate = self.periodic(state, state.rates.sep_acct_net());

        let gen_credit = round.apply(state.av_gen.max(0.0) * gen_rate);
        let sep_credit = round.apply(state.av_sep * sep_rate);
        let reg_credit = round.apply(state.av_reg_ln * self.periodic(state, state.rates.reg_ln_credited));
        let prf_credit = round.apply(state.av_prf_ln * self.periodic(state, state.rates.prf_ln_credited));
        state.av_gen += gen_credit;
        state.av_sep += sep_credit;
        state.av_reg_ln += reg_credit;
        state.av_prf_ln += prf_credit;

        let reg_due = state.reg_ln_bal * self.periodic(state, state.rates.reg_ln_due);
        let prf_due = state.prf_ln_bal * self.periodic(state, state.rates.prf_ln_due);
        state.reg_ln_bal += reg_due;
        state.prf_ln_bal += prf_due;

        state.ytd.int_gen += gen_credit;
        state.ytd.int_sep += sep_credit;
        state.ytd.int_loaned += reg_credit + prf_credit;
        state.ytd.loan_int_accrued += reg_due + prf_due;

        if let Some(hv) = state.honeymoon_value {
            let rolled = hv * (1.0 + self.periodic(state, state.rates.honeymoon));
            let surrchg = self.rounding.surrender_charge.apply(state.surrender_charge());
            if rolled <= 0.0 || rolled < state.csv_raw(surrchg) {
                debug!(
                    "{} honeymoon expired in year {} month {}",
                    state.basis.label(),
                    state.year,
                    state.month
                );
                state.honeymoon_value = None;
            } else {
                state.honeymoon_value = Some(rolled);
            }
        }
    }

    fn no_lapse_holds(&self, state: &PolicyState) -> bool {
        let product = &self.tables.product;
        if state.year >= product.no_lapse_years {
            return false;
        }
        if product.no_lapse_option_a_only && DbOption::A != state.db_option {
            return false;
        }
        let required = state.annual_min_premium * (state.months_since_issue + 1) as f64 / 12.0;
        required <= state.cum_no_lapse_prem || materially_equal(required, state.cum_no_lapse_prem)
    }

    fn test_lapse(&self, state: &mut PolicyState) {
        if state.no_lapse_active && !self.no_lapse_holds(state) {
            state.no_lapse_active = false;
        }

        let surrchg = self.rounding.surrender_charge.apply(state.surrender_charge());
        if 0.0 < state.csv_raw(surrchg) {
            return;
        }

        let honeymoon = state.honeymoon_value.is_some_and(|hv| 0.0 < hv);
        if honeymoon || state.no_lapse_active {
            state.av_gen = state.av_gen.max(0.0);
            state.av_sep = state.av_sep.max(0.0);
            return;
        }
        if state.mode.is_solving() {
            return;
        }
        state.lapse();
    }
}
