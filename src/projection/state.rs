//! Mutable simulation state for one (life, basis) run

use chrono::{Months, NaiveDate};
use log::debug;

use crate::assumptions::{RateKey, RateTables};
use crate::basis::Basis;
use crate::compliance::{ComplianceStart, GuidelineCharges, Irc7702};
use crate::currency::{materially_equal, RoundTo, RoundingRules};
use crate::error::{IllustrationError, Result};
use crate::policy::{DbOption, Outlay, RunParameters};

use super::rates::YearRates;

/// How a simulation treats lapse and the zero floor on cash value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Normal,
    /// Objective evaluation for a solve: lapse is suppressed and
    /// cash surrender value may go negative
    Solving,
    /// Objective evaluation for the guaranteed-premium solve
    SolvingForGuarPremium,
}

impl RunMode {
    pub fn is_solving(&self) -> bool {
        !matches!(self, RunMode::Normal)
    }
}

/// Charges, credits and transactions accumulated over the current policy year
#[derive(Debug, Clone, Default)]
pub struct YearToDate {
    pub ee_pmt: f64,
    pub er_pmt: f64,
    pub gross_pmt: f64,
    pub net_pmt: f64,
    pub sales_load: f64,
    pub premium_tax: f64,
    pub tiered_premium_load: f64,
    pub forceout: f64,

    pub coi: f64,
    pub net_coi: f64,
    pub rider_charges: f64,
    pub policy_fees: f64,
    pub specamt_load: f64,
    pub acct_val_load: f64,

    pub int_gen: f64,
    pub int_sep: f64,
    pub int_loaned: f64,
    pub loan_int_accrued: f64,

    pub withdrawal: f64,
    pub withdrawal_ullage: f64,
    pub new_loan: f64,
    pub loan_ullage: f64,

    /// Gross, employee and employer payment by month of this year
    pub monthly_gross: [f64; 12],
    pub monthly_ee: [f64; 12],
    pub monthly_er: [f64; 12],
}

#[derive(Debug, Clone)]
pub struct PolicyState {
    pub basis: Basis,
    pub mode: RunMode,
    pub issue_age: usize,
    pub length: usize,
    pub effective_date: NaiveDate,
    pub daily_interest_accounting: bool,

    pub year: usize,
    pub month: usize,
    pub months_since_issue: usize,
    pub days_in_year: i64,
    pub days_in_month: i64,

    pub av_gen: f64,
    pub av_sep: f64,
    pub av_reg_ln: f64,
    pub av_prf_ln: f64,
    pub reg_ln_bal: f64,
    pub prf_ln_bal: f64,

    pub cum_pmts: f64,
    pub tax_basis: f64,
    pub cum_sales_load: f64,
    pub cum_no_lapse_prem: f64,

    pub specamt: f64,
    pub term_specamt: f64,
    /// Specified amount by policy year as in force: the outlay's schedule
    /// less any option A withdrawal reductions made in this run
    pub specamt_schedule: Vec<f64>,
    pub db_option: DbOption,
    pub death_benefit: f64,
    pub term_death_benefit: f64,
    /// Surrender charge from specamt layers, by policy year
    pub surrchg_layers: Vec<f64>,

    pub lapsed: bool,
    pub lapse_duration: Option<(usize, usize)>,

    /// Absent once expired, and on bases without a honeymoon
    pub honeymoon_value: Option<f64>,
    pub no_lapse_active: bool,

    /// Annual partial-mortality rate by policy year
    pub partial_q: Vec<f64>,

    pub rates: YearRates,
    pub target_premium: f64,
    pub unused_target: f64,
    pub annual_min_premium: f64,
    /// Total of this month's deductions, for the maximum loan
    pub month_deductions: f64,
    /// Premium tax rate chosen by the retaliation-limit guess
    pub premium_tax_rate: f64,

    pub ytd: YearToDate,
    pub irc7702: Irc7702,

    /// Payments, loans and withdrawals as actually realized
    pub outlay: Outlay,
}

impl PolicyState {
    /// Seed a fresh state from issue or inforce values
    pub fn initialize(
        basis: Basis,
        mode: RunMode,
        params: &RunParameters,
        tables: &RateTables,
        outlay: Outlay,
        exceeds_retaliation_limit: bool,
        rounding: &RoundingRules,
    ) -> Result<Self> {
        let length = outlay.len();
        let inforce = &params.inforce;
        let start_year = inforce.year;
        let age = params.issue_age;

        let specamt = outlay.specamt[start_year];
        let db_option = outlay.db_option[start_year];
        let issue_specamt = inforce.specamt_history.first().copied().unwrap_or(outlay.specamt[0]);

        let partial_q = if params.use_partial_mortality {
            let q = tables.series(RateKey::PartialMortality, Basis::Current, age, length)?;
            q.iter()
                .zip(&params.partial_mortality_multiplier)
                .map(|(q, m)| (q * m).clamp(0.0, 1.0))
                .collect()
        } else {
            vec![0.0; length]
        };

        let irc7702 = Self::new_tracker(params, tables, &outlay, issue_specamt)?;

        // Layers are built from issue so that an inforce run sees the same charges.
        let mut surrchg_layers = vec![0.0; length];
        let mut prior = 0.0;
        for (year, &s) in outlay.specamt.iter().enumerate() {
            let first = 0 == year;
            if first || (tables.product.surrender_charge_on_increase && prior < s && !materially_equal(prior, s)) {
                let delta = if first { s } else { s - prior };
                add_surrchg_layer(&mut surrchg_layers, tables, age, year, delta, rounding)?;
            }
            prior = s;
        }

        let honeymoon_value = if params.honeymoon && basis.has_honeymoon() {
            if inforce.is_inforce() {
                // An inforce honeymoon that has already expired stays expired.
                (0.0 < inforce.honeymoon_value).then_some(inforce.honeymoon_value)
            } else {
                Some(0.0)
            }
        } else {
            None
        };

        let mut state = Self {
            basis,
            mode,
            issue_age: age,
            length,
            effective_date: params.effective_date,
            daily_interest_accounting: params.daily_interest_accounting,
            year: start_year,
            month: inforce.month,
            months_since_issue: 12 * start_year + inforce.month,
            days_in_year: 365,
            days_in_month: 30,
            av_gen: inforce.av_gen_acct,
            av_sep: inforce.av_sep_acct,
            av_reg_ln: inforce.av_reg_ln,
            av_prf_ln: inforce.av_prf_ln,
            reg_ln_bal: inforce.reg_ln_bal,
            prf_ln_bal: inforce.prf_ln_bal,
            cum_pmts: inforce.cum_pmts,
            tax_basis: inforce.tax_basis,
            cum_sales_load: 0.0,
            cum_no_lapse_prem: inforce.cum_no_lapse_prem,
            specamt,
            term_specamt: outlay.term_specamt[start_year],
            specamt_schedule: outlay.specamt.clone(),
            db_option,
            death_benefit: 0.0,
            term_death_benefit: 0.0,
            surrchg_layers,
            lapsed: false,
            lapse_duration: None,
            honeymoon_value,
            no_lapse_active: true,
            partial_q,
            rates: YearRates::default(),
            target_premium: 0.0,
            unused_target: 0.0,
            annual_min_premium: 0.0,
            month_deductions: 0.0,
            premium_tax_rate: params.premium_tax_load_rate(exceeds_retaliation_limit),
            ytd: YearToDate::default(),
            irc7702,
            outlay,
        };
        state.death_benefit = state.corridor_death_benefit(&rounding.death_benefit);
        Ok(state)
    }

    fn new_tracker(params: &RunParameters, tables: &RateTables, outlay: &Outlay, issue_specamt: f64) -> Result<Irc7702> {
        let age = params.issue_age;
        let length = outlay.len();
        let guar = Basis::Guaranteed;
        let qc = tables.series(RateKey::Qc7702, guar, age, length)?;
        let charges = GuidelineCharges {
            premium_load: tables.rate(RateKey::TargetPremiumLoad, guar, age, 0)?,
            per_policy: 12.0 * tables.rate(RateKey::MonthlyPolicyFee, guar, age, 0)?
                + tables.rate(RateKey::AnnualPolicyFee, guar, age, 0)?,
            per_specamt: 12.0 * tables.rate(RateKey::SpecAmtLoad, guar, age, 0)?,
        };

        let inforce = &params.inforce;
        let least = if inforce.is_inforce() && 0.0 < inforce.least_death_benefit {
            inforce.least_death_benefit
        } else {
            issue_specamt
        };
        let exchanged_from_mec = (params.external_1035_from_mec && 0.0 < params.external_1035)
            || (params.internal_1035_from_mec && 0.0 < params.internal_1035);
        let start = ComplianceStart {
            year: inforce.year,
            death_benefit: issue_specamt,
            least_death_benefit: least,
            seven_pay_paid: inforce.premium_history.iter().take(inforce.year.min(7)).sum(),
            already_mec: inforce.is_mec || exchanged_from_mec,
        };
        Ok(Irc7702::new(params.defn_life_ins, &qc, charges, start))
    }

    pub fn total_av(&self) -> f64 {
        self.av_gen + self.av_sep + self.av_reg_ln + self.av_prf_ln
    }

    pub fn unloaned_av(&self) -> f64 {
        self.av_gen + self.av_sep
    }

    pub fn loan_balance(&self) -> f64 {
        self.reg_ln_bal + self.prf_ln_bal
    }

    pub fn attained_age(&self) -> usize {
        self.issue_age + self.year
    }

    /// Surrender charge for the current year, before rounding
    pub fn surrender_charge(&self) -> f64 {
        let av = self.total_av().max(0.0);
        self.rates.surrchg_av_mult * av + self.rates.surrchg_prem_mult * self.cum_pmts.max(0.0)
            + self.surrchg_layers.get(self.year).copied().unwrap_or(0.0)
            - self.rates.cash_value_enhancement * av
    }

    pub fn refundable_sales_load(&self) -> f64 {
        self.rates.refundable_load * self.cum_sales_load
    }

    /// Cash surrender value with no floor
    pub fn csv_raw(&self, surrchg: f64) -> f64 {
        self.total_av() - surrchg - self.loan_balance() + self.refundable_sales_load()
    }

    /// Death benefit for the current option, specamt and account value
    pub fn corridor_death_benefit(&self, rounding: &RoundTo) -> f64 {
        let av = self.total_av();
        let corridor = self.rates.corridor * av;
        let base = match self.db_option {
            DbOption::A => self.specamt,
            DbOption::B => self.specamt + av.max(0.0),
        };
        rounding.apply(base.max(corridor))
    }

    /// Remove `amount` from the unloaned accounts in proportion to their positive balances
    pub fn deduct(&mut self, amount: f64) {
        let gen = self.av_gen.max(0.0);
        let sep = self.av_sep.max(0.0);
        if 0.0 < sep && 0.0 < gen + sep {
            let from_sep = amount * sep / (gen + sep);
            self.av_sep -= from_sep;
            self.av_gen -= amount - from_sep;
        } else {
            self.av_gen -= amount;
        }
    }

    /// Move the counters to (`year`, `month`) and recompute day counts
    pub fn advance_to(&mut self, year: usize, month: usize) -> Result<()> {
        self.year = year;
        self.month = month;
        self.months_since_issue = 12 * year + month;
        if self.daily_interest_accounting {
            self.coordinate_counters()?;
        }
        Ok(())
    }

    /// Days in the current policy year and month, from the effective date
    fn coordinate_counters(&mut self) -> Result<()> {
        let anniversary = |months: usize| -> Result<NaiveDate> {
            let months = u32::try_from(months).map_err(|e| IllustrationError::Internal(e.to_string()))?;
            self.effective_date
                .checked_add_months(Months::new(months))
                .ok_or_else(|| IllustrationError::Internal(format!("date overflow {} months after issue", months)))
        };
        let year_start = anniversary(12 * self.year)?;
        let year_end = anniversary(12 * (self.year + 1))?;
        let month_start = anniversary(self.months_since_issue)?;
        let month_end = anniversary(self.months_since_issue + 1)?;
        self.days_in_year = (year_end - year_start).num_days();
        self.days_in_month = (month_end - month_start).num_days();
        Ok(())
    }

    /// Beginning-of-year processing: rates, specamt changes, guideline limit
    pub fn begin_year(&mut self, year: usize, params: &RunParameters, tables: &RateTables, rounding: &RoundingRules) -> Result<()> {
        self.year = year;
        self.ytd = YearToDate::default();

        // This year's GLP enters the limit before any benefit change adjusts it.
        self.irc7702.update_boy();

        let new_specamt = self.specamt_schedule[year];
        let old_specamt = self.specamt;
        self.specamt = new_specamt;
        self.term_specamt = self.outlay.term_specamt[year];
        self.db_option = self.outlay.db_option[year];
        if !materially_equal(old_specamt, new_specamt) {
            debug!(
                "{} year {}: specamt {:.2} -> {:.2}",
                self.basis.label(),
                year,
                old_specamt,
                new_specamt
            );
            self.irc7702.adjust_for_benefit_change(year, 0, old_specamt, new_specamt);
        }

        self.rates = YearRates::load(tables, self.basis, params, year, self.specamt, &rounding.interest_rate)?;

        let premium_base = if tables.product.target_premium_fixed_at_issue {
            self.specamt_schedule[0]
        } else {
            self.specamt
        };
        self.target_premium = rounding.gross_premium.apply(self.rates.target_premium_rate * premium_base);
        self.unused_target = self.target_premium;
        self.annual_min_premium = rounding.gross_premium.apply(self.rates.min_premium_rate * premium_base);

        let forceout = rounding.gross_premium.apply(self.irc7702.forceout(self.cum_pmts));
        if 0.0 < forceout {
            debug!("{} year {}: forceout {:.2}", self.basis.label(), year, forceout);
            self.deduct(forceout);
            self.cum_pmts -= forceout;
            self.tax_basis -= forceout;
            self.ytd.forceout = forceout;
        }

        self.death_benefit = self.corridor_death_benefit(&rounding.death_benefit);
        self.term_death_benefit = self.term_benefit(tables);
        Ok(())
    }

    pub fn term_benefit(&self, tables: &RateTables) -> f64 {
        if self.attained_age() < tables.product.term_rider_max_age {
            self.term_specamt
        } else {
            0.0
        }
    }

    /// Reduce specamt from this year on, as for an option A withdrawal
    pub fn reduce_specamt(&mut self, new_specamt: f64) {
        let old = self.specamt;
        if new_specamt < old && !materially_equal(new_specamt, old) {
            for s in self.specamt_schedule.iter_mut().skip(self.year) {
                *s = s.min(new_specamt);
            }
            self.specamt = new_specamt;
            self.irc7702.adjust_for_benefit_change(self.year, self.month, old, new_specamt);
        }
    }

    /// Mark the contract lapsed at the current month
    pub fn lapse(&mut self) {
        debug!(
            "{} lapsed in year {} month {}",
            self.basis.label(),
            self.year,
            self.month
        );
        self.lapsed = true;
        self.lapse_duration = Some((self.year, self.month));
        if self.basis.is_current() {
            self.outlay.cease_after(self.months_since_issue);
        }
    }
}

fn add_surrchg_layer(
    layers: &mut [f64],
    tables: &RateTables,
    issue_age: usize,
    start: usize,
    delta_specamt: f64,
    rounding: &RoundingRules,
) -> Result<()> {
    for (t, layer) in layers.iter_mut().enumerate().skip(start) {
        let factor = tables.rate(RateKey::SurrChgSpecAmtFactor, Basis::Current, issue_age, t - start)?;
        *layer += rounding.surrender_charge.apply(delta_specamt * factor);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Schedules;
    use approx::assert_relative_eq;

    fn state_for(params: &RunParameters, basis: Basis) -> PolicyState {
        let tables = RateTables::sample_product();
        let outlay = Outlay::requested(&Schedules::from_params(params), params);
        PolicyState::initialize(basis, RunMode::Normal, params, &tables, outlay, false, &RoundingRules::default()).unwrap()
    }

    #[test]
    fn test_surrender_charge_layers() {
        let mut params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        for s in params.specamt.iter_mut().skip(3) {
            *s = 150_000.0;
        }
        let state = state_for(&params, Basis::Current);
        assert_relative_eq!(state.surrchg_layers[0], 3_000.0);
        assert_relative_eq!(state.surrchg_layers[2], 2_400.0);
        // Increase of 50,000 in year 3 starts a new layer at its full rate.
        assert_relative_eq!(state.surrchg_layers[3], 2_100.0 + 1_500.0);
        assert_relative_eq!(state.surrchg_layers[20], 0.0);
    }

    #[test]
    fn test_increase_adds_glp_change_once() {
        let tables = RateTables::sample_product();
        let rounding = RoundingRules::default();
        let mut params = RunParameters::level(45, 55, 100_000.0, 0.0);
        for s in params.specamt.iter_mut().skip(3) {
            *s = 150_000.0;
        }
        let mut state = state_for(&params, Basis::Current);
        state.begin_year(0, &params, &tables, &rounding).unwrap();
        let glp0 = state.irc7702.glp();
        assert_relative_eq!(state.irc7702.cum_glp(), glp0);
        for year in 1..=3 {
            state.begin_year(year, &params, &tables, &rounding).unwrap();
        }
        let glp3 = state.irc7702.glp();
        assert!(glp0 < glp3);
        assert_relative_eq!(state.irc7702.cum_glp(), 3.0 * glp0 + glp3, max_relative = 1e-12);
    }

    #[test]
    fn test_deduct_pro_rata() {
        let mut state = state_for(&RunParameters::level(45, 55, 100_000.0, 2_000.0), Basis::Current);
        state.av_gen = 300.0;
        state.av_sep = 100.0;
        state.deduct(40.0);
        assert_relative_eq!(state.av_gen, 270.0);
        assert_relative_eq!(state.av_sep, 90.0);
    }

    #[test]
    fn test_day_counts() {
        let mut params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        params.daily_interest_accounting = true;
        params.effective_date = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        let mut state = state_for(&params, Basis::Current);
        state.advance_to(1, 0).unwrap();
        // 2024-01-31 to 2025-01-31 spans a leap day.
        assert_eq!(state.days_in_year, 366);
        assert_eq!(state.days_in_month, 29);
        state.advance_to(1, 1).unwrap();
        assert_eq!(state.days_in_month, 31);
    }

    #[test]
    fn test_honeymoon_current_basis_only() {
        let mut params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        params.honeymoon = true;
        assert_eq!(state_for(&params, Basis::Current).honeymoon_value, Some(0.0));
        assert_eq!(state_for(&params, Basis::Guaranteed).honeymoon_value, None);
    }
}
