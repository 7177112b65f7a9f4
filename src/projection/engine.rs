//! Life/basis orchestration
//!
//! [`IllustrationEngine::run`] produces a complete [`Ledger`] for one life:
//! an optional solve, then one simulation per basis the ledger type
//! requires (current first, its realized outlay reused by the others),
//! then the guaranteed-premium solve for regulated illustrations.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::assumptions::RateTables;
use crate::basis::{Basis, LedgerType};
use crate::currency::RoundingRules;
use crate::error::{IllustrationError, Result};
use crate::ledger::{Ledger, LedgerInvariant, LedgerVariant};
use crate::policy::{Mode, Outlay, RunParameters, Schedules};
use crate::solve::{self, decimal_root, RootBias, SolveSpec};

use super::annual::AnnualFinalizer;
use super::monthly::MonthlyEngine;
use super::state::{PolicyState, RunMode};

/// Configuration for a projection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub rounding: RoundingRules,

    /// Decimal places to which solved amounts are rounded
    pub solve_decimals: i32,

    /// Upper bound of every solve
    pub solve_upper_bound: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            rounding: RoundingRules::default(),
            solve_decimals: 2,
            solve_upper_bound: 10_000_000.0,
        }
    }
}

/// Where an illustration run stands, for the debug log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    RunningBasis(Basis),
    Solving,
    Restarting(Basis),
    Finalized,
}

fn transition(phase: &mut RunPhase, next: RunPhase) {
    debug!("run phase {:?} -> {:?}", phase, next);
    *phase = next;
}

/// Results of one full simulation on one basis
#[derive(Debug, Clone)]
pub struct BasisRun {
    pub variant: LedgerVariant,
    /// Meaningful as the ledger invariant only for the current basis
    pub invariant: LedgerInvariant,
    /// Payments, loans and withdrawals as realized; specamt as requested
    pub outlay: Outlay,
}

enum Simulation {
    Complete(Box<BasisRun>),
    /// First-year payments fell short of the retaliation limit that the
    /// premium tax rate assumed they would reach
    RetaliationMisestimate,
}

pub struct IllustrationEngine<'a> {
    params: RunParameters,
    tables: &'a RateTables,
    config: ProjectionConfig,
    ledger_type: LedgerType,
    length: usize,
}

impl<'a> IllustrationEngine<'a> {
    /// Validate the input and build an engine for one life
    pub fn new(
        params: RunParameters,
        tables: &'a RateTables,
        config: ProjectionConfig,
        ledger_type: LedgerType,
    ) -> Result<Self> {
        let product = &tables.product;
        let length = product.policy_length(params.issue_age);
        params.validate(length)?;

        if !product.allow_sep_acct && 0.0 < params.sep_acct_allocation {
            return Err(IllustrationError::DisallowedAllocation(format!(
                "{} does not offer a separate account",
                product.name
            )));
        }
        if !product.allow_gen_acct && 0.0 < params.gen_acct_allocation() {
            return Err(IllustrationError::DisallowedAllocation(format!(
                "{} does not offer a general account",
                product.name
            )));
        }

        Ok(Self {
            params,
            tables,
            config,
            ledger_type,
            length,
        })
    }

    pub fn params(&self) -> &RunParameters {
        &self.params
    }

    pub fn tables(&self) -> &RateTables {
        self.tables
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn ledger_type(&self) -> LedgerType {
        self.ledger_type
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Run every basis the ledger type requires, with an optional solve first
    pub fn run(&self, solve_spec: Option<&SolveSpec>) -> Result<Ledger> {
        let mut phase = RunPhase::NotStarted;
        let mut schedules = Schedules::from_params(&self.params);

        let mut outcome = None;
        if let Some(spec) = solve_spec {
            transition(&mut phase, RunPhase::RunningBasis(Basis::Current));
            let baseline = self.run_basis(Basis::Current, &Outlay::requested(&schedules, &self.params), RunMode::Normal)?;

            transition(&mut phase, RunPhase::Solving);
            let solved = solve::solve(self, spec, &schedules, &baseline)?;
            if solved.applied {
                spec.apply(&mut schedules, solved.result.root);
            } else {
                warn!(
                    "{:?} solve failed ({:?}); input schedules kept",
                    spec.solve_type, solved.result.validity
                );
            }
            outcome = Some(solved);
        }

        let requested = Outlay::requested(&schedules, &self.params);
        let mut ledger = Ledger::new(self.ledger_type, self.params.issue_age, self.length);
        let mut realized: Option<Outlay> = None;
        for &basis in self.ledger_type.run_bases() {
            transition(&mut phase, RunPhase::RunningBasis(basis));
            let outlay = realized.as_ref().unwrap_or(&requested);
            let run = self.run_basis(basis, outlay, RunMode::Normal)?;
            if basis.is_current() {
                ledger.invariant = run.invariant;
                realized = Some(run.outlay);
            }
            ledger.variants.insert(basis, run.variant);
        }

        if let Some(current) = ledger.variants.get(&Basis::Current) {
            ledger.invariant.zero_inforce_after_lapse(current.lapse_year);
        }

        if self.ledger_type.is_subject_to_ill_reg() {
            ledger.invariant.guar_premium = self.solve_guar_premium()?;
        }
        ledger.solve = outcome;

        transition(&mut phase, RunPhase::Finalized);
        Ok(ledger)
    }

    /// One complete simulation on `basis`, restarting once if the
    /// retaliation-limit guess proves wrong
    pub fn run_basis(&self, basis: Basis, outlay: &Outlay, mode: RunMode) -> Result<BasisRun> {
        if !self.ledger_type.allows(basis) {
            return Err(IllustrationError::IllegalBasis {
                basis,
                ledger_type: self.ledger_type,
            });
        }

        let mut exceeds = self.params.retaliation_limit <= outlay.planned_year_premium(0);
        for _ in 0..2 {
            match self.simulate(basis, outlay, mode, exceeds)? {
                Simulation::Complete(run) => return Ok(*run),
                Simulation::RetaliationMisestimate => {
                    debug!("{:?}", RunPhase::Restarting(basis));
                    exceeds = false;
                }
            }
        }
        Err(IllustrationError::Internal(format!(
            "retaliation limit misestimated twice on the {} basis",
            basis.label()
        )))
    }

    fn simulate(&self, basis: Basis, outlay: &Outlay, mode: RunMode, exceeds_retaliation_limit: bool) -> Result<Simulation> {
        let rounding = &self.config.rounding;
        let params = &self.params;
        let mut state = PolicyState::initialize(
            basis,
            mode,
            params,
            self.tables,
            outlay.clone(),
            exceeds_retaliation_limit,
            rounding,
        )?;
        let monthly = MonthlyEngine::new(self.tables, params, rounding);
        let finalizer = AnnualFinalizer::new(rounding);

        let mut variant = LedgerVariant::new(basis, self.length);
        let mut invariant = LedgerInvariant::new(params.issue_age, self.length);
        invariant.glp = state.irc7702.glp();
        invariant.gsp = state.irc7702.gsp();
        invariant.seven_pay_premium = state.irc7702.seven_pay_premium();
        invariant.set_inforce_lives(&state.partial_q, params.num_identical_lives);

        let (start_year, start_month) = (params.inforce.year, params.inforce.month);
        for year in start_year..self.length {
            state.begin_year(year, params, self.tables, rounding)?;
            let first_month = if year == start_year { start_month } else { 0 };
            for month in first_month..12 {
                if state.lapsed {
                    break;
                }
                state.advance_to(year, month)?;
                state = monthly.apply(state, year, month)?.state;
            }

            let values = finalizer.finalize(&state, year)?;
            variant.record(year, &values);
            invariant.record(year, &values);

            if 0 == year && exceeds_retaliation_limit && state.cum_pmts < params.retaliation_limit {
                return Ok(Simulation::RetaliationMisestimate);
            }
            if state.lapsed {
                break;
            }
        }

        invariant.specamt = state.specamt_schedule.clone();
        if let Some((year, month)) = state.lapse_duration {
            variant.lapse_year = year;
            variant.lapse_month = month;
        }
        if let Some((year, month)) = state.irc7702.mec_duration() {
            variant.is_mec = true;
            variant.mec_year = year;
            variant.mec_month = month;
            invariant.is_mec = true;
            invariant.mec_year = year;
            invariant.mec_month = month;
        }

        Ok(Simulation::Complete(Box::new(BasisRun {
            variant,
            invariant,
            outlay: state.outlay,
        })))
    }

    /// Level annual employee premium that endows on the guaranteed basis,
    /// with employer premium, loans and withdrawals removed
    fn solve_guar_premium(&self) -> Result<Option<f64>> {
        let mut base = Schedules::from_params(&self.params);
        base.er_payment.fill(0.0);
        base.loan.fill(0.0);
        base.withdrawal.fill(0.0);
        base.ee_mode.fill(Mode::Annual);
        let last = self.length - 1;
        let target = base.specamt[last];

        let objective = |premium: f64| -> Result<f64> {
            let mut schedules = base.clone();
            schedules.ee_payment.fill(premium);
            let outlay = Outlay::requested(&schedules, &self.params);
            let run = self.run_basis(Basis::Guaranteed, &outlay, RunMode::SolvingForGuarPremium)?;
            Ok(run.variant.csv_net[last] - target)
        };
        let result = decimal_root(
            objective,
            0.0,
            self.config.solve_upper_bound,
            RootBias::Higher,
            self.config.solve_decimals,
        )?;
        if result.is_valid() {
            debug!("guaranteed premium {:.2} after {} evaluations", result.root, result.n_eval);
            Ok(Some(result.root))
        } else {
            debug!("guaranteed premium not found: {:?}", result.validity);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::materially_equal;
    use crate::policy::DefnLifeIns;
    use approx::assert_relative_eq;

    fn engine(params: RunParameters, tables: &RateTables, ledger_type: LedgerType) -> IllustrationEngine<'_> {
        IllustrationEngine::new(params, tables, ProjectionConfig::default(), ledger_type).unwrap()
    }

    #[test]
    fn test_run_produces_every_basis() {
        let tables = RateTables::sample_product();
        let mut params = RunParameters::level(45, 55, 100_000.0, 2_500.0);
        params.defn_life_ins = DefnLifeIns::Cvat;
        let ledger = engine(params, &tables, LedgerType::IllustrationReg).run(None).unwrap();

        assert_eq!(ledger.variants.len(), 3);
        let curr = ledger.variant(Basis::Current).unwrap();
        let guar = ledger.variant(Basis::Guaranteed).unwrap();
        assert!(guar.acct_value[10] < curr.acct_value[10]);
        assert_relative_eq!(ledger.invariant.gross_pmt[0], 2_500.0);
        assert_relative_eq!(ledger.invariant.init_prem, 2_500.0);
        assert!(ledger.invariant.guar_premium.is_some());
        assert!(0.0 < ledger.invariant.glp);
        assert!(ledger.invariant.glp < ledger.invariant.gsp);
    }

    #[test]
    fn test_midpoint_illegal_without_ill_reg() {
        let tables = RateTables::sample_product();
        let params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        let e = engine(params, &tables, LedgerType::NonIllustrationReg);
        let outlay = Outlay::requested(&Schedules::from_params(e.params()), e.params());
        let err = e.run_basis(Basis::Midpoint, &outlay, RunMode::Normal).unwrap_err();
        assert!(matches!(
            err,
            IllustrationError::IllegalBasis {
                basis: Basis::Midpoint,
                ledger_type: LedgerType::NonIllustrationReg
            }
        ));
    }

    #[test]
    fn test_disallowed_allocation() {
        let mut tables = RateTables::sample_product();
        tables.product.allow_sep_acct = false;
        let mut params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        params.sep_acct_allocation = 0.5;
        let err = IllustrationEngine::new(params, &tables, ProjectionConfig::default(), LedgerType::IllustrationReg)
            .err()
            .unwrap();
        assert!(matches!(err, IllustrationError::DisallowedAllocation(_)));
    }

    #[test]
    fn test_premium_at_glp_stays_in_force() {
        let tables = RateTables::sample_product();
        let unfunded = RunParameters::level(45, 55, 100_000.0, 0.0);
        let glp = engine(unfunded, &tables, LedgerType::NonIllustrationReg)
            .run(None)
            .unwrap()
            .invariant
            .glp;

        let mut params = RunParameters::level(45, 55, 100_000.0, (glp * 100.0).floor() / 100.0);
        params.use_partial_mortality = true;
        let ledger = engine(params, &tables, LedgerType::NonIllustrationReg).run(None).unwrap();
        let curr = ledger.current().unwrap();
        assert_eq!(curr.lapse_year, 55);
        assert!(ledger.invariant.forceout.iter().all(|&f| 0.0 == f));
        assert!(!ledger.invariant.is_mec);

        let inv = &ledger.invariant;
        for t in 0..55 {
            let q = inv.partial_mortality_q[t];
            let (db, av) = (curr.death_benefit[t], curr.acct_value[t]);
            assert_relative_eq!(curr.claims_gross[t], q * db, max_relative = 1e-12);
            let net = if materially_equal(db, av) { 0.0 } else { q * db - q * av };
            assert_relative_eq!(curr.claims_net[t], net, max_relative = 1e-12, epsilon = 1e-9);
            assert_relative_eq!(inv.inforce_lives[t + 1], inv.inforce_lives[t] * (1.0 - q), max_relative = 1e-12);
        }
        assert!(0.0 < curr.claims_net[0]);
        assert!(inv.inforce_lives[55] < inv.inforce_lives[0]);
    }

    #[test]
    fn test_option_a_withdrawal_reduces_specamt_once_on_every_basis() {
        let tables = RateTables::sample_product();
        let mut params = RunParameters::level(45, 55, 100_000.0, 5_000.0);
        params.defn_life_ins = DefnLifeIns::Cvat;
        params.withdrawal[5] = 1_000.0;
        let ledger = engine(params, &tables, LedgerType::IllustrationReg).run(None).unwrap();

        assert_eq!(ledger.invariant.specamt[4], 100_000.0);
        assert_eq!(ledger.invariant.specamt[5], 99_000.0);
        for basis in [Basis::Current, Basis::Guaranteed, Basis::Midpoint] {
            let v = ledger.variant(basis).unwrap();
            assert_relative_eq!(v.specamt[4], 100_000.0);
            assert_relative_eq!(v.specamt[5], 99_000.0);
            assert_relative_eq!(v.specamt[6], 99_000.0);
            assert_relative_eq!(v.death_benefit[5], 99_000.0);
        }
    }

    #[test]
    fn test_forceout_after_decrease_splits_premium() {
        let tables = RateTables::sample_product();
        let unfunded = RunParameters::level(45, 55, 100_000.0, 0.0);
        let gsp = engine(unfunded, &tables, LedgerType::NonIllustrationReg)
            .run(None)
            .unwrap()
            .invariant
            .gsp;

        let mut params = RunParameters::level(45, 55, 100_000.0, 0.0);
        params.ee_payment[0] = (gsp * 100.0).floor() / 100.0;
        for s in params.specamt.iter_mut().skip(3) {
            *s = 50_000.0;
        }
        let ledger = engine(params, &tables, LedgerType::NonIllustrationReg).run(None).unwrap();
        let inv = &ledger.invariant;
        assert!(0.0 < inv.forceout[3]);
        assert_relative_eq!(inv.ee_gross_pmt[3], -inv.forceout[3], epsilon = 1e-9);
        for t in 0..inv.length {
            assert_relative_eq!(inv.gross_pmt[t], inv.ee_gross_pmt[t] + inv.er_gross_pmt[t], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_lapse_zeroes_later_inforce_lives() {
        let tables = RateTables::sample_product();
        let params = RunParameters::level(45, 55, 100_000.0, 0.0);
        let ledger = engine(params, &tables, LedgerType::NonIllustrationReg).run(None).unwrap();
        let curr = ledger.current().unwrap();
        assert_eq!((curr.lapse_year, curr.lapse_month), (0, 0));
        assert_eq!(ledger.invariant.inforce_lives[0], 1.0);
        assert!(ledger.invariant.inforce_lives[1..].iter().all(|&l| 0.0 == l));
        assert!(curr.acct_value[1..].iter().all(|&v| 0.0 == v));
    }

    #[test]
    fn test_retaliation_restart_matches_correct_guess() {
        let tables = RateTables::sample_product();
        let mut params = RunParameters::level(45, 55, 100_000.0, 0.0);
        params.ee_payment[0] = 2_000_000.0;
        params.premium_tax_rate = 0.02;
        params.domicile_premium_tax_rate = 0.05;

        // Planned premium reaches the limit, but the guideline limit keeps
        // actual payments below it, forcing a restart.
        let mut restarted = params.clone();
        restarted.retaliation_limit = 1_000_000.0;
        let mut direct = params;
        direct.retaliation_limit = f64::INFINITY;

        let a = engine(restarted, &tables, LedgerType::NonIllustrationReg).run(None).unwrap();
        let b = engine(direct, &tables, LedgerType::NonIllustrationReg).run(None).unwrap();
        let (a, b) = (a.current().unwrap(), b.current().unwrap());
        assert!(0.0 < a.premium_tax[0]);
        assert_eq!(a.premium_tax, b.premium_tax);
        assert_eq!(a.acct_value, b.acct_value);
    }

    #[test]
    fn test_inforce_run_starts_mid_year() {
        let tables = RateTables::sample_product();
        let mut params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        params.inforce.year = 3;
        params.inforce.month = 6;
        params.inforce.av_gen_acct = 6_000.0;
        params.inforce.cum_pmts = 8_000.0;
        params.inforce.tax_basis = 8_000.0;
        params.inforce.cum_no_lapse_prem = 8_000.0;
        let ledger = engine(params, &tables, LedgerType::NonIllustrationReg).run(None).unwrap();
        let curr = ledger.current().unwrap();
        assert_eq!(curr.acct_value[2], 0.0);
        assert!(0.0 < curr.acct_value[3]);
        // Months before the inforce date are not re-simulated.
        assert_eq!(ledger.invariant.gross_pmt[3], 0.0);
        assert_relative_eq!(ledger.invariant.gross_pmt[4], 2_000.0);
    }
}
