//! Solves: find the input amount that makes a simulation meet a target
//!
//! A solve varies one schedule (premium, specified amount, loan or
//! withdrawal) over a window of policy years and uses a full simulation of
//! one basis as the objective function for [`decimal_root`].

mod zero;

pub use zero::{decimal_root, find_root, RootBias, RootImpetus, RootResult, RootValidity, MAX_ITERATIONS};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::basis::Basis;
use crate::error::{IllustrationError, Result};
use crate::policy::{Outlay, Schedules};
use crate::projection::{BasisRun, IllustrationEngine, RunMode};

/// Schedule that a solve varies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveType {
    EePremium,
    ErPremium,
    SpecAmt,
    Loan,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SolveTarget {
    /// Cash surrender value equal to the specified amount at maturity
    Endowment,
    /// Cash surrender value equal to this amount at the target year
    CashSurrenderValue(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveSpec {
    pub solve_type: SolveType,
    /// First policy year in which the solved value applies
    pub begin_year: usize,
    /// Policy year before which the solved value stops applying
    pub end_year: usize,
    pub target: SolveTarget,
    /// Number of policy years after which the target is tested
    pub target_year: usize,
    pub basis: Basis,
}

impl SolveSpec {
    /// Solve over the whole policy for endowment on the current basis
    pub fn endowment(solve_type: SolveType, length: usize) -> Self {
        Self {
            solve_type,
            begin_year: 0,
            end_year: length,
            target: SolveTarget::Endowment,
            target_year: length,
            basis: Basis::Current,
        }
    }

    pub fn validate(&self, length: usize) -> Result<()> {
        if self.end_year <= self.begin_year || length < self.end_year {
            return Err(IllustrationError::invalid_input(
                "solve window",
                format!("[{}, {}) is not within [0, {})", self.begin_year, self.end_year, length),
            ));
        }
        if 0 == self.target_year || length < self.target_year {
            return Err(IllustrationError::invalid_input(
                "solve target year",
                format!("{} is not within [1, {}]", self.target_year, length),
            ));
        }
        Ok(())
    }

    /// Write `value` into the solved schedule over the solve window
    pub fn apply(&self, schedules: &mut Schedules, value: f64) {
        let column = match self.solve_type {
            SolveType::EePremium => &mut schedules.ee_payment,
            SolveType::ErPremium => &mut schedules.er_payment,
            SolveType::SpecAmt => &mut schedules.specamt,
            SolveType::Loan => &mut schedules.loan,
            SolveType::Withdrawal => &mut schedules.withdrawal,
        };
        for v in column.iter_mut().take(self.end_year).skip(self.begin_year) {
            *v = value;
        }
    }

    /// Policy year and amount the cash surrender value is compared with
    fn target_for(&self, schedules: &Schedules) -> (usize, f64) {
        match self.target {
            SolveTarget::Endowment => {
                let last = schedules.len() - 1;
                (last, schedules.specamt[last])
            }
            SolveTarget::CashSurrenderValue(amount) => (self.target_year - 1, amount),
        }
    }

    /// Outlay for a trial value: the solved schedule as requested, every
    /// other schedule as the current basis realized it
    pub fn overlay(&self, realized: &Outlay, trial: Outlay) -> Outlay {
        let mut outlay = realized.clone();
        match self.solve_type {
            SolveType::EePremium => outlay.ee_monthly = trial.ee_monthly,
            SolveType::ErPremium => outlay.er_monthly = trial.er_monthly,
            SolveType::SpecAmt => outlay.specamt = trial.specamt,
            SolveType::Loan => outlay.loan = trial.loan,
            SolveType::Withdrawal => outlay.withdrawal = trial.withdrawal,
        }
        outlay
    }

    fn lower_bound(&self, engine: &IllustrationEngine<'_>) -> f64 {
        match self.solve_type {
            SolveType::SpecAmt => engine.tables().product.min_specamt,
            _ => 0.0,
        }
    }
}

/// Result of a solve, kept in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveOutcome {
    pub spec: SolveSpec,
    pub result: RootResult,
    /// Whether the root was written into the schedules
    pub applied: bool,
    /// Cash surrender value at the target year before solving
    pub baseline_csv: f64,
}

/// Cash surrender value at the target year, less the target, when the
/// solved schedule is set to `value`
///
/// A current-basis solve realizes its own schedules. Any other basis takes
/// every schedule but the solved one from `realized`, the outlay of the
/// current-basis run.
pub fn objective(
    engine: &IllustrationEngine<'_>,
    spec: &SolveSpec,
    schedules: &Schedules,
    realized: &Outlay,
    value: f64,
) -> Result<f64> {
    let mut trial = schedules.clone();
    spec.apply(&mut trial, value);
    let (year, target) = spec.target_for(&trial);
    let requested = Outlay::requested(&trial, engine.params());
    let outlay = if spec.basis.is_current() {
        requested
    } else {
        spec.overlay(realized, requested)
    };
    let run = engine.run_basis(spec.basis, &outlay, RunMode::Solving)?;
    Ok(run.variant.csv_net[year] - target)
}

/// Find the value of the solved schedule that meets the target
///
/// Bias is toward a non-negative objective: the smallest premium or
/// specified amount, or the largest loan or withdrawal, that reaches the
/// target.
pub fn solve(
    engine: &IllustrationEngine<'_>,
    spec: &SolveSpec,
    schedules: &Schedules,
    baseline: &BasisRun,
) -> Result<SolveOutcome> {
    spec.validate(engine.length())?;
    let config = engine.config();

    let result = decimal_root(
        |value| objective(engine, spec, schedules, &baseline.outlay, value),
        spec.lower_bound(engine),
        config.solve_upper_bound,
        RootBias::Higher,
        config.solve_decimals,
    )?;
    debug!(
        "{:?} solve: {:.2} ({:?}) after {} iterations, {} evaluations",
        spec.solve_type, result.root, result.validity, result.n_iter, result.n_eval
    );

    let (year, _) = spec.target_for(schedules);
    Ok(SolveOutcome {
        spec: spec.clone(),
        result,
        applied: result.is_valid(),
        baseline_csv: baseline.variant.csv_net[year],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::RateTables;
    use crate::basis::LedgerType;
    use crate::policy::{DefnLifeIns, RunParameters};
    use crate::projection::ProjectionConfig;
    use approx::assert_relative_eq;

    fn cvat(specamt: f64, premium: f64) -> RunParameters {
        let mut params = RunParameters::level(45, 55, specamt, premium);
        params.defn_life_ins = DefnLifeIns::Cvat;
        params
    }

    #[test]
    fn test_apply_window() {
        let params = RunParameters::level(45, 10, 100_000.0, 1_000.0);
        let mut schedules = Schedules::from_params(&params);
        let spec = SolveSpec {
            begin_year: 2,
            end_year: 5,
            ..SolveSpec::endowment(SolveType::Loan, 10)
        };
        spec.apply(&mut schedules, 500.0);
        assert_eq!(schedules.loan, vec![0.0, 0.0, 500.0, 500.0, 500.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_invalid_window() {
        let spec = SolveSpec {
            begin_year: 5,
            end_year: 5,
            ..SolveSpec::endowment(SolveType::EePremium, 10)
        };
        assert!(spec.validate(10).is_err());
        let spec = SolveSpec {
            target_year: 0,
            ..SolveSpec::endowment(SolveType::EePremium, 10)
        };
        assert!(spec.validate(10).is_err());
    }

    #[test]
    fn test_specamt_solve_matches_bisection() {
        let tables = RateTables::sample_product();
        let engine = IllustrationEngine::new(
            cvat(100_000.0, 3_000.0),
            &tables,
            ProjectionConfig::default(),
            LedgerType::NonIllustrationReg,
        )
        .unwrap();
        let spec = SolveSpec::endowment(SolveType::SpecAmt, engine.length());

        let ledger = engine.run(Some(&spec)).unwrap();
        let outcome = ledger.solve.clone().unwrap();
        assert!(outcome.applied);
        let root = outcome.result.root;
        assert!(50_000.0 < root);

        let schedules = Schedules::from_params(engine.params());
        let requested = Outlay::requested(&schedules, engine.params());
        let f = |x: f64| objective(&engine, &spec, &schedules, &requested, x).unwrap();
        assert!(0.0 <= f(root));
        assert!(f(root + 1.0) < 0.0);

        // Plain bisection to the nearest dollar on the same objective.
        let (mut lo, mut hi) = (50_000.0, 10_000_000.0);
        while 1.0 < hi - lo {
            let mid = 0.5 * (lo + hi);
            if 0.0 <= f(mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        assert!((root - lo).abs() < 2.0);

        // The solved amount flows into the ledger.
        assert_eq!(ledger.invariant.specamt[0], root);
    }

    #[test]
    fn test_premium_solve_for_csv_target() {
        let tables = RateTables::sample_product();
        let engine = IllustrationEngine::new(
            cvat(100_000.0, 0.0),
            &tables,
            ProjectionConfig::default(),
            LedgerType::NonIllustrationReg,
        )
        .unwrap();
        let spec = SolveSpec {
            target: SolveTarget::CashSurrenderValue(50_000.0),
            target_year: 20,
            ..SolveSpec::endowment(SolveType::EePremium, engine.length())
        };

        let ledger = engine.run(Some(&spec)).unwrap();
        let outcome = ledger.solve.clone().unwrap();
        assert!(outcome.applied);
        // The unsolved contract lapses at once.
        assert_eq!(outcome.baseline_csv, 0.0);
        let csv = ledger.current().unwrap().csv_net[19];
        assert!(50_000.0 <= csv);
        assert!(csv < 50_100.0);
    }

    #[test]
    fn test_unbracketed_solve_keeps_input() {
        let tables = RateTables::sample_product();
        let mut config = ProjectionConfig::default();
        config.solve_upper_bound = 10.0;
        let engine =
            IllustrationEngine::new(cvat(100_000.0, 2_000.0), &tables, config, LedgerType::NonIllustrationReg).unwrap();
        let spec = SolveSpec::endowment(SolveType::EePremium, engine.length());

        let ledger = engine.run(Some(&spec)).unwrap();
        let outcome = ledger.solve.unwrap();
        assert!(!outcome.applied);
        assert_eq!(outcome.result.validity, RootValidity::NotBracketed);
        assert_eq!(ledger.invariant.gross_pmt[0], 2_000.0);
    }

    #[test]
    fn test_overlay_replaces_only_solved_schedule() {
        let params = RunParameters::level(45, 3, 100_000.0, 1_000.0);
        let mut realized = Outlay::requested(&Schedules::from_params(&params), &params);
        realized.loan = vec![0.0, 250.0, 0.0];
        let mut trial_schedules = Schedules::from_params(&params);
        trial_schedules.ee_payment = vec![1_500.0; 3];
        trial_schedules.loan = vec![9_999.0; 3];
        let trial = Outlay::requested(&trial_schedules, &params);

        let spec = SolveSpec::endowment(SolveType::EePremium, 3);
        let outlay = spec.overlay(&realized, trial);
        assert_eq!(outlay.ee(1, 0), 1_500.0);
        assert_eq!(outlay.loan, vec![0.0, 250.0, 0.0]);
    }

    #[test]
    fn test_guaranteed_solve_matches_final_ledger() {
        let tables = RateTables::sample_product();
        let mut params = cvat(100_000.0, 3_000.0);
        params.loan[5] = 2_000.0;
        let engine =
            IllustrationEngine::new(params, &tables, ProjectionConfig::default(), LedgerType::NonIllustrationReg).unwrap();
        let spec = SolveSpec {
            target: SolveTarget::CashSurrenderValue(40_000.0),
            target_year: 20,
            basis: Basis::Guaranteed,
            ..SolveSpec::endowment(SolveType::EePremium, engine.length())
        };

        let ledger = engine.run(Some(&spec)).unwrap();
        assert!(ledger.solve.as_ref().unwrap().applied);
        assert_relative_eq!(ledger.invariant.new_loan[5], 2_000.0);
        // The guaranteed run in the ledger sees the same outlay the solve did.
        let csv = ledger.variant(Basis::Guaranteed).unwrap().csv_net[19];
        assert!(40_000.0 - 0.01 <= csv);
        assert!(csv < 40_010.0);
    }
}
