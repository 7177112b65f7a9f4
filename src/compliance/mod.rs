//! IRC 7702 and 7702A compliance tracking
//!
//! [`Irc7702`] holds the guideline premiums (GLP, GSP), the guideline
//! premium limit, the seven-pay premium and the MEC status of one
//! simulation. The projection updates it through a narrow interface:
//! beginning-of-year updates, premium limiting, payment recording and
//! benefit changes.
//!
//! Premiums are computed from annual curtate commutation functions on the
//! 7702 mortality, at 4% for the GLP and seven-pay premium and at 6% for
//! the GSP, for an endowment at the product's maturity age.

mod commutation;

pub use commutation::Commutation;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::currency::{material_difference, materially_equal};
use crate::policy::DefnLifeIns;

/// Statutory interest for the guideline level premium and seven-pay premium
pub const GLP_INTEREST: f64 = 0.04;
/// Statutory interest for the guideline single premium
pub const GSP_INTEREST: f64 = 0.06;
/// Length of the 7702A test period
pub const SEVEN_PAY_YEARS: usize = 7;

/// Expense charges that enter the guideline premiums
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuidelineCharges {
    /// Premium load, as a proportion of gross premium
    pub premium_load: f64,
    /// Annual charge per policy
    pub per_policy: f64,
    /// Annual charge per dollar of specified amount
    pub per_specamt: f64,
}

impl Default for GuidelineCharges {
    fn default() -> Self {
        Self {
            premium_load: 0.0,
            per_policy: 0.0,
            per_specamt: 0.0,
        }
    }
}

/// Starting point for a tracker, distinct for new business and inforce
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplianceStart {
    /// Policy year of the first simulated month
    pub year: usize,
    /// Death benefit at that point
    pub death_benefit: f64,
    /// Lowest death benefit since the start of the 7702A test period
    pub least_death_benefit: f64,
    /// Premiums paid within the current seven-pay period before `year`
    pub seven_pay_paid: f64,
    /// Contract is a MEC before the run begins
    pub already_mec: bool,
}

#[derive(Debug, Clone)]
pub struct Irc7702 {
    test: DefnLifeIns,
    charges: GuidelineCharges,
    comm_glp: Commutation,
    comm_gsp: Commutation,

    glp: f64,
    gsp: f64,
    cum_glp: f64,

    seven_pay_start: usize,
    seven_pay_premium: f64,
    seven_pay_paid: f64,
    least_death_benefit: f64,

    is_mec: bool,
    mec_duration: Option<(usize, usize)>,
}

impl Irc7702 {
    /// `qc` is the annual 7702 mortality by policy duration, from issue to maturity
    pub fn new(test: DefnLifeIns, qc: &[f64], charges: GuidelineCharges, start: ComplianceStart) -> Self {
        let mut tracker = Self {
            test,
            charges,
            comm_glp: Commutation::new(qc, GLP_INTEREST),
            comm_gsp: Commutation::new(qc, GSP_INTEREST),
            glp: 0.0,
            gsp: 0.0,
            cum_glp: 0.0,
            seven_pay_start: 0,
            seven_pay_premium: 0.0,
            seven_pay_paid: start.seven_pay_paid,
            least_death_benefit: start.least_death_benefit,
            is_mec: start.already_mec,
            mec_duration: if start.already_mec { Some((0, 0)) } else { None },
        };
        // Guideline premiums are fixed at issue; an inforce contract
        // carries the issue-date values plus any adjustments, which a
        // level benefit reproduces.
        tracker.glp = tracker.level_premium_at(0, start.death_benefit);
        tracker.gsp = tracker.single_premium_at(0, start.death_benefit);
        tracker.cum_glp = tracker.glp * start.year as f64;
        tracker.seven_pay_premium = tracker.seven_pay_at(0, start.least_death_benefit);
        tracker
    }

    fn gross_up(&self) -> f64 {
        1.0 / (1.0 - self.charges.premium_load)
    }

    fn annual_charge(&self, death_benefit: f64) -> f64 {
        self.charges.per_policy + self.charges.per_specamt * death_benefit
    }

    /// Guideline level premium for a contract of this benefit as of duration `t`
    pub fn level_premium_at(&self, t: usize, death_benefit: f64) -> f64 {
        let annuity = self.comm_glp.annuity_due(t);
        if annuity <= 0.0 {
            return 0.0;
        }
        (death_benefit * self.comm_glp.nsp(t) / annuity + self.annual_charge(death_benefit)) * self.gross_up()
    }

    /// Guideline single premium for a contract of this benefit as of duration `t`
    pub fn single_premium_at(&self, t: usize, death_benefit: f64) -> f64 {
        let charges = self.annual_charge(death_benefit) * self.comm_gsp.annuity_due(t);
        (death_benefit * self.comm_gsp.nsp(t) + charges) * self.gross_up()
    }

    /// Seven-pay premium for a contract of this benefit as of duration `t`
    pub fn seven_pay_at(&self, t: usize, death_benefit: f64) -> f64 {
        let annuity = self.comm_glp.temporary_annuity_due(t, SEVEN_PAY_YEARS);
        if annuity <= 0.0 {
            return 0.0;
        }
        death_benefit * self.comm_glp.nsp(t) / annuity
    }

    /// Accumulate this year's GLP into the guideline limit
    pub fn update_boy(&mut self) {
        self.cum_glp += self.glp;
    }

    /// Guideline premium limit, or `None` when the test imposes none
    pub fn premium_limit(&self) -> Option<f64> {
        match self.test {
            DefnLifeIns::Gpt => Some(self.gsp.max(self.cum_glp)),
            DefnLifeIns::Cvat => None,
        }
    }

    /// Portion of `payment` that fits under the premium limit
    pub fn limit_payment(&self, cum_pmts: f64, payment: f64) -> f64 {
        match self.premium_limit() {
            Some(limit) => payment.min((limit - cum_pmts).max(0.0)),
            None => payment,
        }
    }

    /// Premium that must be returned because cumulative payments exceed the limit
    pub fn forceout(&self, cum_pmts: f64) -> f64 {
        match self.premium_limit() {
            Some(limit) => material_difference(cum_pmts, limit).max(0.0),
            None => 0.0,
        }
    }

    /// Record a premium for the 7702A test; returns true if it made the contract a MEC
    pub fn record_payment(&mut self, year: usize, month: usize, amount: f64) -> bool {
        if self.is_mec || 0.0 == amount {
            return false;
        }
        let t = year.saturating_sub(self.seven_pay_start);
        if SEVEN_PAY_YEARS <= t {
            return false;
        }
        self.seven_pay_paid += amount;
        self.test_seven_pay(year, month)
    }

    fn test_seven_pay(&mut self, year: usize, month: usize) -> bool {
        let t = year.saturating_sub(self.seven_pay_start);
        let allowed = self.seven_pay_premium * (t + 1) as f64;
        if allowed < self.seven_pay_paid && !materially_equal(allowed, self.seven_pay_paid) {
            debug!(
                "7702A: {:.2} paid exceeds {:.2} allowed in year {} month {}",
                self.seven_pay_paid, allowed, year, month
            );
            self.is_mec = true;
            self.mec_duration = Some((year, month));
            return true;
        }
        false
    }

    /// Apply a change in death benefit at duration (`year`, `month`)
    ///
    /// Guideline premiums are adjusted by the A + B - C rule. A reduction
    /// within the seven-pay period recomputes the seven-pay premium as if
    /// the contract had been issued at the reduced benefit, and retests the
    /// premiums already paid.
    pub fn adjust_for_benefit_change(&mut self, year: usize, month: usize, old_benefit: f64, new_benefit: f64) {
        if materially_equal(old_benefit, new_benefit) {
            return;
        }

        let delta_glp = self.level_premium_at(year, new_benefit) - self.level_premium_at(year, old_benefit);
        let delta_gsp = self.single_premium_at(year, new_benefit) - self.single_premium_at(year, old_benefit);
        self.glp += delta_glp;
        self.gsp += delta_gsp;
        self.cum_glp += delta_glp;
        debug!(
            "7702 adjustment in year {}: benefit {:.2} -> {:.2}, GLP {:.2}, GSP {:.2}",
            year, old_benefit, new_benefit, self.glp, self.gsp
        );

        let within_period = year.saturating_sub(self.seven_pay_start) < SEVEN_PAY_YEARS;
        if within_period && new_benefit < self.least_death_benefit {
            self.least_death_benefit = new_benefit;
            self.seven_pay_premium = self.seven_pay_at(self.seven_pay_start, new_benefit);
            if !self.is_mec {
                self.test_seven_pay(year, month);
            }
        }
    }

    pub fn glp(&self) -> f64 {
        self.glp
    }

    pub fn gsp(&self) -> f64 {
        self.gsp
    }

    pub fn cum_glp(&self) -> f64 {
        self.cum_glp
    }

    pub fn seven_pay_premium(&self) -> f64 {
        self.seven_pay_premium
    }

    pub fn is_mec(&self) -> bool {
        self.is_mec
    }

    /// (year, month) in which the contract became a MEC
    pub fn mec_duration(&self) -> Option<(usize, usize)> {
        self.mec_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn qc() -> Vec<f64> {
        (45..100).map(|age| (0.0005 + 0.000_02 * 1.105f64.powi(age)).min(1.0)).collect()
    }

    fn new_business(test: DefnLifeIns, db: f64) -> Irc7702 {
        Irc7702::new(
            test,
            &qc(),
            GuidelineCharges {
                premium_load: 0.05,
                per_policy: 60.0,
                per_specamt: 0.0,
            },
            ComplianceStart {
                year: 0,
                death_benefit: db,
                least_death_benefit: db,
                seven_pay_paid: 0.0,
                already_mec: false,
            },
        )
    }

    #[test]
    fn test_guideline_premium_ordering() {
        let mut t = new_business(DefnLifeIns::Gpt, 100_000.0);
        t.update_boy();
        assert!(0.0 < t.glp());
        assert!(t.glp() < t.seven_pay_premium() * 1.5);
        assert!(t.glp() < t.gsp());
        // In the first year the single premium governs.
        assert_relative_eq!(t.premium_limit().unwrap(), t.gsp());
    }

    #[test]
    fn test_limit_and_forceout() {
        let mut t = new_business(DefnLifeIns::Gpt, 100_000.0);
        t.update_boy();
        let limit = t.premium_limit().unwrap();
        assert_relative_eq!(t.limit_payment(0.0, 2.0 * limit), limit);
        assert_relative_eq!(t.limit_payment(limit - 100.0, 500.0), 100.0);
        assert_eq!(t.forceout(limit), 0.0);

        // A decrease lowers the limit; premiums already paid above it are forced out.
        t.adjust_for_benefit_change(0, 6, 100_000.0, 50_000.0);
        let lower = t.premium_limit().unwrap();
        assert!(lower < limit);
        assert_relative_eq!(t.forceout(limit), limit - lower, epsilon = 1e-9);
    }

    #[test]
    fn test_cvat_has_no_premium_limit() {
        let t = new_business(DefnLifeIns::Cvat, 100_000.0);
        assert_eq!(t.premium_limit(), None);
        assert_eq!(t.limit_payment(1.0e9, 123.0), 123.0);
        assert_eq!(t.forceout(1.0e9), 0.0);
    }

    #[test]
    fn test_seven_pay_mec() {
        let mut t = new_business(DefnLifeIns::Cvat, 100_000.0);
        let sp = t.seven_pay_premium();
        assert!(!t.record_payment(0, 0, sp));
        assert!(!t.record_payment(1, 0, sp));
        assert!(t.record_payment(2, 0, 1.5 * sp));
        assert!(t.is_mec());
        assert_eq!(t.mec_duration(), Some((2, 0)));
        // Once a MEC, always a MEC.
        assert!(!t.record_payment(3, 0, 0.0));
        assert!(t.is_mec());
    }

    #[test]
    fn test_reduction_retests_seven_pay() {
        let mut t = new_business(DefnLifeIns::Cvat, 100_000.0);
        let sp = t.seven_pay_premium();
        assert!(!t.record_payment(0, 0, sp));
        assert!(!t.record_payment(1, 0, sp));
        // Halving the benefit halves the seven-pay premium retroactively.
        t.adjust_for_benefit_change(1, 6, 100_000.0, 50_000.0);
        assert_relative_eq!(t.seven_pay_premium(), 0.5 * sp, epsilon = 1e-9);
        assert!(t.is_mec());
        assert_eq!(t.mec_duration(), Some((1, 6)));
    }

    #[test]
    fn test_already_mec_at_start() {
        let t = Irc7702::new(
            DefnLifeIns::Gpt,
            &qc(),
            GuidelineCharges::default(),
            ComplianceStart {
                year: 0,
                death_benefit: 100_000.0,
                least_death_benefit: 100_000.0,
                seven_pay_paid: 0.0,
                already_mec: true,
            },
        );
        assert!(t.is_mec());
        assert_eq!(t.mec_duration(), Some((0, 0)));
    }
}
