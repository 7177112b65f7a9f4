//! Brent's method for the zero of a scalar function
//!
//! Follows the ALGOL procedure `zero` in Brent, *Algorithms for
//! Minimization without Derivatives* (1973), with two additions needed
//! when each evaluation is a full policy simulation:
//!
//! - every iterand is rounded before evaluation, and when rounding makes it
//!   coincide with a point already evaluated the cached ordinate is reused;
//! - a bias may require the returned point to have an ordinate of a given
//!   sign. The other bracket endpoint is substituted only when it satisfies
//!   the tolerance in terms of its own magnitude.
//!
//! Failure to bracket a root is not an error: it is reported through
//! [`RootValidity`] and the caller decides what to do.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::currency::{RoundTo, RoundingStyle};

/// Hard ceiling on iterations. Brent's method needs at most about
/// `(log2((b - a) / t))^2` steps, far fewer than this for any finite
/// bracket; the ceiling only matters if the objective misbehaves.
pub const MAX_ITERATIONS: usize = 1000;

/// Required sign of the ordinate at the returned root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootBias {
    /// Whichever endpoint is the better approximation
    None,
    /// `f(z) <= 0`
    Lower,
    /// `0 <= f(z)`
    Higher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootValidity {
    Valid,
    /// Ordinates at the bounds have the same sign, or one is NaN
    NotBracketed,
    /// Bounds are equal after rounding
    ImproperBounds,
    /// [`MAX_ITERATIONS`] reached without meeting the tolerance
    NotConverged,
}

/// Reason for the most recent step, shown in the iteration trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootImpetus {
    EvaluateBounds,
    ForceBracket,
    ForceBestApproximation,
    InterpolateLinear,
    InterpolateInverseQuadratic,
    DitheringNearRoot,
    SecantOutOfBounds,
    ParabolaNotSingleValued,
    GuaranteeLinearConvergence,
    PisAller,
}

impl RootImpetus {
    pub fn code(&self) -> char {
        match self {
            RootImpetus::EvaluateBounds => 'i',
            RootImpetus::ForceBracket => 'j',
            RootImpetus::ForceBestApproximation => 'k',
            RootImpetus::InterpolateLinear => 'L',
            RootImpetus::InterpolateInverseQuadratic => 'Q',
            RootImpetus::DitheringNearRoot => '0',
            RootImpetus::SecantOutOfBounds => '1',
            RootImpetus::ParabolaNotSingleValued => '2',
            RootImpetus::GuaranteeLinearConvergence => '3',
            RootImpetus::PisAller => '4',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootResult {
    pub root: f64,
    pub validity: RootValidity,
    pub n_iter: usize,
    pub n_eval: usize,
}

impl RootResult {
    pub fn is_valid(&self) -> bool {
        RootValidity::Valid == self.validity
    }
}

/// Bracket bookkeeping: `b` is the best approximation, `c` the opposite
/// bracket endpoint, `a` the previous `b`
struct Bracket {
    a: f64,
    fa: f64,
    b: f64,
    fb: f64,
    c: f64,
    fc: f64,
}

impl Bracket {
    fn trace(&self, n_iter: usize, n_eval: usize, impetus: RootImpetus) {
        trace!(
            "{:>3} {:>3} {} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            n_iter,
            n_eval,
            impetus.code(),
            self.a,
            self.fa,
            self.b,
            self.fb,
            self.c,
            self.fc
        );
    }
}

/// Find a zero of `f` between `bound0` and `bound1`
///
/// `tolerance` is Brent's `t`: the result is within `6ε|z| + 2t` of a zero.
/// `round` is applied to the bounds and to every iterand before `f` sees it.
/// An error returned by `f` aborts the search and is passed through.
pub fn find_root<F, R, E>(
    mut f: F,
    bound0: f64,
    bound1: f64,
    tolerance: f64,
    bias: RootBias,
    round: R,
) -> Result<RootResult, E>
where
    F: FnMut(f64) -> Result<f64, E>,
    R: Fn(f64) -> f64,
{
    let epsilon = f64::EPSILON;
    let t = tolerance;
    let mut n_iter = 0;
    let mut n_eval = 0;

    let finish = |root: f64, validity: RootValidity, n_iter: usize, n_eval: usize| {
        trace!("{} iterations, {} evaluations; root {} ({:?})", n_iter, n_eval, root, validity);
        RootResult {
            root,
            validity,
            n_iter,
            n_eval,
        }
    };

    let a = round(bound0);
    let b = round(bound1);
    if a == b {
        return Ok(finish(a, RootValidity::ImproperBounds, n_iter, n_eval));
    }

    let fa = f(a)?;
    n_eval += 1;
    if 0.0 == fa {
        return Ok(finish(a, RootValidity::Valid, n_iter, n_eval));
    }

    let fb = f(b)?;
    n_eval += 1;
    let mut z = Bracket { a, fa, b, fb, c: b, fc: fb };
    z.trace(n_iter, n_eval, RootImpetus::EvaluateBounds);
    if 0.0 == fb {
        return Ok(finish(b, RootValidity::Valid, n_iter, n_eval));
    }

    if fa.is_nan() || fb.is_nan() || (0.0 < fa) == (0.0 < fb) {
        return Ok(finish(0.0, RootValidity::NotBracketed, n_iter, n_eval));
    }

    let mut d = z.b - z.a;
    let mut e = d;

    loop {
        if MAX_ITERATIONS <= n_iter {
            return Ok(finish(z.b, RootValidity::NotConverged, n_iter, n_eval));
        }

        if (0.0 < z.fb) == (0.0 < z.fc) {
            z.c = z.a;
            z.fc = z.fa;
            d = z.b - z.a;
            e = d;
            z.trace(n_iter, n_eval, RootImpetus::ForceBracket);
        }
        if z.fc.abs() < z.fb.abs() {
            z.a = z.b;
            z.b = z.c;
            z.c = z.a;
            z.fa = z.fb;
            z.fb = z.fc;
            z.fc = z.fa;
            z.trace(n_iter, n_eval, RootImpetus::ForceBestApproximation);
        }

        let tol = 2.0 * epsilon * z.b.abs() + t;
        let m = 0.5 * (z.c - z.b);
        if 0.0 == z.fb || m.abs() <= tol {
            let b_acceptable = match bias {
                RootBias::None => true,
                RootBias::Lower => z.fb <= 0.0,
                RootBias::Higher => 0.0 <= z.fb,
            };
            if b_acceptable {
                return Ok(finish(z.b, RootValidity::Valid, n_iter, n_eval));
            }
            // The other endpoint has the required sign; it may stand in
            // only if it meets the tolerance computed from its own size.
            if m.abs() <= 2.0 * epsilon * z.c.abs() + t {
                return Ok(finish(z.c, RootValidity::Valid, n_iter, n_eval));
            }
        }

        let mut impetus;
        if e.abs() < tol {
            impetus = RootImpetus::DitheringNearRoot;
            d = m;
            e = m;
        } else if z.fa.abs() <= z.fb.abs() {
            impetus = RootImpetus::SecantOutOfBounds;
            d = m;
            e = m;
        } else {
            let mut p;
            let mut q;
            let s = z.fb / z.fa;
            if z.a == z.c {
                impetus = RootImpetus::InterpolateLinear;
                p = 2.0 * m * s;
                q = 1.0 - s;
            } else {
                impetus = RootImpetus::InterpolateInverseQuadratic;
                let qa = z.fa / z.fc;
                let r = z.fb / z.fc;
                p = s * (2.0 * m * qa * (qa - r) - (z.b - z.a) * (r - 1.0));
                q = (qa - 1.0) * (r - 1.0) * (s - 1.0);
            }
            if 0.0 < p {
                q = -q;
            } else {
                p = -p;
            }
            let prior_e = e;
            e = d;
            // Brent's ALGOL criteria, which subtract tol·|q| from the
            // first test and compare against the step before last.
            let k0 = 2.0 * p < 3.0 * m * q - (tol * q).abs();
            let k1 = p < (0.5 * prior_e * q).abs();
            // NaN makes both false, so the fallback must bisect.
            if k0 && k1 {
                d = p / q;
            } else {
                impetus = if k0 {
                    RootImpetus::ParabolaNotSingleValued
                } else if k1 {
                    RootImpetus::GuaranteeLinearConvergence
                } else {
                    RootImpetus::PisAller
                };
                d = m;
                e = m;
            }
        }

        z.a = z.b;
        z.fa = z.fb;
        if tol < d.abs() {
            z.b += d;
        } else if 0.0 < m {
            z.b += tol;
        } else {
            z.b -= tol;
        }
        z.b = round(z.b);

        if z.b == z.a {
            z.fb = z.fa;
        } else if z.b == z.c {
            z.fb = z.fc;
        } else {
            z.fb = f(z.b)?;
            n_eval += 1;
            z.trace(n_iter, n_eval, impetus);
        }

        n_iter += 1;
    }
}

/// [`find_root`] on a decimal grid: iterands are rounded to `decimals`
/// places (to nearest) and the tolerance is half a unit in the last place
pub fn decimal_root<F, E>(
    f: F,
    bound0: f64,
    bound1: f64,
    bias: RootBias,
    decimals: i32,
) -> Result<RootResult, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let rounding = RoundTo::new(decimals, RoundingStyle::ToNearest);
    find_root(
        f,
        bound0,
        bound1,
        0.5 * 10f64.powi(-decimals),
        bias,
        |x| rounding.apply(x),
    )
}
