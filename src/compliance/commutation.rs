//! Annual commutation functions for guideline and seven-pay premiums

/// Commutation columns by policy duration, with an endowment at maturity
#[derive(Debug, Clone)]
pub struct Commutation {
    d: Vec<f64>,
    n: Vec<f64>,
    m: Vec<f64>,
    d_endt: f64,
}

impl Commutation {
    /// Build from annual mortality `q` by duration and an annual interest rate
    pub fn new(q: &[f64], interest: f64) -> Self {
        let len = q.len();
        let v = 1.0 / (1.0 + interest);

        let mut d = Vec::with_capacity(len);
        let mut c = Vec::with_capacity(len);
        let mut lives = 1.0;
        let mut discount = 1.0;
        for &qx in q {
            let qx = qx.clamp(0.0, 1.0);
            d.push(discount * lives);
            c.push(discount * v * lives * qx);
            lives *= 1.0 - qx;
            discount *= v;
        }
        let d_endt = discount * lives;

        let mut n = vec![0.0; len + 1];
        let mut m = vec![0.0; len + 1];
        for t in (0..len).rev() {
            n[t] = n[t + 1] + d[t];
            m[t] = m[t + 1] + c[t];
        }

        Self { d, n, m, d_endt }
    }

    pub fn len(&self) -> usize {
        self.d.len()
    }

    pub fn is_empty(&self) -> bool {
        self.d.is_empty()
    }

    /// Net single premium per dollar for endowment insurance from duration `t`
    pub fn nsp(&self, t: usize) -> f64 {
        match self.d.get(t) {
            Some(&dt) if 0.0 < dt => (self.m[t] + self.d_endt) / dt,
            _ => 1.0,
        }
    }

    /// Annuity-due to maturity from duration `t`
    pub fn annuity_due(&self, t: usize) -> f64 {
        match self.d.get(t) {
            Some(&dt) if 0.0 < dt => self.n[t] / dt,
            _ => 0.0,
        }
    }

    /// Temporary annuity-due for `years` years from duration `t`
    pub fn temporary_annuity_due(&self, t: usize, years: usize) -> f64 {
        let end = (t + years).min(self.len());
        match self.d.get(t) {
            Some(&dt) if 0.0 < dt => (self.n[t] - self.n[end]) / dt,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_mortality_is_pure_interest() {
        let c = Commutation::new(&[0.0; 10], 0.04);
        // Endowment with no deaths is a pure endowment: v^10.
        assert_relative_eq!(c.nsp(0), 1.04f64.powi(-10), epsilon = 1e-12);
        // Annuity-due certain for 10 years.
        let v: f64 = 1.0 / 1.04;
        let certain = (1.0 - v.powi(10)) / (1.0 - v);
        assert_relative_eq!(c.annuity_due(0), certain, epsilon = 1e-12);
        assert_relative_eq!(c.temporary_annuity_due(0, 7), (1.0 - v.powi(7)) / (1.0 - v), epsilon = 1e-12);
    }

    #[test]
    fn test_insurance_annuity_identity() {
        // For endowment insurance, A = 1 - d·ä with d = i/(1+i).
        let q: Vec<f64> = (0..40).map(|t| 0.002 + 0.001 * t as f64).collect();
        let i = 0.06;
        let c = Commutation::new(&q, i);
        let d = i / (1.0 + i);
        for t in [0, 5, 39] {
            assert_relative_eq!(c.nsp(t), 1.0 - d * c.annuity_due(t), epsilon = 1e-12);
        }
    }
}
