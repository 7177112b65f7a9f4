//! Parametric mortality used to generate the sample product's tables
//!
//! Annual rates follow a Gompertz-Makeham law
//! `q(x) = min(cap, a + b·c^x)`, which is smooth enough to exercise COI
//! banding, corridor death benefits and partial mortality without shipping
//! a regulatory table.

/// Method for converting annual mortality rates to monthly
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonthlyConversion {
    /// q_monthly = 1 - (1 - q_annual)^(1/12)
    Standard,
    /// q_monthly = q_annual / 12
    SimpleDivision,
}

impl MonthlyConversion {
    pub fn monthly(&self, annual: f64) -> f64 {
        let q = annual.clamp(0.0, 1.0);
        match self {
            MonthlyConversion::Standard => -((-q).ln_1p() / 12.0).exp_m1(),
            MonthlyConversion::SimpleDivision => q / 12.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MortalityCurve {
    /// Age-independent (accident) component
    pub makeham: f64,
    /// Gompertz level at age zero
    pub gompertz_b: f64,
    /// Gompertz growth per year of age
    pub gompertz_c: f64,
    /// Ceiling on the annual rate
    pub cap: f64,
}

impl MortalityCurve {
    /// Guaranteed-basis curve, roughly the shape of a valuation table
    pub fn guaranteed_valuation() -> Self {
        Self {
            makeham: 0.0005,
            gompertz_b: 0.000_02,
            gompertz_c: 1.105,
            cap: 1.0,
        }
    }

    /// Current-basis experience: a flat fraction of the guaranteed curve
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            makeham: self.makeham * factor,
            gompertz_b: self.gompertz_b * factor,
            gompertz_c: self.gompertz_c,
            cap: self.cap,
        }
    }

    pub fn annual_rate(&self, attained_age: usize) -> f64 {
        let q = self.makeham + self.gompertz_b * self.gompertz_c.powi(attained_age as i32);
        q.min(self.cap)
    }

    /// Annual rates for ages `0..=omega`
    pub fn annual_rates(&self, omega: usize) -> Vec<f64> {
        (0..=omega).map(|age| self.annual_rate(age)).collect()
    }

    /// Monthly rates for ages `0..=omega`
    pub fn monthly_rates(&self, omega: usize, conversion: MonthlyConversion) -> Vec<f64> {
        (0..=omega)
            .map(|age| conversion.monthly(self.annual_rate(age)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rates_increase_with_age() {
        let curve = MortalityCurve::guaranteed_valuation();
        let rates = curve.annual_rates(99);
        assert!(rates.windows(2).all(|w| w[0] <= w[1]));
        assert!(rates[35] < 0.005);
        assert!(rates[99] <= 1.0);
    }

    #[test]
    fn test_monthly_conversion() {
        let q = 0.01771;
        let monthly = MonthlyConversion::Standard.monthly(q);
        assert!((monthly - 0.0014882).abs() < 0.000_001, "monthly {}", monthly);
        assert_relative_eq!(MonthlyConversion::SimpleDivision.monthly(q), q / 12.0);
        assert_eq!(MonthlyConversion::Standard.monthly(1.0), 1.0);
    }
}
