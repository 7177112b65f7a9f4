//! Decimal rounding for currency amounts and rates

use serde::{Deserialize, Serialize};

use super::equality::materially_equal;

/// Direction in which a value is rounded to its decimal grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundingStyle {
    /// Leave the value unchanged
    NotAtAll,
    /// Nearest grid point; exact binary ties go away from zero
    ToNearest,
    /// Toward positive infinity
    Upward,
    /// Toward negative infinity
    Downward,
    /// Toward zero
    Truncate,
}

/// A rounding rule: number of decimals plus style
///
/// `decimals` may be negative, e.g. `-2` rounds to hundreds.
///
/// Directional styles snap values that already sit on the grid up to
/// binary representation error (e.g. `0.29 * 100.0 = 28.999999999999996`)
/// before rounding, so that rounding is idempotent for every style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundTo {
    decimals: i32,
    style: RoundingStyle,
}

impl RoundTo {
    pub fn new(decimals: i32, style: RoundingStyle) -> Self {
        Self { decimals, style }
    }

    /// Rule that returns its argument unchanged
    pub fn identity() -> Self {
        Self::new(0, RoundingStyle::NotAtAll)
    }

    pub fn decimals(&self) -> i32 {
        self.decimals
    }

    pub fn style(&self) -> RoundingStyle {
        self.style
    }

    /// Round a value according to this rule
    pub fn apply(&self, x: f64) -> f64 {
        if RoundingStyle::NotAtAll == self.style || !x.is_finite() {
            return x;
        }

        let scaled = self.scale_up(x);
        let nearest = scaled.round();
        let grid = match self.style {
            RoundingStyle::ToNearest => nearest,
            _ if materially_equal(scaled, nearest) => nearest,
            RoundingStyle::Upward => scaled.ceil(),
            RoundingStyle::Downward => scaled.floor(),
            RoundingStyle::Truncate => scaled.trunc(),
            RoundingStyle::NotAtAll => scaled,
        };
        self.scale_down(grid)
    }

    fn scale_up(&self, x: f64) -> f64 {
        if 0 <= self.decimals {
            x * 10f64.powi(self.decimals)
        } else {
            x / 10f64.powi(-self.decimals)
        }
    }

    fn scale_down(&self, n: f64) -> f64 {
        if 0 <= self.decimals {
            n / 10f64.powi(self.decimals)
        } else {
            n * 10f64.powi(-self.decimals)
        }
    }
}

impl Default for RoundTo {
    fn default() -> Self {
        Self::identity()
    }
}

/// Product rounding rules, one per kind of amount
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundingRules {
    pub gross_premium: RoundTo,
    pub net_premium: RoundTo,
    pub withdrawal: RoundTo,
    pub loan: RoundTo,
    pub specified_amount: RoundTo,
    pub death_benefit: RoundTo,
    pub coi_charge: RoundTo,
    pub interest_credit: RoundTo,
    pub surrender_charge: RoundTo,
    pub interest_rate: RoundTo,
}

impl Default for RoundingRules {
    fn default() -> Self {
        Self {
            gross_premium: RoundTo::new(2, RoundingStyle::ToNearest),
            net_premium: RoundTo::new(2, RoundingStyle::ToNearest),
            withdrawal: RoundTo::new(2, RoundingStyle::Downward),
            loan: RoundTo::new(2, RoundingStyle::Downward),
            specified_amount: RoundTo::new(0, RoundingStyle::ToNearest),
            death_benefit: RoundTo::new(2, RoundingStyle::ToNearest),
            coi_charge: RoundTo::new(2, RoundingStyle::Upward),
            interest_credit: RoundTo::new(2, RoundingStyle::Downward),
            surrender_charge: RoundTo::new(2, RoundingStyle::ToNearest),
            interest_rate: RoundTo::new(10, RoundingStyle::ToNearest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: [RoundingStyle; 5] = [
        RoundingStyle::NotAtAll,
        RoundingStyle::ToNearest,
        RoundingStyle::Upward,
        RoundingStyle::Downward,
        RoundingStyle::Truncate,
    ];

    fn sample_values() -> Vec<f64> {
        let mut values = vec![
            0.0, -0.0, 0.005, -0.005, 0.015, 0.29, 1.005, 2.675, 1999.995,
            -1999.995, 123456.789, 1.0e-9, -7.777777, 0.125, -0.125,
        ];
        // A deterministic spread of awkward fractions.
        values.extend((1..500).map(|k| (k as f64) * 0.013_7 - 3.1));
        values
    }

    #[test]
    fn test_rounding_is_idempotent() {
        for style in STYLES {
            for decimals in -2..=6 {
                let r = RoundTo::new(decimals, style);
                for x in sample_values() {
                    let once = r.apply(x);
                    let twice = r.apply(once);
                    assert_eq!(once, twice, "style {:?} decimals {} x {}", style, decimals, x);
                }
            }
        }
    }

    #[test]
    fn test_to_nearest_tie_goes_away_from_zero() {
        let r = RoundTo::new(2, RoundingStyle::ToNearest);
        // 0.125 and -0.125 are exact binary ties.
        assert_eq!(r.apply(0.125), 0.13);
        assert_eq!(r.apply(-0.125), -0.13);
        // 2.675 is stored slightly below the tie, so it rounds down.
        assert_eq!(r.apply(2.675), 2.67);
    }

    #[test]
    fn test_directional_styles() {
        let up = RoundTo::new(2, RoundingStyle::Upward);
        let down = RoundTo::new(2, RoundingStyle::Downward);
        let trunc = RoundTo::new(2, RoundingStyle::Truncate);

        assert_eq!(up.apply(1.001), 1.01);
        assert_eq!(up.apply(-1.009), -1.0);
        assert_eq!(down.apply(1.009), 1.0);
        assert_eq!(down.apply(-1.001), -1.01);
        assert_eq!(trunc.apply(-1.009), -1.0);

        // Already on the grid up to representation error: unchanged.
        assert_eq!(up.apply(0.29), 0.29);
        assert_eq!(down.apply(0.29), 0.29);
    }

    #[test]
    fn test_negative_decimals() {
        let r = RoundTo::new(-2, RoundingStyle::ToNearest);
        assert_eq!(r.apply(12_345.0), 12_300.0);
        assert_eq!(r.apply(12_350.0), 12_400.0);
    }

    #[test]
    fn test_non_finite_passes_through() {
        let r = RoundTo::new(2, RoundingStyle::Upward);
        assert!(r.apply(f64::NAN).is_nan());
        assert_eq!(r.apply(f64::INFINITY), f64::INFINITY);
    }
}
