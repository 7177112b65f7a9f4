//! Formula-generated sample product

use super::mortality::{MonthlyConversion, MortalityCurve};
use super::product::ProductFeatures;
use super::{Indexing, RateKey, RateSeries, RateTables};

const OMEGA: usize = 120;

/// Corridor factors of the 7702(d) cash value corridor, by attained age
fn gpt_corridor(age: usize) -> f64 {
    // (age, factor) breakpoints; linear between them
    const POINTS: [(usize, f64); 10] = [
        (40, 2.50),
        (45, 2.15),
        (50, 1.85),
        (55, 1.50),
        (60, 1.30),
        (65, 1.20),
        (70, 1.15),
        (75, 1.05),
        (90, 1.05),
        (95, 1.00),
    ];
    if age <= POINTS[0].0 {
        return POINTS[0].1;
    }
    for w in POINTS.windows(2) {
        let (a0, f0) = w[0];
        let (a1, f1) = w[1];
        if age <= a1 {
            return f0 + (f1 - f0) * (age - a0) as f64 / (a1 - a0) as f64;
        }
    }
    1.0
}

/// Sales loads by duration: heavier in the first ten years
fn load_by_duration(early: f64, late: f64) -> Vec<f64> {
    (0..OMEGA).map(|t| if t < 10 { early } else { late }).collect()
}

pub(super) fn sample_tables() -> RateTables {
    let product = ProductFeatures::default();

    let guaranteed = MortalityCurve::guaranteed_valuation();
    let current = guaranteed.scaled(0.60);
    let conversion = MonthlyConversion::Standard;

    let guar_coi = guaranteed.monthly_rates(OMEGA, conversion);
    let band = |factor: f64| {
        let curr: Vec<f64> = current
            .monthly_rates(OMEGA, conversion)
            .iter()
            .map(|q| q * factor)
            .collect();
        RateSeries::by_basis(Indexing::AttainedAge, curr, guar_coi.clone())
    };
    let term_coi: Vec<f64> = current
        .monthly_rates(OMEGA, conversion)
        .iter()
        .map(|q| q * 1.10)
        .collect();

    let surrchg_factor: Vec<f64> = (0..=10).map(|t| 0.03 * (10 - t) as f64 / 10.0).collect();
    let target_rate: Vec<f64> = (0..=OMEGA).map(|age| 0.004 + 0.000_45 * age as f64).collect();
    let min_rate: Vec<f64> = target_rate.iter().map(|r| 0.6 * r).collect();
    let corridor: Vec<f64> = (0..=OMEGA).map(gpt_corridor).collect();

    RateTables::new(product)
        .with_table(RateKey::CoiBand0, band(1.00))
        .with_table(RateKey::CoiBand1, band(0.90))
        .with_table(RateKey::CoiBand2, band(0.80))
        .with_table(RateKey::TermCoi, RateSeries::by_basis(Indexing::AttainedAge, term_coi, guar_coi.clone()))
        .with_table(RateKey::GenAcctInterest, RateSeries::level_by_basis(0.045, 0.030))
        .with_table(RateKey::SepAcctGrossInterest, RateSeries::level_by_basis(0.070, 0.000))
        .with_table(RateKey::SepAcctMandE, RateSeries::level_by_basis(0.009, 0.012))
        .with_table(RateKey::RegLoanCredited, RateSeries::level_by_basis(0.040, 0.030))
        .with_table(RateKey::RegLoanDue, RateSeries::level(0.060))
        .with_table(RateKey::PrfLoanCredited, RateSeries::level_by_basis(0.045, 0.030))
        .with_table(RateKey::PrfLoanDue, RateSeries::level(0.045))
        .with_table(RateKey::HoneymoonRate, RateSeries::level_by_basis(0.030, 0.000))
        .with_table(
            RateKey::TargetPremiumLoad,
            RateSeries::by_basis(Indexing::Duration, load_by_duration(0.06, 0.02), load_by_duration(0.08, 0.04)),
        )
        .with_table(
            RateKey::ExcessPremiumLoad,
            RateSeries::by_basis(Indexing::Duration, load_by_duration(0.03, 0.02), load_by_duration(0.05, 0.04)),
        )
        .with_table(RateKey::MonthlyPolicyFee, RateSeries::level_by_basis(5.0, 8.0))
        .with_table(RateKey::AnnualPolicyFee, RateSeries::level(0.0))
        .with_table(
            RateKey::SpecAmtLoad,
            RateSeries::by_basis(Indexing::Duration, load_by_duration(0.000_05, 0.0), load_by_duration(0.000_10, 0.000_05)),
        )
        .with_table(RateKey::AcctValLoad, RateSeries::level_by_basis(0.0, 0.000_5))
        .with_table(RateKey::SurrChgSpecAmtFactor, RateSeries::invariant(Indexing::Duration, surrchg_factor))
        .with_table(RateKey::SurrChgAvMult, RateSeries::level(0.0))
        .with_table(RateKey::SurrChgPremMult, RateSeries::level(0.0))
        .with_table(
            RateKey::RefundableSalesLoad,
            RateSeries::invariant(Indexing::Duration, vec![0.5, 0.25, 0.0]),
        )
        .with_table(RateKey::TargetPremiumRate, RateSeries::invariant(Indexing::AttainedAge, target_rate))
        .with_table(RateKey::MinPremiumRate, RateSeries::invariant(Indexing::AttainedAge, min_rate))
        .with_table(RateKey::Corridor, RateSeries::invariant(Indexing::AttainedAge, corridor))
        .with_table(RateKey::Qc7702, RateSeries::invariant(Indexing::AttainedAge, guaranteed.annual_rates(OMEGA)))
        .with_table(
            RateKey::PartialMortality,
            RateSeries::invariant(Indexing::AttainedAge, current.annual_rates(OMEGA)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_corridor_breakpoints() {
        assert_relative_eq!(gpt_corridor(30), 2.50);
        assert_relative_eq!(gpt_corridor(42), 2.36, epsilon = 1e-12);
        assert_relative_eq!(gpt_corridor(80), 1.05);
        assert_relative_eq!(gpt_corridor(100), 1.00);
    }
}
