//! Rates in effect for one policy year on one basis

use crate::assumptions::{monthly_discount, RateKey, RateTables};
use crate::basis::Basis;
use crate::currency::RoundTo;
use crate::error::Result;
use crate::policy::RunParameters;

/// One year's rates, looked up once at the start of the year
///
/// Interest rates are kept annual-effective; the monthly engine converts
/// them per month because the period length depends on day-count
/// accounting. COI rates, loads and fees are already monthly.
#[derive(Debug, Clone, Default)]
pub struct YearRates {
    /// Monthly COI rate for the band selected by specified amount
    pub coi: f64,
    pub term_coi: f64,

    pub gen_acct: f64,
    pub sep_acct_gross: f64,
    /// M&E from the rate table; replaced monthly by the tiered rate when dynamic
    pub m_and_e: f64,
    pub asset_comp: f64,
    pub sep_acct_load: f64,
    pub reg_ln_credited: f64,
    pub reg_ln_due: f64,
    pub prf_ln_credited: f64,
    pub prf_ln_due: f64,
    pub honeymoon: f64,

    pub target_load: f64,
    pub excess_load: f64,
    pub monthly_fee: f64,
    pub annual_fee: f64,
    pub specamt_load: f64,
    pub acct_val_load: f64,

    pub surrchg_av_mult: f64,
    pub surrchg_prem_mult: f64,
    pub refundable_load: f64,
    pub cash_value_enhancement: f64,

    pub corridor: f64,
    /// One-month discount at the guaranteed general-account rate, for NAAR
    pub naar_discount: f64,

    pub target_premium_rate: f64,
    pub min_premium_rate: f64,
}

impl YearRates {
    pub fn load(
        tables: &RateTables,
        basis: Basis,
        params: &RunParameters,
        year: usize,
        specamt: f64,
        rate_rounding: &RoundTo,
    ) -> Result<Self> {
        let age = params.issue_age;
        let rate = |key: RateKey| tables.rate(key, basis, age, year);
        let interest = |key: RateKey| -> Result<f64> { Ok(rate_rounding.apply(rate(key)?)) };

        let guar_gen_acct = tables.rate(RateKey::GenAcctInterest, Basis::Guaranteed, age, year)?;

        Ok(Self {
            coi: rate(tables.coi_band_key(specamt))?,
            term_coi: rate(RateKey::TermCoi)?,

            gen_acct: interest(RateKey::GenAcctInterest)?,
            sep_acct_gross: interest(RateKey::SepAcctGrossInterest)?,
            m_and_e: interest(RateKey::SepAcctMandE)?,
            asset_comp: 0.0,
            sep_acct_load: 0.0,
            reg_ln_credited: interest(RateKey::RegLoanCredited)?,
            reg_ln_due: interest(RateKey::RegLoanDue)?,
            prf_ln_credited: interest(RateKey::PrfLoanCredited)?,
            prf_ln_due: interest(RateKey::PrfLoanDue)?,
            honeymoon: interest(RateKey::HoneymoonRate)?,

            target_load: rate(RateKey::TargetPremiumLoad)?,
            excess_load: rate(RateKey::ExcessPremiumLoad)?,
            monthly_fee: rate(RateKey::MonthlyPolicyFee)?,
            annual_fee: rate(RateKey::AnnualPolicyFee)?,
            specamt_load: rate(RateKey::SpecAmtLoad)?,
            acct_val_load: rate(RateKey::AcctValLoad)?,

            surrchg_av_mult: rate(RateKey::SurrChgAvMult)?,
            surrchg_prem_mult: rate(RateKey::SurrChgPremMult)?,
            refundable_load: rate(RateKey::RefundableSalesLoad)?,
            cash_value_enhancement: params.cash_value_enhancement[year],

            corridor: rate(RateKey::Corridor)?,
            naar_discount: monthly_discount(guar_gen_acct),

            target_premium_rate: tables.rate(RateKey::TargetPremiumRate, basis, age, 0)?,
            min_premium_rate: tables.rate(RateKey::MinPremiumRate, basis, age, 0)?,
        })
    }

    /// Annual separate-account rate net of asset-based charges
    pub fn sep_acct_net(&self) -> f64 {
        self.sep_acct_gross - self.m_and_e - self.asset_comp
    }

    /// Recompute asset-tiered rates from the assets at the start of the month
    pub fn apply_tiered(&mut self, tables: &RateTables, assets: f64) {
        let product = &tables.product;
        if product.tiered_m_and_e.is_tiered() {
            self.m_and_e = product.tiered_m_and_e.rate_for(assets);
        }
        self.asset_comp = product.tiered_asset_comp.rate_for(assets);
        self.sep_acct_load = product.tiered_sep_acct_load.rate_for(assets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_load_sample_rates() {
        let tables = RateTables::sample_product();
        let params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        let rounding = RoundTo::new(10, crate::currency::RoundingStyle::ToNearest);

        let curr = YearRates::load(&tables, Basis::Current, &params, 0, 100_000.0, &rounding).unwrap();
        let guar = YearRates::load(&tables, Basis::Guaranteed, &params, 0, 100_000.0, &rounding).unwrap();
        assert_relative_eq!(curr.gen_acct, 0.045);
        assert_relative_eq!(guar.gen_acct, 0.03);
        assert!(curr.coi < guar.coi);
        assert_relative_eq!(curr.naar_discount, guar.naar_discount);
        assert_relative_eq!(curr.sep_acct_net(), 0.07 - 0.009, epsilon = 1e-12);
    }

    #[test]
    fn test_tiered_rates_by_assets() {
        let tables = RateTables::sample_product();
        let params = RunParameters::level(45, 55, 100_000.0, 2_000.0);
        let mut r = YearRates::load(&tables, Basis::Current, &params, 0, 100_000.0, &RoundTo::identity()).unwrap();
        r.apply_tiered(&tables, 20_000_000.0);
        assert_relative_eq!(r.m_and_e, 0.007);
        r.apply_tiered(&tables, 100.0);
        assert_relative_eq!(r.m_and_e, 0.009);
        assert_relative_eq!(r.sep_acct_load, 0.001);
    }
}
