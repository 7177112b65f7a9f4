//! Conversions between annual-effective and periodic interest rates

/// Monthly effective rate equivalent to an annual effective rate
pub fn monthly_from_annual(annual: f64) -> f64 {
    (annual.ln_1p() / 12.0).exp_m1()
}

/// Effective rate for a period of `days_in_period` out of `days_in_year`
pub fn period_from_annual(annual: f64, days_in_period: i64, days_in_year: i64) -> f64 {
    (annual.ln_1p() * days_in_period as f64 / days_in_year as f64).exp_m1()
}

/// Annual effective rate equivalent to a monthly effective rate
pub fn annual_from_monthly(monthly: f64) -> f64 {
    (12.0 * monthly.ln_1p()).exp_m1()
}

/// One-month discount factor at an annual effective rate
pub fn monthly_discount(annual: f64) -> f64 {
    1.0 / (1.0 + monthly_from_annual(annual))
}
