//! Error types for illustration runs
//!
//! Every variant here is fatal: the run that raised it produces no ledger.
//! Root-finder non-convergence is not an error; see [`crate::solve::RootResult`].

use thiserror::Error;

use crate::basis::{Basis, LedgerType};

pub type Result<T> = std::result::Result<T, IllustrationError>;

#[derive(Debug, Error)]
pub enum IllustrationError {
    #[error(
        "Counter mismatch: expected year {expected_year} month {expected_month}, \
         state has year {year} month {month} (months since issue {months_since_issue})"
    )]
    CounterMismatch {
        expected_year: usize,
        expected_month: usize,
        year: usize,
        month: usize,
        months_since_issue: usize,
    },

    #[error("Day count out of range: {days_in_year} days in policy year, {days_in_month} days in policy month")]
    DayCountOutOfRange { days_in_year: i64, days_in_month: i64 },

    #[error("Size mismatch: {what} has length {actual}, expected {expected}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Impossible negative value: {what} = {value}")]
    NegativeValue { what: &'static str, value: f64 },

    #[error("Payment split mismatch in year {year} month {month}: gross {gross} != ee {ee} + er {er}")]
    PaymentSplitMismatch {
        year: usize,
        month: usize,
        gross: f64,
        ee: f64,
        er: f64,
    },

    #[error("Basis {basis:?} is not defined for ledger type {ledger_type:?}")]
    IllegalBasis { basis: Basis, ledger_type: LedgerType },

    #[error("Disallowed allocation: {0}")]
    DisallowedAllocation(String),

    #[error("Missing rate table: {0}")]
    MissingRate(String),

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IllustrationError {
    pub fn invalid_input<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        IllustrationError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
