//! Account-value projection: monthly transactions, year-end values and
//! the per-life orchestration across bases

mod annual;
mod engine;
mod monthly;
mod rates;
mod state;

pub use annual::{AnnualFinalizer, YearEndValues};
pub use engine::{BasisRun, IllustrationEngine, ProjectionConfig, RunPhase};
pub use monthly::{MonthResult, MonthlyEngine};
pub use rates::YearRates;
pub use state::{PolicyState, RunMode, YearToDate};
