//! UL Account Value - monthly account-value illustration engine for universal life
//!
//! This library provides:
//! - Currency rounding rules and a Brent root finder on a decimal grid
//! - Monthly transaction processing (premiums, charges, withdrawals, loans, interest, lapse)
//! - IRC 7702 guideline premium and 7702A seven-pay tracking
//! - Year-end ledger values for current, guaranteed and midpoint bases
//! - Premium, specified amount, loan and withdrawal solves
//! - Parallel census runs with a lives-weighted composite

pub mod assumptions;
pub mod basis;
pub mod census;
pub mod compliance;
pub mod currency;
pub mod error;
pub mod ledger;
pub mod policy;
pub mod projection;
pub mod solve;

// Re-export commonly used types
pub use assumptions::{ProductFeatures, RateKey, RateTables};
pub use basis::{Basis, LedgerType};
pub use census::{run_census, CensusCell, CensusResult};
pub use error::{IllustrationError, Result};
pub use ledger::{Ledger, LedgerInvariant, LedgerVariant};
pub use policy::{RunParameters, Schedules};
pub use projection::{IllustrationEngine, ProjectionConfig};
pub use solve::{SolveSpec, SolveTarget, SolveType};
