//! Currency rounding and near-equality utilities

mod equality;
mod round;

pub use equality::{material_difference, materially_equal, materially_equal_within, MATERIAL_TOLERANCE};
pub use round::{RoundTo, RoundingRules, RoundingStyle};
