//! Per-life input and the schedules derived from it

mod data;
mod schedules;

pub use data::{DbOption, DefnLifeIns, InforceValues, Mode, RunParameters};
pub use schedules::{Outlay, Schedules};
