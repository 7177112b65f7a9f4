//! Census runs: one illustration per cell, in parallel, plus a composite
//!
//! Each cell is an independent life. Cells share the rate tables and the
//! configuration; the composite weights every cell's yearly values by its
//! lives in force.

use std::time::Instant;

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assumptions::RateTables;
use crate::basis::LedgerType;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::policy::RunParameters;
use crate::projection::{IllustrationEngine, ProjectionConfig};
use crate::solve::SolveSpec;

/// One input life, with an optional solve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CensusCell {
    pub params: RunParameters,
    pub solve: Option<SolveSpec>,
}

impl From<RunParameters> for CensusCell {
    fn from(params: RunParameters) -> Self {
        Self { params, solve: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CensusResult {
    /// Ledgers in census order
    pub cells: Vec<Ledger>,
    pub composite: Ledger,
}

/// Illustrate every cell and sum the results into a composite
///
/// Any cell's error stops the run.
pub fn run_census(
    cells: &[CensusCell],
    tables: &RateTables,
    config: &ProjectionConfig,
    ledger_type: LedgerType,
) -> Result<CensusResult> {
    let start = Instant::now();
    let ledgers: Vec<Ledger> = cells
        .par_iter()
        .map(|cell| {
            let engine = IllustrationEngine::new(cell.params.clone(), tables, config.clone(), ledger_type)?;
            engine.run(cell.solve.as_ref())
        })
        .collect::<Result<_>>()?;
    info!("illustrated {} cells in {:?}", ledgers.len(), start.elapsed());

    let length = ledgers.iter().map(Ledger::len).max().unwrap_or(0);
    let mut composite = Ledger::composite(ledger_type, length);
    for ledger in &ledgers {
        composite.plus_eq(ledger);
    }

    Ok(CensusResult {
        cells: ledgers,
        composite,
    })
}
