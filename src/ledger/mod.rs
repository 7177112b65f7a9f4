//! Illustration ledger: one invariant record plus one variant per basis

mod invariant;
mod variant;

pub use invariant::LedgerInvariant;
pub use variant::LedgerVariant;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::basis::{Basis, LedgerType};
use crate::solve::SolveOutcome;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub ledger_type: LedgerType,
    pub invariant: LedgerInvariant,
    pub variants: BTreeMap<Basis, LedgerVariant>,
    pub solve: Option<SolveOutcome>,
}

impl Ledger {
    pub fn new(ledger_type: LedgerType, issue_age: usize, length: usize) -> Self {
        let variants = ledger_type
            .run_bases()
            .iter()
            .map(|&b| (b, LedgerVariant::new(b, length)))
            .collect();
        Self {
            ledger_type,
            invariant: LedgerInvariant::new(issue_age, length),
            variants,
            solve: None,
        }
    }

    /// Empty ledger to which lives are added with [`Ledger::plus_eq`]
    pub fn composite(ledger_type: LedgerType, length: usize) -> Self {
        let mut ledger = Self::new(ledger_type, 0, length);
        ledger.invariant.inforce_lives = vec![0.0; length + 1];
        for variant in ledger.variants.values_mut() {
            variant.lapse_year = 0;
            variant.lapse_month = 0;
        }
        ledger
    }

    pub fn len(&self) -> usize {
        self.invariant.length
    }

    pub fn is_empty(&self) -> bool {
        0 == self.invariant.length
    }

    pub fn variant(&self, basis: Basis) -> Option<&LedgerVariant> {
        self.variants.get(&basis)
    }

    pub fn current(&self) -> Option<&LedgerVariant> {
        self.variant(Basis::Current)
    }

    /// Add one life to a composite, weighting each year by its inforce lives
    pub fn plus_eq(&mut self, other: &Ledger) {
        let weights = other.invariant.inforce_lives.clone();
        self.invariant.plus_eq(&other.invariant);
        for (basis, variant) in &other.variants {
            if let Some(dst) = self.variants.get_mut(basis) {
                dst.plus_eq(variant, &weights);
            }
        }
    }
}

/// `dst[t] += weights[t] * src[t]`, growing `dst` to the length of `src`
fn add_weighted(dst: &mut Vec<f64>, src: &[f64], weights: &[f64]) {
    if dst.len() < src.len() {
        dst.resize(src.len(), 0.0);
    }
    for ((d, s), w) in dst.iter_mut().zip(src).zip(weights) {
        *d += w * s;
    }
}
