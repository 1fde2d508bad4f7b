//! G-Counter (grow-only counter) CRDT
//!
//! Each actor owns one entry; the value is the sum of all entries and join is
//! the per-actor max. Since join keeps the maximum, the intermediate values of
//! one actor's entry are redundant, so the decomposition holds exactly one
//! fragment per actor.

use crate::causal::Actor;
use crate::crdt::Variant;
use crate::decompose::Decompose;
use crate::error::{CrdtError, Result};
use crate::lattice::Lattice;
use crate::ops::{Mutate, Operation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A grow-only counter. Zero entries are never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawGCounter")]
pub struct GCounter {
    counts: BTreeMap<Actor, u64>,
}

#[derive(Deserialize)]
struct RawGCounter {
    counts: BTreeMap<Actor, u64>,
}

impl From<RawGCounter> for GCounter {
    fn from(raw: RawGCounter) -> Self {
        Self {
            counts: raw.counts.into_iter().filter(|&(_, n)| n > 0).collect(),
        }
    }
}

impl GCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment `actor`'s entry by 1
    pub fn increment(&mut self, actor: &Actor) {
        self.increment_by(actor, 1);
    }

    /// Increment `actor`'s entry by `amount`
    pub fn increment_by(&mut self, actor: &Actor, amount: u64) {
        if amount == 0 {
            return;
        }
        let entry = self.counts.entry(actor.clone()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Sum over all actors
    pub fn value(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn count_for(&self, actor: &Actor) -> u64 {
        self.counts.get(actor).copied().unwrap_or(0)
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.counts.keys()
    }
}

impl Lattice for GCounter {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        let mut counts = self.counts.clone();
        for (actor, &count) in &other.counts {
            counts
                .entry(actor.clone())
                .and_modify(|e| *e = (*e).max(count))
                .or_insert(count);
        }
        Self { counts }
    }
}

impl Decompose for GCounter {
    fn join_decomposition(&self) -> Vec<Self> {
        self.counts
            .iter()
            .map(|(actor, &count)| {
                let mut counts = BTreeMap::new();
                counts.insert(actor.clone(), count);
                Self { counts }
            })
            .collect()
    }
}

impl<T> Mutate<T> for GCounter {
    fn mutate(&self, op: Operation<T>, actor: &Actor) -> Result<Self> {
        match op {
            Operation::Increment => {
                let mut next = self.clone();
                next.increment(actor);
                Ok(next)
            }
            other => Err(CrdtError::invalid(other.name(), Variant::GCounter)),
        }
    }
}
