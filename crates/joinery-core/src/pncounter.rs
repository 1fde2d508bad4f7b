//! PN-Counter (Positive-Negative Counter) CRDT
//!
//! A PN-Counter supports both increment and decrement operations by maintaining
//! two separate counters: one for increments (P) and one for decrements (N).
//! The value is P - N.
//!
//! Each replica has its own counter entry, and the join operation performs
//! component-wise max across all replicas.

use crate::causal::Actor;
use crate::crdt::Variant;
use crate::decompose::Decompose;
use crate::error::{CrdtError, Result};
use crate::lattice::Lattice;
use crate::ops::{Mutate, Operation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A Positive-Negative Counter CRDT
///
/// Supports both increment and decrement by maintaining two separate counters.
/// Value = sum(increments) - sum(decrements)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPNCounter")]
pub struct PNCounter {
    /// Per-replica increment counters
    increments: BTreeMap<Actor, u64>,
    /// Per-replica decrement counters
    decrements: BTreeMap<Actor, u64>,
}

#[derive(Deserialize)]
struct RawPNCounter {
    increments: BTreeMap<Actor, u64>,
    decrements: BTreeMap<Actor, u64>,
}

impl From<RawPNCounter> for PNCounter {
    fn from(raw: RawPNCounter) -> Self {
        fn nonzero(map: BTreeMap<Actor, u64>) -> BTreeMap<Actor, u64> {
            map.into_iter().filter(|&(_, n)| n > 0).collect()
        }
        Self {
            increments: nonzero(raw.increments),
            decrements: nonzero(raw.decrements),
        }
    }
}

fn bump(map: &mut BTreeMap<Actor, u64>, actor: &Actor, amount: u64) {
    if amount == 0 {
        return;
    }
    let entry = map.entry(actor.clone()).or_insert(0);
    *entry = entry.saturating_add(amount);
}

fn max_merge(into: &mut BTreeMap<Actor, u64>, from: &BTreeMap<Actor, u64>) {
    for (k, v) in from {
        into.entry(k.clone())
            .and_modify(|e| *e = (*e).max(*v))
            .or_insert(*v);
    }
}

impl PNCounter {
    /// Create a new PN-Counter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, actor: &Actor, amount: u64) {
        bump(&mut self.increments, actor, amount);
    }

    pub fn decrement(&mut self, actor: &Actor, amount: u64) {
        bump(&mut self.decrements, actor, amount);
    }

    /// Get the current value (sum of increments - sum of decrements)
    pub fn value(&self) -> i64 {
        let inc_sum: u64 = self.increments.values().sum();
        let dec_sum: u64 = self.decrements.values().sum();
        (inc_sum as i64).saturating_sub(dec_sum as i64)
    }

    /// Get the increment counter for a replica
    pub fn get_increment(&self, actor: &Actor) -> u64 {
        self.increments.get(actor).copied().unwrap_or(0)
    }

    /// Get the decrement counter for a replica
    pub fn get_decrement(&self, actor: &Actor) -> u64 {
        self.decrements.get(actor).copied().unwrap_or(0)
    }

    /// Every actor with a non-zero contribution
    pub fn actors(&self) -> BTreeSet<&Actor> {
        self.increments
            .keys()
            .chain(self.decrements.keys())
            .collect()
    }
}

impl Lattice for PNCounter {
    fn bottom() -> Self {
        Self::new()
    }

    /// Join operation performs component-wise max on both counters
    fn join(&self, other: &Self) -> Self {
        let mut increments = self.increments.clone();
        let mut decrements = self.decrements.clone();
        max_merge(&mut increments, &other.increments);
        max_merge(&mut decrements, &other.decrements);
        Self {
            increments,
            decrements,
        }
    }
}

impl Decompose for PNCounter {
    /// One fragment per actor, carrying both of its fields.
    fn join_decomposition(&self) -> Vec<Self> {
        self.actors()
            .into_iter()
            .map(|actor| {
                let mut fragment = Self::new();
                fragment.increment(actor, self.get_increment(actor));
                fragment.decrement(actor, self.get_decrement(actor));
                fragment
            })
            .collect()
    }
}

impl<T> Mutate<T> for PNCounter {
    fn mutate(&self, op: Operation<T>, actor: &Actor) -> Result<Self> {
        let mut next = self.clone();
        match op {
            Operation::Increment => next.increment(actor, 1),
            Operation::Decrement => next.decrement(actor, 1),
            other => return Err(CrdtError::invalid(other.name(), Variant::PNCounter)),
        }
        Ok(next)
    }
}
