//! Two-Phase Set (2P-Set) CRDT
//!
//! Every element walks the chain `absent < added < removed`. Once removed an
//! element never returns, so adding it again is a no-op rather than an error.
//!
//! The canonical form keeps `added` and `removed` disjoint: a removed element
//! is moved out of `added`. Join unions both sides and then drops from `added`
//! whatever ended up in `removed`.

use crate::causal::Actor;
use crate::crdt::Variant;
use crate::decompose::Decompose;
use crate::error::{CrdtError, Result};
use crate::lattice::Lattice;
use crate::ops::{Mutate, Operation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::trace;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTwoPSet<T>")]
pub struct TwoPSet<T: Ord + Clone> {
    /// Elements added and not yet removed
    added: BTreeSet<T>,
    /// Tombstones: elements excluded forever
    removed: BTreeSet<T>,
}

#[derive(Deserialize)]
struct RawTwoPSet<T: Ord> {
    added: BTreeSet<T>,
    removed: BTreeSet<T>,
}

impl<T: Ord + Clone> From<RawTwoPSet<T>> for TwoPSet<T> {
    fn from(raw: RawTwoPSet<T>) -> Self {
        let RawTwoPSet { mut added, removed } = raw;
        added.retain(|e| !removed.contains(e));
        Self { added, removed }
    }
}

impl<T: Ord + Clone> TwoPSet<T> {
    pub fn new() -> Self {
        Self {
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }

    /// Add an element. Returns false when the element is tombstoned.
    pub fn insert(&mut self, value: T) -> bool {
        if self.removed.contains(&value) {
            trace!("add after remove on a two-phase set is a no-op");
            return false;
        }
        self.added.insert(value);
        true
    }

    /// Tombstone an element. Only an element currently added can be removed.
    pub fn remove(&mut self, value: &T) -> bool {
        if self.added.remove(value) {
            self.removed.insert(value.clone());
            true
        } else {
            false
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.added.contains(value)
    }

    pub fn is_tombstoned(&self, value: &T) -> bool {
        self.removed.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.added.iter()
    }

    pub fn tombstones(&self) -> impl Iterator<Item = &T> {
        self.removed.iter()
    }

    pub fn len(&self) -> usize {
        self.added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

impl<T: Ord + Clone> Default for TwoPSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Lattice for TwoPSet<T> {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        let removed: BTreeSet<T> = self.removed.union(&other.removed).cloned().collect();
        let added = self
            .added
            .union(&other.added)
            .filter(|e| !removed.contains(*e))
            .cloned()
            .collect();
        Self { added, removed }
    }
}

impl<T: Ord + Clone> Decompose for TwoPSet<T> {
    /// One "add" fragment per live element and one "remove" fragment per
    /// tombstone.
    fn join_decomposition(&self) -> Vec<Self> {
        let adds = self.added.iter().map(|e| Self {
            added: BTreeSet::from([e.clone()]),
            removed: BTreeSet::new(),
        });
        let removes = self.removed.iter().map(|e| Self {
            added: BTreeSet::new(),
            removed: BTreeSet::from([e.clone()]),
        });
        adds.chain(removes).collect()
    }
}

impl<T: Ord + Clone> Mutate<T> for TwoPSet<T> {
    fn mutate(&self, op: Operation<T>, _actor: &Actor) -> Result<Self> {
        let mut next = self.clone();
        match op {
            Operation::Add(value) => {
                next.insert(value);
            }
            Operation::Remove(value) => {
                next.remove(&value);
            }
            other => return Err(CrdtError::invalid(other.name(), Variant::TwoPSet)),
        }
        Ok(next)
    }
}
