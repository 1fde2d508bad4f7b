//! Multi-Value Register CRDT
//!
//! The Multi-Value Register (MV-Register) maintains a set of concurrent values
//! instead of choosing a single winner. Each value is tagged with the dot of
//! the write that produced it and the version vector of everything that write
//! had observed.
//!
//! A write observes every entry in the local state, so it replaces them all.
//! Join keeps the union of both sides minus every entry whose dot is observed
//! by another entry's version vector, leaving an antichain of concurrent writes.

use crate::causal::{Actor, Dot, VersionVector};
use crate::crdt::Variant;
use crate::decompose::Decompose;
use crate::error::{CrdtError, Result};
use crate::lattice::Lattice;
use crate::ops::{Mutate, Operation};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A value together with the causal history of the write that produced it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub clock: VersionVector,
    pub value: T,
}

/// A Multi-Value Register CRDT
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MVRegister<T: Ord + Clone> {
    /// Current values, keyed by the dot of their write
    values: BTreeMap<Dot, Versioned<T>>,
}

// Custom serialization: serialize as Vec<(Dot, Versioned<T>)> for JSON compatibility
impl<T: Ord + Clone + Serialize> Serialize for MVRegister<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries: Vec<(&Dot, &Versioned<T>)> = self.values.iter().collect();
        entries.serialize(serializer)
    }
}

impl<'de, T: Ord + Clone + Deserialize<'de>> Deserialize<'de> for MVRegister<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries: Vec<(Dot, Versioned<T>)> = Vec::deserialize(deserializer)?;
        Ok(Self {
            values: undominated(entries.into_iter().collect()),
        })
    }
}

/// Drop every entry whose dot another entry's clock observes
fn undominated<T: Clone>(values: BTreeMap<Dot, Versioned<T>>) -> BTreeMap<Dot, Versioned<T>> {
    values
        .iter()
        .filter(|(dot, _)| {
            !values
                .iter()
                .any(|(other_dot, v)| other_dot != *dot && v.clock.observes(dot))
        })
        .map(|(dot, v)| (dot.clone(), v.clone()))
        .collect()
}

impl<T: Ord + Clone> MVRegister<T> {
    /// Create a new empty Multi-Value Register
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Write a new value, superseding every value currently held
    pub fn write(&mut self, actor: &Actor, value: T) -> Dot {
        let mut clock = self.clock();
        let dot = clock.increment(actor);
        self.values.clear();
        self.values.insert(dot.clone(), Versioned { clock, value });
        dot
    }

    /// Get all current values
    pub fn read(&self) -> Vec<&T> {
        self.values.values().map(|v| &v.value).collect()
    }

    /// Get all current values with their dots
    pub fn read_with_dots(&self) -> Vec<(&Dot, &T)> {
        self.values.iter().map(|(d, v)| (d, &v.value)).collect()
    }

    /// Join of the version vectors of all current values
    pub fn clock(&self) -> VersionVector {
        let mut clock = VersionVector::new();
        for versioned in self.values.values() {
            clock.join_assign(&versioned.clock);
        }
        clock
    }

    /// Check if register is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the number of concurrent values
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl<T: Ord + Clone> Default for MVRegister<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Lattice for MVRegister<T> {
    fn bottom() -> Self {
        Self::new()
    }

    /// Union of both registers without the entries some other entry dominates
    fn join(&self, other: &Self) -> Self {
        let mut union = self.values.clone();
        for (dot, versioned) in &other.values {
            union
                .entry(dot.clone())
                .or_insert_with(|| versioned.clone());
        }

        Self {
            values: undominated(union),
        }
    }
}

impl<T: Ord + Clone> Decompose for MVRegister<T> {
    /// One fragment per surviving write
    fn join_decomposition(&self) -> Vec<Self> {
        self.values
            .iter()
            .map(|(dot, versioned)| Self {
                values: BTreeMap::from([(dot.clone(), versioned.clone())]),
            })
            .collect()
    }
}

impl<T: Ord + Clone> Mutate<T> for MVRegister<T> {
    fn mutate(&self, op: Operation<T>, actor: &Actor) -> Result<Self> {
        match op {
            Operation::Set(value) => {
                let mut next = self.clone();
                next.write(actor, value);
                Ok(next)
            }
            other => Err(CrdtError::invalid(other.name(), Variant::MVRegister)),
        }
    }
}
