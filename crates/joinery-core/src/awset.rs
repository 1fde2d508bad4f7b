//! Add-Wins Set (AW-Set) over a single causal context.
//!
//! Each element maps to the dots of the adds that are still present. The
//! causal context records every dot this replica has observed, including the
//! ones that have since been removed. On join a dot survives unless the other
//! side has observed it but no longer holds it, so a remove only ever cancels
//! the adds it has seen and a concurrent add wins.

use crate::causal::{Actor, CausalContext, Dot};
use crate::crdt::Variant;
use crate::decompose::Decompose;
use crate::error::{CrdtError, Result};
use crate::lattice::Lattice;
use crate::ops::{Mutate, Operation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAWSet<T>")]
pub struct AWSet<T: Ord + Clone> {
    /// Present dots per element; never holds an empty dot set
    entries: BTreeMap<T, BTreeSet<Dot>>,
    /// Every dot ever observed
    context: CausalContext,
}

#[derive(Deserialize)]
struct RawAWSet<T: Ord> {
    entries: BTreeMap<T, BTreeSet<Dot>>,
    context: CausalContext,
}

impl<T: Ord + Clone> From<RawAWSet<T>> for AWSet<T> {
    /// Present dots count as observed; empty dot sets and zero dots are dropped.
    fn from(raw: RawAWSet<T>) -> Self {
        let RawAWSet {
            mut entries,
            mut context,
        } = raw;
        for dots in entries.values_mut() {
            dots.retain(|dot| dot.seq > 0);
            for dot in dots.iter() {
                context.insert(dot.clone());
            }
        }
        entries.retain(|_, dots| !dots.is_empty());
        Self { entries, context }
    }
}

impl<T: Ord + Clone> AWSet<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            context: CausalContext::new(),
        }
    }

    /// Add an element under a fresh dot minted for `actor`
    pub fn add(&mut self, actor: &Actor, value: T) -> Dot {
        let dot = self.context.next_dot(actor);
        self.context.insert(dot.clone());
        self.entries.entry(value).or_default().insert(dot.clone());
        dot
    }

    /// Remove every observed occurrence of an element
    pub fn remove(&mut self, value: &T) {
        self.entries.remove(value);
    }

    pub fn contains(&self, value: &T) -> bool {
        self.entries.contains_key(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dots_of(&self, value: &T) -> impl Iterator<Item = &Dot> {
        self.entries.get(value).into_iter().flatten()
    }

    pub fn context(&self) -> &CausalContext {
        &self.context
    }

    fn is_present(&self, dot: &Dot) -> bool {
        self.entries.values().any(|dots| dots.contains(dot))
    }
}

impl<T: Ord + Clone> Default for AWSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Dots of `mine` that survive against a replica holding `theirs` under `their_context`.
fn surviving<'a>(
    mine: &'a BTreeSet<Dot>,
    theirs: Option<&'a BTreeSet<Dot>>,
    their_context: &'a CausalContext,
) -> impl Iterator<Item = &'a Dot> {
    mine.iter().filter(move |dot| {
        theirs.is_some_and(|t| t.contains(*dot)) || !their_context.contains(dot)
    })
}

impl<T: Ord + Clone> Lattice for AWSet<T> {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        let keys: BTreeSet<&T> = self.entries.keys().chain(other.entries.keys()).collect();
        let empty = BTreeSet::new();

        let mut entries = BTreeMap::new();
        for key in keys {
            let mine = self.entries.get(key);
            let theirs = other.entries.get(key);

            let dots: BTreeSet<Dot> =
                surviving(mine.unwrap_or(&empty), theirs, &other.context)
                    .chain(surviving(theirs.unwrap_or(&empty), mine, &self.context))
                    .cloned()
                    .collect();

            if !dots.is_empty() {
                entries.insert(key.clone(), dots);
            }
        }

        Self {
            entries,
            context: self.context.join(&other.context),
        }
    }
}

impl<T: Ord + Clone> Decompose for AWSet<T> {
    /// One fragment per present (element, dot) pair, plus one context-only
    /// fragment per removed dot so the removal keeps travelling.
    fn join_decomposition(&self) -> Vec<Self> {
        let present = self.entries.iter().flat_map(|(value, dots)| {
            dots.iter().map(move |dot| Self {
                entries: BTreeMap::from([(value.clone(), BTreeSet::from([dot.clone()]))]),
                context: CausalContext::from_iter([dot.clone()]),
            })
        });
        let removed = self
            .context
            .dots()
            .filter(|dot| !self.is_present(dot))
            .map(|dot| Self {
                entries: BTreeMap::new(),
                context: CausalContext::from_iter([dot]),
            });
        present.chain(removed).collect()
    }
}

impl<T: Ord + Clone> Mutate<T> for AWSet<T> {
    fn mutate(&self, op: Operation<T>, actor: &Actor) -> Result<Self> {
        let mut next = self.clone();
        match op {
            Operation::Add(value) => {
                next.add(actor, value);
            }
            Operation::Remove(value) => next.remove(&value),
            other => return Err(CrdtError::invalid(other.name(), Variant::AWSet)),
        }
        Ok(next)
    }
}
