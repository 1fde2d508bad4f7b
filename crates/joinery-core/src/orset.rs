//!  Observed-Remove Set (OR-Set)
//!
//! Each add generates a unique dot.  Remove only removes currently observed dots.
//!  Concurrent add and remove of the same element:  add wins.
//!
//! Unlike [`crate::AWSet`] there is no global causal context: every element
//! keeps its own add dots (tags) and the subset of them observed by a remove
//! (tombstones). Both only grow, so join is a plain union and each dot moves
//! along the chain `unseen < added < removed`.

use crate::causal::{Actor, Dot};
use crate::crdt::Variant;
use crate::decompose::Decompose;
use crate::error::{CrdtError, Result};
use crate::lattice::Lattice;
use crate::ops::{Mutate, Operation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Causal bookkeeping for one element
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrences {
    /// Dots of every add observed for this element
    tags: BTreeSet<Dot>,
    /// Tags that a remove has observed; always a subset of `tags`
    tombstones: BTreeSet<Dot>,
}

impl Occurrences {
    fn is_live(&self) -> bool {
        self.tags.len() > self.tombstones.len()
    }

    fn live(&self) -> impl Iterator<Item = &Dot> {
        self.tags.difference(&self.tombstones)
    }

    fn union(&self, other: &Self) -> Self {
        Self {
            tags: self.tags.union(&other.tags).cloned().collect(),
            tombstones: self.tombstones.union(&other.tombstones).cloned().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawORSet<T>")]
pub struct ORSet<T: Ord + Clone> {
    entries: BTreeMap<T, Occurrences>,
}

#[derive(Deserialize)]
struct RawORSet<T: Ord> {
    entries: BTreeMap<T, Occurrences>,
}

impl<T: Ord + Clone> From<RawORSet<T>> for ORSet<T> {
    /// Tombstones outside `tags` are dropped, as are elements with no tags.
    fn from(raw: RawORSet<T>) -> Self {
        let entries = raw
            .entries
            .into_iter()
            .filter_map(|(value, mut occ)| {
                let tags = &occ.tags;
                occ.tombstones.retain(|dot| tags.contains(dot));
                (!occ.tags.is_empty()).then_some((value, occ))
            })
            .collect();
        Self { entries }
    }
}

impl<T: Ord + Clone> ORSet<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add an element with a new unique dot
    pub fn add(&mut self, actor: &Actor, value: T) -> Dot {
        let dot = Dot::new(actor.clone(), self.max_seq(actor) + 1);
        self.entries
            .entry(value)
            .or_default()
            .tags
            .insert(dot.clone());
        dot
    }

    /// Tombstone all observed instances of an element
    pub fn remove(&mut self, value: &T) {
        if let Some(occurrences) = self.entries.get_mut(value) {
            let tags = occurrences.tags.clone();
            occurrences.tombstones.extend(tags);
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.entries.get(value).is_some_and(Occurrences::is_live)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries
            .iter()
            .filter(|(_, occ)| occ.is_live())
            .map(|(value, _)| value)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Tags of `value` that no remove has observed yet
    pub fn live_dots(&self, value: &T) -> impl Iterator<Item = &Dot> {
        self.entries.get(value).into_iter().flat_map(|occ| occ.live())
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Highest sequence number `actor` has used in any tag
    fn max_seq(&self, actor: &Actor) -> u64 {
        self.entries
            .values()
            .flat_map(|occ| occ.tags.iter())
            .filter(|dot| &dot.actor == actor)
            .map(|dot| dot.seq)
            .max()
            .unwrap_or(0)
    }
}

impl<T: Ord + Clone> Default for ORSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Lattice for ORSet<T> {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (value, occ) in &other.entries {
            entries
                .entry(value.clone())
                .and_modify(|mine| *mine = mine.union(occ))
                .or_insert_with(|| occ.clone());
        }
        Self { entries }
    }
}

impl<T: Ord + Clone> Decompose for ORSet<T> {
    /// One fragment per dot: a live tag, or a tag together with its tombstone.
    fn join_decomposition(&self) -> Vec<Self> {
        let mut fragments = Vec::new();
        for (value, occ) in &self.entries {
            for dot in &occ.tags {
                let mut single = Occurrences::default();
                single.tags.insert(dot.clone());
                if occ.tombstones.contains(dot) {
                    single.tombstones.insert(dot.clone());
                }
                fragments.push(Self {
                    entries: BTreeMap::from([(value.clone(), single)]),
                });
            }
        }
        fragments
    }
}

impl<T: Ord + Clone> Mutate<T> for ORSet<T> {
    fn mutate(&self, op: Operation<T>, actor: &Actor) -> Result<Self> {
        let mut next = self.clone();
        match op {
            Operation::Add(value) => {
                next.add(actor, value);
            }
            Operation::Remove(value) => next.remove(&value),
            other => return Err(CrdtError::invalid(other.name(), Variant::ORSet)),
        }
        Ok(next)
    }
}
