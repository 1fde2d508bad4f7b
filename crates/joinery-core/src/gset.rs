//! Grow-only Set - elements can only be added, never removed
//!  This is the simplest useful CRDT and a good starting point.

use crate::causal::Actor;
use crate::crdt::Variant;
use crate::decompose::Decompose;
use crate::error::{CrdtError, Result};
use crate::lattice::Lattice;
use crate::ops::{Mutate, Operation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GSet<T: Ord + Clone> {
    elements: BTreeSet<T>,
}

impl<T: Ord + Clone> GSet<T> {
    pub fn new() -> Self {
        Self {
            elements: BTreeSet::new(),
        }
    }

    /// Add an element (the only mutation allowed)
    pub fn insert(&mut self, value: T) {
        self.elements.insert(value);
    }

    pub fn contains(&self, value: &T) -> bool {
        self.elements.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T: Ord + Clone> Default for GSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Lattice for GSet<T> {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            elements: self.elements.union(&other.elements).cloned().collect(),
        }
    }
}

impl<T: Ord + Clone> Decompose for GSet<T> {
    /// One singleton set per element
    fn join_decomposition(&self) -> Vec<Self> {
        self.elements
            .iter()
            .map(|e| Self {
                elements: BTreeSet::from([e.clone()]),
            })
            .collect()
    }
}

impl<T: Ord + Clone> Mutate<T> for GSet<T> {
    fn mutate(&self, op: Operation<T>, _actor: &Actor) -> Result<Self> {
        match op {
            Operation::Add(value) => {
                let mut next = self.clone();
                next.insert(value);
                Ok(next)
            }
            other => Err(CrdtError::invalid(other.name(), Variant::GSet)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_gset_remove_is_invalid() {
        let set = GSet::<i32>::new().mutate(Operation::Add(1), &"a".into()).unwrap();
        assert!(set.contains(&1));
        assert!(set.mutate(Operation::Remove(1), &"a".into()).is_err());
    }

    // Property-based tests for lattice laws
    proptest! {
        #[test]
        fn gset_join_is_commutative(
            a in prop::collection::btree_set(0i32..100, 0..20),
            b in prop::collection::btree_set(0i32..100, 0..20)
        ) {
            let set_a = GSet { elements: a };
            let set_b = GSet { elements: b };

            prop_assert_eq!(set_a.join(&set_b), set_b.join(&set_a));
        }

        #[test]
        fn gset_join_is_associative(
            a in prop::collection::btree_set(0i32..100, 0..10),
            b in prop::collection::btree_set(0i32..100, 0..10),
            c in prop::collection::btree_set(0i32..100, 0..10)
        ) {
            let set_a = GSet { elements: a };
            let set_b = GSet { elements: b };
            let set_c = GSet { elements: c };

            let left = set_a.join(&set_b).join(&set_c);
            let right = set_a.join(&set_b.join(&set_c));

            prop_assert_eq!(left, right);
        }

        #[test]
        fn gset_decomposition_has_one_fragment_per_element(
            a in prop::collection::btree_set(0i32..100, 0..20)
        ) {
            let set = GSet { elements: a };
            let fragments = set.join_decomposition();

            prop_assert_eq!(fragments.len(), set.len());
            prop_assert!(fragments.iter().all(|f| f.len() == 1));
        }
    }
}
