//! Max-Int register: a single natural number joined by `max`.
//!
//! The value is actor-agnostic; whoever increments, the larger value wins.

use crate::causal::Actor;
use crate::crdt::Variant;
use crate::decompose::Decompose;
use crate::error::{CrdtError, Result};
use crate::lattice::Lattice;
use crate::ops::{Mutate, Operation};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxInt {
    value: u64,
}

impl MaxInt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self) {
        self.value = self.value.max(self.value.saturating_add(1));
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

impl Lattice for MaxInt {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            value: self.value.max(other.value),
        }
    }
}

impl Decompose for MaxInt {
    /// A chain has no intermediate joins: the state is its own decomposition.
    fn join_decomposition(&self) -> Vec<Self> {
        if self.value == 0 {
            Vec::new()
        } else {
            vec![*self]
        }
    }
}

impl<T> Mutate<T> for MaxInt {
    fn mutate(&self, op: Operation<T>, _actor: &Actor) -> Result<Self> {
        match op {
            Operation::Increment => {
                let mut next = *self;
                next.increment();
                Ok(next)
            }
            other => Err(CrdtError::invalid(other.name(), Variant::MaxInt)),
        }
    }
}
