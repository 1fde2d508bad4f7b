//! Enable-only boolean flag: `false` < `true`, join is logical OR.

use crate::causal::Actor;
use crate::crdt::Variant;
use crate::decompose::Decompose;
use crate::error::{CrdtError, Result};
use crate::lattice::Lattice;
use crate::ops::{Mutate, Operation};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    enabled: bool,
}

impl Flag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Lattice for Flag {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            enabled: self.enabled || other.enabled,
        }
    }
}

impl Decompose for Flag {
    fn join_decomposition(&self) -> Vec<Self> {
        if self.enabled {
            vec![*self]
        } else {
            Vec::new()
        }
    }
}

impl<T> Mutate<T> for Flag {
    fn mutate(&self, op: Operation<T>, _actor: &Actor) -> Result<Self> {
        match op {
            Operation::Enable => {
                let mut next = *self;
                next.enable();
                Ok(next)
            }
            other => Err(CrdtError::invalid(other.name(), Variant::Flag)),
        }
    }
}
