//! Operations accepted by `mutate`, and the trait that applies them.

use crate::causal::Actor;
use crate::error::Result;
use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};

/// A mutation request. Each CRDT accepts only a subset of these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation<T> {
    /// Raise a flag to `true`.
    Enable,
    Increment,
    Decrement,
    Add(T),
    Remove(T),
    /// Write a register value.
    Set(T),
}

impl<T> Operation<T> {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Enable => "enable",
            Operation::Increment => "increment",
            Operation::Decrement => "decrement",
            Operation::Add(_) => "add",
            Operation::Remove(_) => "rmv",
            Operation::Set(_) => "set",
        }
    }
}

/// Value-style mutation: the input state is left untouched.
///
/// On success the returned state is an inflation of `self` (possibly equal
/// when the operation is redundant, such as re-adding a removed element of
/// a two-phase set). Operations the type does not support are rejected with
/// [`crate::CrdtError::InvalidOperation`].
pub trait Mutate<T>: Lattice {
    fn mutate(&self, op: Operation<T>, actor: &Actor) -> Result<Self>;
}
