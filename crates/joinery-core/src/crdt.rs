//! The closed set of CRDT kinds behind one value type.
//!
//! [`Crdt`] wraps every variant so callers that pick the kind at runtime
//! (replication layers, test harnesses) can drive the type contract
//! uniformly. Binary operations on two different kinds are rejected with
//! [`CrdtError::VariantMismatch`].

use crate::awset::AWSet;
use crate::causal::Actor;
use crate::decompose::{self, Decompose};
use crate::error::{CrdtError, DecompositionError, Result};
use crate::flag::Flag;
use crate::gcounter::GCounter;
use crate::gset::GSet;
use crate::lattice::Lattice;
use crate::maxint::MaxInt;
use crate::mvreg::MVRegister;
use crate::ops::{Mutate, Operation};
use crate::orset::ORSet;
use crate::pncounter::PNCounter;
use crate::twopset::TwoPSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Tag naming one CRDT kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variant {
    Flag,
    MaxInt,
    GCounter,
    PNCounter,
    GSet,
    TwoPSet,
    AWSet,
    ORSet,
    MVRegister,
}

impl Variant {
    pub const ALL: [Variant; 9] = [
        Variant::Flag,
        Variant::MaxInt,
        Variant::GCounter,
        Variant::PNCounter,
        Variant::GSet,
        Variant::TwoPSet,
        Variant::AWSet,
        Variant::ORSet,
        Variant::MVRegister,
    ];
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variant::Flag => "flag",
            Variant::MaxInt => "max-int",
            Variant::GCounter => "g-counter",
            Variant::PNCounter => "pn-counter",
            Variant::GSet => "g-set",
            Variant::TwoPSet => "2p-set",
            Variant::AWSet => "aw-set",
            Variant::ORSet => "or-set",
            Variant::MVRegister => "mv-register",
        };
        f.write_str(name)
    }
}

/// What a state reads as
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value<T> {
    Bool(bool),
    Natural(u64),
    Integer(i64),
    Set(BTreeSet<T>),
    /// Concurrent register values, in dot order
    Values(Vec<T>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crdt<T: Ord + Clone> {
    Flag(Flag),
    MaxInt(MaxInt),
    GCounter(GCounter),
    PNCounter(PNCounter),
    GSet(GSet<T>),
    TwoPSet(TwoPSet<T>),
    AWSet(AWSet<T>),
    ORSet(ORSet<T>),
    MVRegister(MVRegister<T>),
}

/// Apply the same expression to whichever variant `$value` holds.
macro_rules! each_variant {
    ($value:expr, $state:ident => $body:expr) => {
        match $value {
            Crdt::Flag($state) => $body,
            Crdt::MaxInt($state) => $body,
            Crdt::GCounter($state) => $body,
            Crdt::PNCounter($state) => $body,
            Crdt::GSet($state) => $body,
            Crdt::TwoPSet($state) => $body,
            Crdt::AWSet($state) => $body,
            Crdt::ORSet($state) => $body,
            Crdt::MVRegister($state) => $body,
        }
    };
}

/// Like `each_variant!`, rewrapping the result in the same variant.
macro_rules! map_variant {
    ($value:expr, $state:ident => $body:expr) => {
        match $value {
            Crdt::Flag($state) => Crdt::Flag($body),
            Crdt::MaxInt($state) => Crdt::MaxInt($body),
            Crdt::GCounter($state) => Crdt::GCounter($body),
            Crdt::PNCounter($state) => Crdt::PNCounter($body),
            Crdt::GSet($state) => Crdt::GSet($body),
            Crdt::TwoPSet($state) => Crdt::TwoPSet($body),
            Crdt::AWSet($state) => Crdt::AWSet($body),
            Crdt::ORSet($state) => Crdt::ORSet($body),
            Crdt::MVRegister($state) => Crdt::MVRegister($body),
        }
    };
}

/// Pair up two values of the same variant, or fail with a mismatch.
macro_rules! zip_variant {
    ($left:expr, $right:expr, $a:ident, $b:ident => $body:expr) => {
        match ($left, $right) {
            (Crdt::Flag($a), Crdt::Flag($b)) => Ok(Crdt::Flag($body)),
            (Crdt::MaxInt($a), Crdt::MaxInt($b)) => Ok(Crdt::MaxInt($body)),
            (Crdt::GCounter($a), Crdt::GCounter($b)) => Ok(Crdt::GCounter($body)),
            (Crdt::PNCounter($a), Crdt::PNCounter($b)) => Ok(Crdt::PNCounter($body)),
            (Crdt::GSet($a), Crdt::GSet($b)) => Ok(Crdt::GSet($body)),
            (Crdt::TwoPSet($a), Crdt::TwoPSet($b)) => Ok(Crdt::TwoPSet($body)),
            (Crdt::AWSet($a), Crdt::AWSet($b)) => Ok(Crdt::AWSet($body)),
            (Crdt::ORSet($a), Crdt::ORSet($b)) => Ok(Crdt::ORSet($body)),
            (Crdt::MVRegister($a), Crdt::MVRegister($b)) => Ok(Crdt::MVRegister($body)),
            (left, right) => Err(CrdtError::VariantMismatch {
                expected: left.variant(),
                found: right.variant(),
            }),
        }
    };
}

impl<T: Ord + Clone> Crdt<T> {
    /// Bottom state of the given kind
    pub fn new(variant: Variant) -> Self {
        match variant {
            Variant::Flag => Crdt::Flag(Flag::bottom()),
            Variant::MaxInt => Crdt::MaxInt(MaxInt::bottom()),
            Variant::GCounter => Crdt::GCounter(GCounter::bottom()),
            Variant::PNCounter => Crdt::PNCounter(PNCounter::bottom()),
            Variant::GSet => Crdt::GSet(GSet::bottom()),
            Variant::TwoPSet => Crdt::TwoPSet(TwoPSet::bottom()),
            Variant::AWSet => Crdt::AWSet(AWSet::bottom()),
            Variant::ORSet => Crdt::ORSet(ORSet::bottom()),
            Variant::MVRegister => Crdt::MVRegister(MVRegister::bottom()),
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            Crdt::Flag(_) => Variant::Flag,
            Crdt::MaxInt(_) => Variant::MaxInt,
            Crdt::GCounter(_) => Variant::GCounter,
            Crdt::PNCounter(_) => Variant::PNCounter,
            Crdt::GSet(_) => Variant::GSet,
            Crdt::TwoPSet(_) => Variant::TwoPSet,
            Crdt::AWSet(_) => Variant::AWSet,
            Crdt::ORSet(_) => Variant::ORSet,
            Crdt::MVRegister(_) => Variant::MVRegister,
        }
    }

    pub fn mutate(&self, op: Operation<T>, actor: &Actor) -> Result<Self> {
        Ok(map_variant!(self, state => state.mutate(op, actor)?))
    }

    /// Least upper bound of two states of the same kind
    pub fn merge(&self, other: &Self) -> Result<Self> {
        zip_variant!(self, other, a, b => a.join(b))
    }

    /// Lattice equality; states of different kinds are never equal
    pub fn equal(&self, other: &Self) -> bool {
        self == other
    }

    pub fn is_bottom(&self) -> bool {
        each_variant!(self, state => state.is_bottom())
    }

    /// True iff `self ⊑ other`; false for states of different kinds
    pub fn leq(&self, other: &Self) -> bool {
        self.merge(other).is_ok_and(|joined| joined.equal(other))
    }

    /// True iff `self ⊑ other` and `self ≠ other`
    pub fn is_strict_inflation(&self, other: &Self) -> bool {
        self.leq(other) && !self.equal(other)
    }

    pub fn join_decomposition(&self) -> Vec<Self> {
        fn wrap<L: Decompose, T: Ord + Clone>(state: &L, into: fn(L) -> Crdt<T>) -> Vec<Crdt<T>> {
            state.join_decomposition().into_iter().map(into).collect()
        }

        match self {
            Crdt::Flag(state) => wrap(state, Crdt::Flag),
            Crdt::MaxInt(state) => wrap(state, Crdt::MaxInt),
            Crdt::GCounter(state) => wrap(state, Crdt::GCounter),
            Crdt::PNCounter(state) => wrap(state, Crdt::PNCounter),
            Crdt::GSet(state) => wrap(state, Crdt::GSet),
            Crdt::TwoPSet(state) => wrap(state, Crdt::TwoPSet),
            Crdt::AWSet(state) => wrap(state, Crdt::AWSet),
            Crdt::ORSet(state) => wrap(state, Crdt::ORSet),
            Crdt::MVRegister(state) => wrap(state, Crdt::MVRegister),
        }
    }

    /// Join `fragments` into the bottom state of `variant`
    pub fn merge_all<I>(variant: Variant, fragments: I) -> Result<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        fragments
            .into_iter()
            .try_fold(Self::new(variant), |acc, fragment| acc.merge(&fragment))
    }

    /// The fragments of `self` that `remote` has not seen
    pub fn missing(&self, remote: &Self) -> Result<Vec<Self>> {
        if self.variant() != remote.variant() {
            return Err(CrdtError::VariantMismatch {
                expected: self.variant(),
                found: remote.variant(),
            });
        }
        Ok(self
            .join_decomposition()
            .into_iter()
            .filter(|fragment| !fragment.leq(remote))
            .collect())
    }

    /// The fragments of `self` that `remote` is missing, joined together
    pub fn difference(&self, remote: &Self) -> Result<Self> {
        zip_variant!(self, remote, a, b => decompose::difference(a, b))
    }

    /// Check the decomposition of this state for soundness and minimality
    pub fn verify(&self) -> std::result::Result<(), DecompositionError> {
        each_variant!(self, state => decompose::verify(state))
    }

    pub fn query(&self) -> Value<T> {
        match self {
            Crdt::Flag(flag) => Value::Bool(flag.is_enabled()),
            Crdt::MaxInt(reg) => Value::Natural(reg.value()),
            Crdt::GCounter(counter) => Value::Natural(counter.value()),
            Crdt::PNCounter(counter) => Value::Integer(counter.value()),
            Crdt::GSet(set) => Value::Set(set.iter().cloned().collect()),
            Crdt::TwoPSet(set) => Value::Set(set.iter().cloned().collect()),
            Crdt::AWSet(set) => Value::Set(set.iter().cloned().collect()),
            Crdt::ORSet(set) => Value::Set(set.iter().cloned().collect()),
            Crdt::MVRegister(reg) => Value::Values(reg.read().into_iter().cloned().collect()),
        }
    }
}
