// File: `crates/joinery-core/src/lib.rs`
//! State-based CRDTs whose states form join-semilattices, each able to split
//! itself into irreducible fragments (its join-decomposition).
//!
//! ```
//! use joinery_core::{Actor, Crdt, Operation, Variant};
//!
//! let a = Actor::from("a");
//! let b = Actor::from("b");
//!
//! let left = Crdt::<u32>::new(Variant::GCounter)
//!     .mutate(Operation::Increment, &a)?
//!     .mutate(Operation::Increment, &a)?;
//! let right = Crdt::new(Variant::GCounter).mutate(Operation::Increment, &b)?;
//!
//! let merged = left.merge(&right)?;
//! let fragments = merged.join_decomposition();
//! assert_eq!(fragments.len(), 2);
//! assert_eq!(Crdt::merge_all(Variant::GCounter, fragments)?, merged);
//! # Ok::<(), joinery_core::CrdtError>(())
//! ```

pub mod awset;
pub mod causal;
pub mod crdt;
pub mod decompose;
pub mod error;
pub mod flag;
pub mod gcounter;
pub mod gset;
pub mod lattice;
pub mod maxint;
pub mod mvreg;
pub mod ops;
pub mod orset;
pub mod pncounter;
pub mod twopset;

pub use awset::AWSet;
pub use causal::{Actor, CausalContext, Dot, VersionVector};
pub use crdt::{Crdt, Value, Variant};
pub use decompose::{difference, merge_all, missing, verify, Decompose};
pub use error::{CrdtError, DecompositionError, Result};
pub use flag::Flag;
pub use gcounter::GCounter;
pub use gset::GSet;
pub use lattice::Lattice;
pub use maxint::MaxInt;
pub use mvreg::MVRegister;
pub use ops::{Mutate, Operation};
pub use orset::ORSet;
pub use pncounter::PNCounter;
pub use twopset::TwoPSet;
