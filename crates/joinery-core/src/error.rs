//! Error types for CRDT mutation, merging and decomposition checks.

use crate::crdt::Variant;
use thiserror::Error;

/// Errors returned by the CRDT type contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrdtError {
    /// The operation is not defined for this kind of CRDT
    /// (for example `decrement` on a G-Counter).
    #[error("Invalid operation: `{operation}` is not supported by {variant}")]
    InvalidOperation {
        operation: &'static str,
        variant: Variant,
    },

    /// Two states of different kinds were combined through [`crate::Crdt`].
    #[error("Variant mismatch: expected {expected}, found {found}")]
    VariantMismatch { expected: Variant, found: Variant },
}

impl CrdtError {
    pub(crate) fn invalid(operation: &'static str, variant: Variant) -> Self {
        CrdtError::InvalidOperation { operation, variant }
    }
}

/// A join-decomposition that fails one of its correctness checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompositionError {
    #[error("Fragment {index} is bottom")]
    BottomFragment { index: usize },

    #[error("Merging all {fragments} fragments does not reproduce the state")]
    Unsound { fragments: usize },

    #[error("Fragment {index} is redundant: the state is rebuilt without it")]
    Redundant { index: usize },
}

pub type Result<T> = std::result::Result<T, CrdtError>;
