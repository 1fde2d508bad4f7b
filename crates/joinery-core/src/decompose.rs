//! Join-decompositions and the stateless engine built on them.
//!
//! A join-decomposition of a state `x` is a set of irreducible states
//! whose join is `x`, with no element redundant. Shipping only the
//! fragments a peer is missing gives the optimal delta
//! `Δ(a, b) = ⊔ { f ∈ ⇓a | f ⋢ b }`.

use crate::error::DecompositionError;
use crate::lattice::Lattice;
use tracing::{debug, trace};

/// Lattices that can split themselves into irreducible fragments.
pub trait Decompose: Lattice {
    /// The irredundant join-decomposition of `self`.
    ///
    /// Bottom decomposes into the empty vector. The order of fragments is
    /// deterministic but carries no meaning.
    fn join_decomposition(&self) -> Vec<Self>;
}

/// Join every fragment into `init`.
pub fn merge_all<L, I>(init: L, fragments: I) -> L
where
    L: Lattice,
    I: IntoIterator<Item = L>,
{
    fragments.into_iter().fold(init, |mut acc, fragment| {
        acc.join_assign(&fragment);
        acc
    })
}

/// Fragments of `local` that `remote` has not seen.
pub fn missing<L: Decompose>(local: &L, remote: &L) -> Vec<L> {
    let fragments = local.join_decomposition();
    let total = fragments.len();
    let missing: Vec<L> = fragments
        .into_iter()
        .filter(|fragment| !fragment.leq(remote))
        .collect();
    trace!(total, missing = missing.len(), "computed missing fragments");
    missing
}

/// The smallest state `d` with `remote ⊔ d = remote ⊔ local`.
pub fn difference<L: Decompose>(local: &L, remote: &L) -> L {
    merge_all(L::bottom(), missing(local, remote))
}

/// Check that `state.join_decomposition()` is a sound and minimal cover.
pub fn verify<L: Decompose>(state: &L) -> Result<(), DecompositionError> {
    let fragments = state.join_decomposition();

    if let Some(index) = fragments.iter().position(|fragment| fragment.is_bottom()) {
        return Err(DecompositionError::BottomFragment { index });
    }

    let rebuilt = merge_all(L::bottom(), fragments.iter().cloned());
    if &rebuilt != state {
        return Err(DecompositionError::Unsound {
            fragments: fragments.len(),
        });
    }

    for index in 0..fragments.len() {
        let without = fragments
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, fragment)| fragment.clone());
        let partial = merge_all(L::bottom(), without);
        if !partial.is_strict_inflation(state) {
            return Err(DecompositionError::Redundant { index });
        }
    }

    debug!(fragments = fragments.len(), "decomposition verified");
    Ok(())
}
