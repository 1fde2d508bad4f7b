//! Property-based tests that MUST pass for all CRDT implementations
//!
//! States are produced by replaying random histories: three replicas, each
//! with its own actor, apply valid operations and occasionally merge into each
//! other. Every variant is then checked for:
//!  - the join-semilattice laws (commutativity, associativity, idempotence,
//!    bottom as identity)
//!  - mutations being inflations
//!  - decomposition soundness, order independence and minimality
//!  - irreducibility of fragments of states built by disjoint actors
//!  - the optimal delta reproducing a full merge

use joinery_core::{Actor, Crdt, Operation, Variant};
use proptest::prelude::*;

const REPLICAS: usize = 3;

#[derive(Clone, Debug)]
enum Step {
    Mutate { replica: usize, kind: u8, element: u8 },
    Sync { from: usize, to: usize },
}

/// A valid operation for `variant`, chosen by `kind`
fn operation(variant: Variant, kind: u8, element: u8) -> Operation<u8> {
    let flip = kind % 2 == 0;
    match variant {
        Variant::Flag => Operation::Enable,
        Variant::MaxInt | Variant::GCounter => Operation::Increment,
        Variant::PNCounter if flip => Operation::Increment,
        Variant::PNCounter => Operation::Decrement,
        Variant::GSet => Operation::Add(element),
        Variant::TwoPSet | Variant::AWSet | Variant::ORSet if flip => Operation::Add(element),
        Variant::TwoPSet | Variant::AWSet | Variant::ORSet => Operation::Remove(element),
        Variant::MVRegister => Operation::Set(element),
    }
}

fn actor(prefix: &str, replica: usize) -> Actor {
    Actor::new(format!("{prefix}{replica}"))
}

/// Replay a history; returns every replica's final state.
fn replay(variant: Variant, prefix: &str, history: &[Step]) -> Vec<Crdt<u8>> {
    let mut replicas = vec![Crdt::new(variant); REPLICAS];
    for step in history {
        match *step {
            Step::Mutate {
                replica,
                kind,
                element,
            } => {
                let op = operation(variant, kind, element);
                replicas[replica] = replicas[replica]
                    .mutate(op, &actor(prefix, replica))
                    .expect("operation is valid for the variant");
            }
            Step::Sync { from, to } => {
                replicas[to] = replicas[to]
                    .merge(&replicas[from])
                    .expect("replicas share a variant");
            }
        }
    }
    replicas
}

/// Replay a history and merge every replica into one state.
fn build(variant: Variant, prefix: &str, history: &[Step]) -> Crdt<u8> {
    replay(variant, prefix, history)
        .iter()
        .try_fold(Crdt::new(variant), |acc, replica| acc.merge(replica))
        .expect("replicas share a variant")
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0..REPLICAS, any::<u8>(), 0u8..4).prop_map(|(replica, kind, element)| Step::Mutate {
            replica,
            kind,
            element,
        }),
        1 => (0..REPLICAS, 0..REPLICAS).prop_map(|(from, to)| Step::Sync { from, to }),
    ]
}

fn history_strategy() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(step_strategy(), 0..24)
}

fn variant_strategy() -> impl Strategy<Value = Variant> {
    prop::sample::select(Variant::ALL.to_vec())
}

fn fold(variant: Variant, fragments: impl IntoIterator<Item = Crdt<u8>>) -> Crdt<u8> {
    Crdt::merge_all(variant, fragments).expect("fragments share a variant")
}

// ============================================================================
// Semilattice laws
// ============================================================================

proptest! {
    #[test]
    fn merge_is_commutative(
        variant in variant_strategy(),
        ha in history_strategy(),
        hb in history_strategy()
    ) {
        let a = build(variant, "a", &ha);
        let b = build(variant, "b", &hb);
        prop_assert_eq!(a.merge(&b).unwrap(), b.merge(&a).unwrap());
    }

    #[test]
    fn merge_is_associative(
        variant in variant_strategy(),
        ha in history_strategy(),
        hb in history_strategy(),
        hc in history_strategy()
    ) {
        let a = build(variant, "a", &ha);
        let b = build(variant, "b", &hb);
        let c = build(variant, "c", &hc);

        let left = a.merge(&b).unwrap().merge(&c).unwrap();
        let right = a.merge(&b.merge(&c).unwrap()).unwrap();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn merge_is_idempotent(variant in variant_strategy(), h in history_strategy()) {
        let a = build(variant, "a", &h);
        prop_assert_eq!(a.merge(&a).unwrap(), a);
    }

    #[test]
    fn bottom_is_identity(variant in variant_strategy(), h in history_strategy()) {
        let a = build(variant, "a", &h);
        let bottom = Crdt::new(variant);
        prop_assert_eq!(bottom.merge(&a).unwrap(), a.clone());
        prop_assert_eq!(a.merge(&bottom).unwrap(), a);
    }

    #[test]
    fn replicas_converge_after_exchange(variant in variant_strategy(), h in history_strategy()) {
        let replicas = replay(variant, "a", &h);
        let forward = build(variant, "a", &h);
        let backward = replicas
            .iter()
            .rev()
            .try_fold(Crdt::new(variant), |acc, r| acc.merge(r))
            .unwrap();
        prop_assert_eq!(forward, backward);
    }
}

// ============================================================================
// Mutation
// ============================================================================

proptest! {
    #[test]
    fn mutations_are_inflations(
        variant in variant_strategy(),
        h in history_strategy(),
        kind in any::<u8>(),
        element in 0u8..4
    ) {
        let replicas = replay(variant, "a", &h);
        for (i, state) in replicas.iter().enumerate() {
            let next = state
                .mutate(operation(variant, kind, element), &actor("a", i))
                .unwrap();
            prop_assert!(state.equal(&next) || state.is_strict_inflation(&next));
        }
    }
}

// ============================================================================
// Join-decomposition
// ============================================================================

proptest! {
    #[test]
    fn decomposition_is_sound(variant in variant_strategy(), h in history_strategy()) {
        let state = build(variant, "a", &h);
        let fragments = state.join_decomposition();

        prop_assert!(fragments.iter().all(|f| !f.is_bottom()));
        prop_assert_eq!(fold(variant, fragments.clone()), state.clone());
        prop_assert_eq!(fold(variant, fragments.into_iter().rev()), state);
    }

    #[test]
    fn decomposition_is_minimal(variant in variant_strategy(), h in history_strategy()) {
        let state = build(variant, "a", &h);
        let fragments = state.join_decomposition();

        for skip in 0..fragments.len() {
            let rest = fragments
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, f)| f.clone());
            let partial = fold(variant, rest);
            prop_assert!(
                partial.is_strict_inflation(&state),
                "fragment {} of {:?} is redundant",
                skip,
                state
            );
        }
    }

    #[test]
    fn fragments_are_irreducible(
        variant in variant_strategy(),
        ha in history_strategy(),
        hb in history_strategy()
    ) {
        let a = build(variant, "a", &ha);
        let b = build(variant, "b", &hb);
        let merged = a.merge(&b).unwrap();

        for fragment in merged.join_decomposition() {
            if merged.equal(&fragment) {
                prop_assert!(a.equal(&fragment) || b.equal(&fragment));
            }
        }
    }

    #[test]
    fn difference_completes_remote(
        variant in variant_strategy(),
        ha in history_strategy(),
        hb in history_strategy()
    ) {
        let local = build(variant, "a", &ha);
        let remote = build(variant, "b", &hb).merge(&local).unwrap();
        let diverged = build(variant, "c", &ha);

        for other in [&remote, &diverged] {
            let delta = local.difference(other).unwrap();
            prop_assert_eq!(other.merge(&delta).unwrap(), other.merge(&local).unwrap());
        }
        prop_assert!(local.difference(&remote).unwrap().is_bottom());
    }
}
