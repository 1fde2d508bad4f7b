//! Causal primitives: actors, dots, causal contexts and version vectors.
//!
//! A [`Dot`] names one event: the `n`-th operation issued by an [`Actor`].
//! Sequence numbers start at 1 and grow by one per event, so the set of
//! dots a replica has seen from one actor is usually a contiguous prefix.
//! [`CausalContext`] exploits that: it stores the prefix as a single
//! counter per actor and keeps only the out-of-order dots in a "cloud".

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use ulid::Ulid;

/// Identifier of a replica that originates operations.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh, globally unique actor id.
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Actor {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Actor {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A globally unique event identifier: `(actor, sequence number)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dot {
    pub actor: Actor,
    pub seq: u64,
}

impl Dot {
    pub fn new(actor: impl Into<Actor>, seq: u64) -> Self {
        Self {
            actor: actor.into(),
            seq,
        }
    }

    /// Smallest and largest possible dots of `actor`, for range scans.
    fn bounds(actor: &Actor) -> (Dot, Dot) {
        (
            Dot::new(actor.clone(), 0),
            Dot::new(actor.clone(), u64::MAX),
        )
    }
}

impl fmt::Display for Dot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.actor, self.seq)
    }
}

/// The set of dots a replica has observed.
///
/// Always kept compact: `clock[a] = n` means dots `a:1..=a:n` were all seen,
/// and `cloud` holds only dots that are not covered by the clock. Because the
/// compact form is unique, derived equality is lattice equality.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawContext")]
pub struct CausalContext {
    clock: BTreeMap<Actor, u64>,
    cloud: BTreeSet<Dot>,
}

/// Wire form of a [`CausalContext`], compacted on the way in.
#[derive(Deserialize)]
struct RawContext {
    clock: BTreeMap<Actor, u64>,
    cloud: BTreeSet<Dot>,
}

impl From<RawContext> for CausalContext {
    fn from(raw: RawContext) -> Self {
        let mut context = Self {
            clock: raw.clock.into_iter().filter(|&(_, max)| max > 0).collect(),
            cloud: raw.cloud,
        };
        context.compact();
        context
    }
}

impl CausalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clock.is_empty() && self.cloud.is_empty()
    }

    pub fn contains(&self, dot: &Dot) -> bool {
        self.clock
            .get(&dot.actor)
            .is_some_and(|&max| dot.seq <= max)
            || self.cloud.contains(dot)
    }

    /// Highest sequence number observed from `actor` (0 if none).
    pub fn max_seq(&self, actor: &Actor) -> u64 {
        let (lo, hi) = Dot::bounds(actor);
        let in_clock = self.clock.get(actor).copied().unwrap_or(0);
        let in_cloud = self
            .cloud
            .range(lo..=hi)
            .next_back()
            .map_or(0, |dot| dot.seq);
        in_clock.max(in_cloud)
    }

    /// The next dot `actor` may issue without reusing an observed one.
    pub fn next_dot(&self, actor: &Actor) -> Dot {
        Dot::new(actor.clone(), self.max_seq(actor) + 1)
    }

    pub fn insert(&mut self, dot: Dot) {
        if !self.contains(&dot) {
            self.cloud.insert(dot);
            self.compact();
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.join_assign(other);
        result
    }

    pub fn join_assign(&mut self, other: &Self) {
        for (actor, &max) in &other.clock {
            let entry = self.clock.entry(actor.clone()).or_insert(0);
            *entry = (*entry).max(max);
        }
        self.cloud.extend(other.cloud.iter().cloned());
        self.compact();
    }

    /// Fold cloud dots that extend a contiguous prefix into the clock.
    fn compact(&mut self) {
        let cloud = std::mem::take(&mut self.cloud);
        // BTreeSet order visits each actor's dots in ascending sequence.
        for dot in cloud {
            let max = self.clock.get(&dot.actor).copied().unwrap_or(0);
            if dot.seq == max + 1 {
                self.clock.insert(dot.actor, dot.seq);
            } else if dot.seq > max {
                self.cloud.insert(dot);
            }
        }
    }

    /// Every observed dot: the clock prefixes first, then the cloud.
    pub fn dots(&self) -> impl Iterator<Item = Dot> + '_ {
        let prefix = self
            .clock
            .iter()
            .flat_map(|(actor, &max)| (1..=max).map(move |seq| Dot::new(actor.clone(), seq)));
        prefix.chain(self.cloud.iter().cloned())
    }

    pub fn len(&self) -> usize {
        let prefix: u64 = self.clock.values().sum();
        prefix as usize + self.cloud.len()
    }
}

impl FromIterator<Dot> for CausalContext {
    fn from_iter<I: IntoIterator<Item = Dot>>(iter: I) -> Self {
        let mut context = CausalContext::new();
        context.cloud.extend(iter);
        context.compact();
        context
    }
}

/// Per-actor high-water marks summarising the history behind one write.
///
/// Never stores zero entries, so derived equality is canonical.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawVersionVector")]
pub struct VersionVector {
    entries: BTreeMap<Actor, u64>,
}

#[derive(Deserialize)]
struct RawVersionVector {
    entries: BTreeMap<Actor, u64>,
}

impl From<RawVersionVector> for VersionVector {
    fn from(raw: RawVersionVector) -> Self {
        Self {
            entries: raw.entries.into_iter().filter(|&(_, seq)| seq > 0).collect(),
        }
    }
}

impl VersionVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, actor: &Actor) -> u64 {
        self.entries.get(actor).copied().unwrap_or(0)
    }

    /// True when the history summarised by `self` includes `dot`.
    pub fn observes(&self, dot: &Dot) -> bool {
        dot.seq != 0 && self.get(&dot.actor) >= dot.seq
    }

    pub fn join_assign(&mut self, other: &Self) {
        for (actor, &seq) in &other.entries {
            let entry = self.entries.entry(actor.clone()).or_insert(0);
            *entry = (*entry).max(seq);
        }
    }

    /// Advance `actor`'s entry and return the dot of the new event.
    pub fn increment(&mut self, actor: &Actor) -> Dot {
        let entry = self.entries.entry(actor.clone()).or_insert(0);
        *entry += 1;
        Dot::new(actor.clone(), *entry)
    }

    /// Causal order between two histories; `None` when concurrent.
    pub fn causal_cmp(&self, other: &Self) -> Option<Ordering> {
        let self_le = self.entries.iter().all(|(a, &n)| other.get(a) >= n);
        let other_le = other.entries.iter().all(|(a, &n)| self.get(a) >= n);
        match (self_le, other_le) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Actor, u64)> {
        self.entries.iter().map(|(a, &n)| (a, n))
    }
}
