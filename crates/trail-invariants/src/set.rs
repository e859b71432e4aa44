//! Ordered, duplicate-free invariant collections.

use crate::invariant::BinaryInvariant;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::trace;

/// Insertion-ordered set of invariants.
///
/// Duplicates are detected with invariant equality, so a symmetric invariant
/// and its swapped twin occupy one slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<BinaryInvariant>", into = "Vec<BinaryInvariant>")]
pub struct TemporalInvariantSet {
    ordered: Vec<BinaryInvariant>,
    index: HashSet<BinaryInvariant>,
}

impl TemporalInvariantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when an equal invariant is already present.
    pub fn add(&mut self, inv: BinaryInvariant) -> bool {
        if !self.index.insert(inv.clone()) {
            trace!(invariant = %inv, "duplicate invariant ignored");
            return false;
        }
        self.ordered.push(inv);
        true
    }

    pub fn contains(&self, inv: &BinaryInvariant) -> bool {
        self.index.contains(inv)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BinaryInvariant> {
        self.ordered.iter()
    }

    pub fn as_slice(&self) -> &[BinaryInvariant] {
        &self.ordered
    }

    /// Relations mentioned by at least one invariant.
    pub fn relations(&self) -> BTreeSet<String> {
        self.ordered
            .iter()
            .map(|inv| inv.relation().to_string())
            .collect()
    }
}

impl Extend<BinaryInvariant> for TemporalInvariantSet {
    fn extend<I: IntoIterator<Item = BinaryInvariant>>(&mut self, iter: I) {
        for inv in iter {
            self.add(inv);
        }
    }
}

impl FromIterator<BinaryInvariant> for TemporalInvariantSet {
    fn from_iter<I: IntoIterator<Item = BinaryInvariant>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl From<Vec<BinaryInvariant>> for TemporalInvariantSet {
    fn from(invs: Vec<BinaryInvariant>) -> Self {
        invs.into_iter().collect()
    }
}

impl From<TemporalInvariantSet> for Vec<BinaryInvariant> {
    fn from(set: TemporalInvariantSet) -> Self {
        set.ordered
    }
}

impl<'a> IntoIterator for &'a TemporalInvariantSet {
    type Item = &'a BinaryInvariant;
    type IntoIter = std::slice::Iter<'a, BinaryInvariant>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.iter()
    }
}
