//! Read-only graph abstraction shared by both model checkers.

use crate::event::EventType;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

/// Sorted, duplicate-free set of relation labels on one transition.
pub type RelationSet = SmallVec<[String; 2]>;

/// A directed, relation-labeled edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<N> {
    pub source: N,
    pub target: N,
    relations: RelationSet,
}

impl<N: Copy> Transition<N> {
    pub fn new(source: N, target: N, relations: impl IntoIterator<Item = String>) -> Self {
        let mut relations: RelationSet = relations.into_iter().collect();
        relations.sort_unstable();
        relations.dedup();
        Self {
            source,
            target,
            relations,
        }
    }

    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    #[inline]
    pub fn has_relation(&self, relation: &str) -> bool {
        self.relations
            .binary_search_by(|r| r.as_str().cmp(relation))
            .is_ok()
    }
}

/// Read-only traversal interface.
///
/// Transition slices are returned in insertion order. Every search in this
/// workspace visits successors in that order, which is what makes
/// counterexamples reproducible node for node.
pub trait Graph {
    type Node: Copy + Eq + Ord + Hash + Debug + Send + Sync;

    /// The unique dummy INITIAL node.
    fn initial_node(&self) -> Self::Node;

    fn outgoing(&self, node: Self::Node) -> &[Transition<Self::Node>];

    fn incoming(&self, node: Self::Node) -> &[Transition<Self::Node>];

    /// All nodes, in id order.
    fn nodes(&self) -> Vec<Self::Node>;

    fn event_type(&self, node: Self::Node) -> &EventType;

    /// Human-readable rendering used by reports.
    fn describe(&self, node: Self::Node) -> String;

    fn is_terminal(&self, node: Self::Node) -> bool {
        self.event_type(node).is_terminal()
    }

    /// Every relation label that appears on some transition.
    fn relations(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for node in self.nodes() {
            for t in self.outgoing(node) {
                out.extend(t.relations().iter().cloned());
            }
        }
        out
    }

    /// The label vocabulary of the graph.
    fn event_types(&self, include_sentinels: bool) -> BTreeSet<EventType> {
        self.nodes()
            .into_iter()
            .map(|n| self.event_type(n))
            .filter(|e| include_sentinels || !e.is_sentinel())
            .cloned()
            .collect()
    }
}

/// What a property automaton reads when a check over one relation follows a
/// transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation<'a> {
    /// Event types read, in path order. Sentinels are never read.
    pub letters: SmallVec<[&'a EventType; 2]>,
    /// The transition carries the relation, so its target has been read.
    pub linked: bool,
}

/// Project one transition onto `relation`.
///
/// A transition labeled with `relation` relates its two endpoints, and both
/// become visible: the source is read unless the path already reached it
/// over the relation (`source_read`), then the target. Other hops are silent.
pub fn observe<'g, G: Graph>(
    graph: &'g G,
    transition: &Transition<G::Node>,
    relation: &str,
    source_read: bool,
) -> Observation<'g> {
    let mut letters = SmallVec::new();
    let linked = transition.has_relation(relation);
    if linked {
        let source = graph.event_type(transition.source);
        if !source_read && !source.is_sentinel() {
            letters.push(source);
        }
        let target = graph.event_type(transition.target);
        if !target.is_sentinel() {
            letters.push(target);
        }
    }
    Observation { letters, linked }
}
