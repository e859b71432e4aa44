//! Product-state storage and breadth-first product search.

use crate::graph::{observe, Graph, Transition};
use crate::event::EventType;
use ahash::AHashMap;
use std::collections::VecDeque;
use std::hash::Hash;
use tracing::{debug, trace};

/// How a product state was reached.
#[derive(Debug, Clone)]
pub struct StateInfo<K> {
    /// Predecessor key (None for the root).
    pub predecessor: Option<K>,
    /// Depth from the root.
    pub depth: usize,
}

/// Parent-pointer map over product states.
#[derive(Debug)]
pub struct ProductStore<K> {
    states: AHashMap<K, StateInfo<K>>,
}

impl<K: Clone + Eq + Hash> ProductStore<K> {
    pub fn new() -> Self {
        Self {
            states: AHashMap::new(),
        }
    }

    /// Try to insert a new state. Returns true if the state was new.
    pub fn insert(&mut self, key: K, predecessor: Option<K>, depth: usize) -> bool {
        use std::collections::hash_map::Entry;
        match self.states.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(StateInfo { predecessor, depth });
                true
            }
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.states.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&StateInfo<K>> {
        self.states.get(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Keys from the root down to `key`, following predecessor links.
    pub fn trace_to(&self, key: &K) -> Vec<K> {
        let mut trace = Vec::new();
        let mut current = Some(key.clone());
        while let Some(k) = current {
            match self.states.get(&k) {
                Some(info) => {
                    current = info.predecessor.clone();
                    trace.push(k);
                }
                None => break,
            }
        }
        trace.reverse();
        trace
    }
}

impl<K: Clone + Eq + Hash> Default for ProductStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Breadth-first search of the product of `graph` with a deterministic
/// monitor that sees every hop.
///
/// `step` follows one transition; returning `None` prunes the branch.
/// `accepts` is asked once per newly discovered product state, with a flag
/// telling whether the state sits on TERMINAL. Successors are visited in
/// transition order and every state is checked when first discovered, so the
/// returned node path is the lexicographically least of the shortest accepted
/// paths.
pub fn search_hops<G, Q, S, A>(graph: &G, start: Q, mut step: S, mut accepts: A) -> Option<Vec<G::Node>>
where
    G: Graph,
    Q: Clone + Eq + Hash,
    S: FnMut(&Q, &Transition<G::Node>) -> Option<Q>,
    A: FnMut(&Q, bool) -> bool,
{
    let mut store = ProductStore::new();
    let root = (graph.initial_node(), start);
    store.insert(root.clone(), None, 0);
    let mut queue = VecDeque::from([(root, 0usize)]);

    while let Some((current, depth)) = queue.pop_front() {
        let (node, q) = &current;
        for t in graph.outgoing(*node) {
            let Some(next_q) = step(q, t) else {
                continue;
            };
            let next = (t.target, next_q);
            if !store.insert(next.clone(), Some(current.clone()), depth + 1) {
                continue;
            }
            let at_end = graph.is_terminal(t.target);
            if accepts(&next.1, at_end) {
                debug!(
                    states = store.len(),
                    depth = depth + 1,
                    at_end,
                    "accepting product state found"
                );
                let path = store.trace_to(&next).into_iter().map(|(n, _)| n).collect();
                return Some(path);
            }
            if at_end {
                trace!(node = ?t.target, "non-accepting end");
            } else {
                queue.push_back((next, depth + 1));
            }
        }
    }

    debug!(states = store.len(), "product exhausted");
    None
}

/// Product search against a word automaton, projected onto `relation`.
///
/// The automaton reads the letters [`observe`] yields for each hop; `step`
/// consumes one letter and may prune with `None`. The product key also
/// records whether the current node was reached over `relation`, since that
/// decides whether leaving it reads it again.
pub fn search_product<G, Q, S, A>(
    graph: &G,
    relation: &str,
    start: Q,
    mut step: S,
    mut accepts: A,
) -> Option<Vec<G::Node>>
where
    G: Graph,
    Q: Clone + Eq + Hash,
    S: FnMut(&Q, &EventType) -> Option<Q>,
    A: FnMut(&Q, bool) -> bool,
{
    search_hops(
        graph,
        (false, start),
        |(read, q), t| {
            let seen = observe(graph, t, relation, *read);
            let mut q = q.clone();
            for etype in seen.letters {
                q = step(&q, etype)?;
            }
            Some((seen.linked, q))
        },
        |(_, q), at_end| accepts(q, at_end),
    )
}
