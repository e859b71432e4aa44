//! Direct semantics of the invariants on single traces, used as an oracle.
//!
//! Relation visibility is computed per position here: an event belongs to
//! the word of relation `r` when the link into it or the link out of it
//! carries `r`.

use trail_invariants::{BinaryInvariant, InvariantKind};
use trail_model::{ChainsTraceGraph, EventType, Graph};

/// Whether a finite word violates an ordering invariant. Concurrency
/// invariants are not properties of a word; see [`concurrency_violation`].
pub fn violates(inv: &BinaryInvariant, word: &[EventType]) -> bool {
    let a = inv.first();
    let b = inv.second();
    let n = word.len();
    match inv.kind() {
        InvariantKind::AlwaysFollowedBy => {
            (0..n).any(|i| &word[i] == a && !(i..n).any(|j| &word[j] == b))
        }
        InvariantKind::NeverFollowedBy => {
            (0..n).any(|i| &word[i] == a && (i + 1..n).any(|j| &word[j] == b))
        }
        InvariantKind::AlwaysPrecedes => {
            (0..n).any(|j| &word[j] == b && !(0..=j).any(|i| &word[i] == a))
        }
        InvariantKind::NeverImmediatelyFollowedBy => {
            (0..n.saturating_sub(1)).any(|i| &word[i] == a && &word[i + 1] == b)
        }
        InvariantKind::AlwaysConcurrentWith | InvariantKind::NeverConcurrentWith => false,
    }
}

/// One event of a trace with the relation flags of its two links.
#[derive(Debug, Clone)]
pub struct Position {
    pub etype: EventType,
    pub linked_in: bool,
    pub linked_out: bool,
}

/// The events of one trace with their links projected onto `relation`.
pub fn positions(graph: &ChainsTraceGraph, trace: usize, relation: &str) -> Vec<Position> {
    graph
        .trace(trace)
        .iter()
        .map(|&event| Position {
            etype: graph.event_type(event).clone(),
            linked_in: graph.incoming(event)[0].has_relation(relation),
            linked_out: graph.outgoing(event)[0].has_relation(relation),
        })
        .collect()
}

/// Visible events with the path index (INITIAL is 0) at which a walk has
/// read them: on arrival when the link in carries the relation, otherwise on
/// leaving.
fn reads(positions: &[Position]) -> Vec<(usize, &EventType)> {
    positions
        .iter()
        .enumerate()
        .filter(|(_, p)| p.linked_in || p.linked_out)
        .map(|(i, p)| (if p.linked_in { i + 1 } else { i + 2 }, &p.etype))
        .collect()
}

/// The word each trace of `graph` spells over `relation`.
pub fn trace_words(graph: &ChainsTraceGraph, relation: &str) -> Vec<Vec<EventType>> {
    (0..graph.trace_count())
        .map(|trace| {
            reads(&positions(graph, trace, relation))
                .into_iter()
                .map(|(_, etype)| etype.clone())
                .collect()
        })
        .collect()
}

/// Path index of the later event of the first pair that breaks a
/// concurrency invariant, ordering events by program order inside a process
/// and by links that carry the relation.
pub fn concurrency_violation(inv: &BinaryInvariant, positions: &[Position]) -> Option<usize> {
    let never = match inv.kind() {
        InvariantKind::NeverConcurrentWith => true,
        InvariantKind::AlwaysConcurrentWith => false,
        _ => return None,
    };
    let n = positions.len();
    let edge = |k: usize, j: usize| {
        positions[k].etype.pid() == positions[j].etype.pid()
            || (k + 1 == j && positions[j].linked_in)
    };
    // ordered[i][j]: a chain of edges leads from i to j (i < j)
    let mut ordered = vec![vec![false; n]; n];
    for j in 0..n {
        for i in (0..j).rev() {
            ordered[i][j] = edge(i, j) || (i + 1..j).any(|k| ordered[i][k] && edge(k, j));
        }
    }
    let (a, b) = (inv.first(), inv.second());
    (0..n).find_map(|j| {
        (0..j)
            .any(|i| {
                let (x, y) = (&positions[i].etype, &positions[j].etype);
                let pair = (x == a && y == b) || (x == b && y == a);
                pair && ordered[i][j] != never
            })
            .then_some(j + 1)
    })
}

/// Number of hops from INITIAL after which a check of `inv` over one trace
/// reports a violation, or `None` when the trace satisfies it.
///
/// Kinds settled by a prefix report at the first violating prefix; the
/// others report at TERMINAL.
pub fn violation_depth(
    graph: &ChainsTraceGraph,
    trace: usize,
    inv: &BinaryInvariant,
) -> Option<usize> {
    let positions = positions(graph, trace, inv.relation());
    if inv.kind().is_concurrency() {
        return concurrency_violation(inv, &positions);
    }
    let reads = reads(&positions);
    let end = positions.len() + 1;
    let prefix = |depth: usize| -> Vec<EventType> {
        reads
            .iter()
            .filter(|(at, _)| *at <= depth)
            .map(|(_, etype)| (*etype).clone())
            .collect()
    };
    if inv.kind().violated_by_prefix() {
        (1..=end).find(|&depth| violates(inv, &prefix(depth)))
    } else {
        violates(inv, &prefix(end)).then_some(end)
    }
}

/// Indices of the traces that violate `inv`.
pub fn violating_traces(graph: &ChainsTraceGraph, inv: &BinaryInvariant) -> Vec<usize> {
    (0..graph.trace_count())
        .filter(|&trace| violation_depth(graph, trace, inv).is_some())
        .collect()
}

/// The smallest [`violation_depth`] over all traces.
pub fn shortest_violation(graph: &ChainsTraceGraph, inv: &BinaryInvariant) -> Option<usize> {
    (0..graph.trace_count())
        .filter_map(|trace| violation_depth(graph, trace, inv))
        .min()
}
