//! Counterexample shortening.
//!
//! Shortening looks only at event types along the path. Sentinels never match
//! an endpoint.

use crate::invariant::{BinaryInvariant, InvariantKind};
use trail_model::{EventType, Graph};

impl BinaryInvariant {
    /// Cut a violating path down to the shortest prefix that still shows the
    /// violation. Paths the rules below do not apply to come back unchanged.
    ///
    /// * AFby: ends right after the last `a` with no later `b`.
    /// * NFby: ends at the first `b` after the first `a`.
    /// * AP: ends at the first `b` that precedes every `a`.
    /// * NIFby: ends at the first `b` directly after an `a`.
    /// * Concurrency kinds are never shortened.
    pub fn shorten<G: Graph>(&self, graph: &G, mut path: Vec<G::Node>) -> Vec<G::Node> {
        let types: Vec<Option<&EventType>> = path
            .iter()
            .map(|&n| {
                let etype = graph.event_type(n);
                (!etype.is_sentinel()).then_some(etype)
            })
            .collect();
        let len = types.len();
        let is_a = |i: usize| types[i] == Some(self.first());
        let is_b = |i: usize| types[i] == Some(self.second());

        let keep = match self.kind() {
            InvariantKind::AlwaysFollowedBy => (0..len)
                .rev()
                .find(|&i| is_a(i))
                .filter(|&i| !(i + 1..len).any(is_b))
                .map(|i| i + 1),
            InvariantKind::NeverFollowedBy => (0..len)
                .find(|&i| is_a(i))
                .and_then(|i| (i + 1..len).find(|&j| is_b(j)))
                .map(|j| j + 1),
            InvariantKind::AlwaysPrecedes => {
                let mut keep = None;
                for i in 0..len {
                    if is_a(i) {
                        break;
                    }
                    if is_b(i) {
                        keep = Some(i + 1);
                        break;
                    }
                }
                keep
            }
            InvariantKind::NeverImmediatelyFollowedBy => (0..len.saturating_sub(1))
                .find(|&i| is_a(i) && is_b(i + 1))
                .map(|i| i + 2),
            InvariantKind::AlwaysConcurrentWith | InvariantKind::NeverConcurrentWith => None,
        };

        if let Some(keep) = keep {
            path.truncate(keep);
        }
        path
    }
}
