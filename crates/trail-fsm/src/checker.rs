//! Product search of a graph against a property automaton.

use crate::automaton::PropertyFsm;
use crate::concurrency::ConcurrencyMonitor;
use tracing::debug;
use trail_invariants::{BinaryInvariant, CExamplePath, InvariantResult};
use trail_model::{search_hops, search_product, Graph};

/// Explicit-state checker.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsmChecker;

impl FsmChecker {
    pub fn new() -> Self {
        Self
    }

    /// Search the product of `graph` with the invariant's property automaton,
    /// or with the happens-before monitor for the concurrency kinds.
    ///
    /// Returns the shortened counterexample, or `None` when every path
    /// through the graph satisfies the invariant.
    pub fn check<G: Graph>(
        &self,
        graph: &G,
        inv: &BinaryInvariant,
    ) -> InvariantResult<Option<CExamplePath<G::Node>>> {
        let found = match ConcurrencyMonitor::new(inv) {
            Some(monitor) => search_hops(
                graph,
                monitor.initial(),
                |q, t| {
                    Some(monitor.step(
                        q,
                        t.has_relation(inv.relation()),
                        graph.event_type(t.source),
                        graph.event_type(t.target),
                    ))
                },
                |q, _| q.is_violated(),
            ),
            None => {
                let fsm = PropertyFsm::new(inv)?;
                let early = inv.kind().violated_by_prefix();
                search_product(
                    graph,
                    inv.relation(),
                    fsm.initial(),
                    |&q, letter| Some(fsm.step(q, letter)),
                    |&q, at_end| (at_end || early) && fsm.is_violating(q),
                )
            }
        };
        match found {
            Some(path) => {
                let full = path.len();
                let path = inv.shorten(graph, path);
                debug!(invariant = %inv, full, shortened = path.len(), "violation");
                Ok(Some(CExamplePath::new(inv.clone(), path)))
            }
            None => {
                debug!(invariant = %inv, "holds");
                Ok(None)
            }
        }
    }
}
