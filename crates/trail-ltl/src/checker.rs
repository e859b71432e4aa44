//! Product of a graph with the Büchi automaton of a negated invariant.

use crate::buchi::Buchi;
use crate::error::LtlResult;
use crate::formula::Formula;
use smallvec::SmallVec;
use tracing::{debug, trace};
use trail_invariants::{BinaryInvariant, CExamplePath};
use trail_model::{search_product, EventType, Graph};

/// Atom standing for the invariant's first endpoint.
const FIRST_ATOM: &str = "p0";
/// Atom standing for the second endpoint, unless both endpoints are equal.
const SECOND_ATOM: &str = "p1";

/// Position of the automaton in the product: before the first letter, or
/// the set of states that can be occupied after the word read so far.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Cursor {
    Start,
    At(SmallVec<[u32; 8]>),
}

/// A Büchi automaton for the violations of one invariant, with the
/// acceptance of every possible end of word precomputed.
pub struct ViolationAutomaton {
    buchi: Buchi,
    /// Endpoint types with the atom each one makes true.
    endpoints: [(EventType, Option<u32>); 2],
    /// Accepting from the start on the empty word.
    start_accepts: bool,
    /// Some successor of the state starts an accepting run on the end letter.
    end_accepts: Vec<bool>,
}

impl ViolationAutomaton {
    /// Translate `inv` over generated atoms, negate it and build the
    /// automaton. Labels never reach the parser.
    pub fn new(inv: &BinaryInvariant) -> LtlResult<Self> {
        let second = if inv.first() == inv.second() {
            FIRST_ATOM
        } else {
            SECOND_ATOM
        };
        let text = inv.ltl_over(FIRST_ATOM, second)?;
        let negated = Formula::parse(&text)?.negate();
        trace!(invariant = %inv, formula = %negated, "translating");
        let buchi = Buchi::from_nnf(&negated.to_nnf());

        // The end of a word is read as a letter where every atom is false.
        let good = buchi.lasso_states(None);
        let start_accepts = buchi.initial().iter().any(|&q| good[q as usize]);
        let end_accepts = (0..buchi.len() as u32)
            .map(|q| {
                buchi
                    .state(q)
                    .successors
                    .iter()
                    .any(|&s| good[s as usize])
            })
            .collect();
        let endpoints = [
            (inv.first().clone(), buchi.atom_index(FIRST_ATOM)),
            (inv.second().clone(), buchi.atom_index(second)),
        ];
        Ok(Self {
            buchi,
            endpoints,
            start_accepts,
            end_accepts,
        })
    }

    pub fn buchi(&self) -> &Buchi {
        &self.buchi
    }

    /// The atom `etype` makes true, if any.
    fn letter(&self, etype: &EventType) -> Option<u32> {
        self.endpoints
            .iter()
            .find(|(endpoint, _)| endpoint == etype)
            .and_then(|(_, atom)| *atom)
    }

    fn step(&self, cursor: &Cursor, letter: Option<u32>) -> Option<Cursor> {
        let mut next: SmallVec<[u32; 8]> = match cursor {
            Cursor::Start => self
                .buchi
                .initial()
                .iter()
                .copied()
                .filter(|&q| self.buchi.consistent(q, letter))
                .collect(),
            Cursor::At(states) => states
                .iter()
                .flat_map(|&q| self.buchi.state(q).successors.iter().copied())
                .filter(|&q| self.buchi.consistent(q, letter))
                .collect(),
        };
        if next.is_empty() {
            return None;
        }
        next.sort_unstable();
        next.dedup();
        Some(Cursor::At(next))
    }

    fn accepts_end(&self, cursor: &Cursor) -> bool {
        match cursor {
            Cursor::Start => self.start_accepts,
            Cursor::At(states) => states.iter().any(|&q| self.end_accepts[q as usize]),
        }
    }
}

/// Automaton-theoretic checker.
#[derive(Debug, Default, Clone, Copy)]
pub struct LtlChecker;

impl LtlChecker {
    pub fn new() -> Self {
        Self
    }

    /// Search for a path whose word, closed off at TERMINAL, satisfies the
    /// negation of the invariant.
    ///
    /// For kinds settled by a prefix, a word already accepted when closed off
    /// early is a violation wherever the path stands.
    pub fn check<G: Graph>(
        &self,
        graph: &G,
        inv: &BinaryInvariant,
    ) -> LtlResult<Option<CExamplePath<G::Node>>> {
        let automaton = ViolationAutomaton::new(inv)?;
        let early = inv.kind().violated_by_prefix();
        let found = search_product(
            graph,
            inv.relation(),
            Cursor::Start,
            |cursor, etype| automaton.step(cursor, automaton.letter(etype)),
            |cursor, at_end| (at_end || early) && automaton.accepts_end(cursor),
        );
        match found {
            Some(path) => {
                let full = path.len();
                let path = inv.shorten(graph, path);
                debug!(invariant = %inv, full, shortened = path.len(), "violation");
                Ok(Some(CExamplePath::new(inv.clone(), path)))
            }
            None => {
                debug!(invariant = %inv, states = automaton.buchi.len(), "holds");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LtlError;
    use trail_model::{ChainsTraceGraph, EventType, TraceEvent, TIME_RELATION};

    fn linear(labels: &[&str]) -> ChainsTraceGraph {
        let mut g = ChainsTraceGraph::new();
        g.add_trace(labels.iter().map(|l| TraceEvent::new(*l)));
        g
    }

    fn types<G: Graph>(g: &G, path: &[G::Node]) -> Vec<String> {
        path.iter().map(|&n| g.event_type(n).to_string()).collect()
    }

    #[test]
    fn test_afby() {
        let inv = BinaryInvariant::always_followed_by("a", "b", TIME_RELATION);
        assert!(LtlChecker::new().check(&linear(&["a", "b"]), &inv).unwrap().is_none());
        let g = linear(&["a", "b", "a", "x"]);
        let cex = LtlChecker::new().check(&g, &inv).unwrap().unwrap();
        assert_eq!(types(&g, &cex.path), vec!["INITIAL", "a", "b", "a"]);
    }

    #[test]
    fn test_nfby() {
        let inv = BinaryInvariant::never_followed_by("a", "b", TIME_RELATION);
        assert!(LtlChecker::new().check(&linear(&["b", "a"]), &inv).unwrap().is_none());
        let g = linear(&["a", "x", "b", "y"]);
        let cex = LtlChecker::new().check(&g, &inv).unwrap().unwrap();
        assert_eq!(types(&g, &cex.path), vec!["INITIAL", "a", "x", "b"]);
    }

    #[test]
    fn test_ap() {
        let inv = BinaryInvariant::always_precedes("a", "b", TIME_RELATION);
        assert!(LtlChecker::new().check(&linear(&["a", "b"]), &inv).unwrap().is_none());
        assert!(LtlChecker::new().check(&linear(&["x"]), &inv).unwrap().is_none());
        let g = linear(&["x", "b", "a"]);
        let cex = LtlChecker::new().check(&g, &inv).unwrap().unwrap();
        assert_eq!(types(&g, &cex.path), vec!["INITIAL", "x", "b"]);
    }

    #[test]
    fn test_nifby() {
        let inv = BinaryInvariant::never_immediately_followed_by("a", "b", TIME_RELATION);
        assert!(LtlChecker::new()
            .check(&linear(&["a", "x", "b"]), &inv)
            .unwrap()
            .is_none());
        let g = linear(&["a", "b"]);
        assert!(LtlChecker::new().check(&g, &inv).unwrap().is_some());
    }

    #[test]
    fn test_empty_trace_satisfies_everything() {
        let mut g = ChainsTraceGraph::new();
        g.add_trace(Vec::new());
        for inv in [
            BinaryInvariant::always_followed_by("a", "b", TIME_RELATION),
            BinaryInvariant::never_followed_by("a", "b", TIME_RELATION),
            BinaryInvariant::always_precedes("a", "b", TIME_RELATION),
        ] {
            assert!(LtlChecker::new().check(&g, &inv).unwrap().is_none());
        }
    }

    #[test]
    fn test_labels_with_parentheses() {
        let g = linear(&["open(f)", "close(f)"]);
        let inv = BinaryInvariant::never_followed_by("open(f)", "close(f)", TIME_RELATION);
        let cex = LtlChecker::new().check(&g, &inv).unwrap().unwrap();
        assert_eq!(types(&g, &cex.path), vec!["INITIAL", "open(f)", "close(f)"]);
    }

    #[test]
    fn test_plain_and_distributed_labels_stay_apart() {
        // Both render as "m_1".
        let plain = EventType::plain("m_1");
        let dist = EventType::distributed("m", 1);
        let mut g = ChainsTraceGraph::new();
        g.add_trace([TraceEvent::new(dist.clone()), TraceEvent::new(plain.clone())]);
        let inv = BinaryInvariant::always_precedes(plain.clone(), dist.clone(), TIME_RELATION);
        let cex = LtlChecker::new().check(&g, &inv).unwrap().unwrap();
        assert_eq!(cex.path, vec![g.initial(), g.trace(0)[0]]);
        let inv = BinaryInvariant::always_precedes(dist, plain, TIME_RELATION);
        assert!(LtlChecker::new().check(&g, &inv).unwrap().is_none());
    }

    #[test]
    fn test_self_invariant_uses_one_atom() {
        let inv = BinaryInvariant::never_followed_by("a", "a", TIME_RELATION);
        let automaton = ViolationAutomaton::new(&inv).unwrap();
        assert_eq!(automaton.buchi().atoms(), &["p0".to_string()]);
        assert!(LtlChecker::new().check(&linear(&["a"]), &inv).unwrap().is_none());
        let g = linear(&["a", "x", "a"]);
        let cex = LtlChecker::new().check(&g, &inv).unwrap().unwrap();
        assert_eq!(types(&g, &cex.path), vec!["INITIAL", "a", "x", "a"]);
    }

    #[test]
    fn test_nfby_stops_at_first_violation() {
        let mut g = ChainsTraceGraph::new();
        g.add_trace(["a", "b", "z", "z", "z", "z"].map(TraceEvent::new));
        g.add_trace(["a", "y", "b"].map(TraceEvent::new));
        let inv = BinaryInvariant::never_followed_by("a", "b", TIME_RELATION);
        let cex = LtlChecker::new().check(&g, &inv).unwrap().unwrap();
        assert_eq!(cex.path, vec![g.initial(), g.trace(0)[0], g.trace(0)[1]]);
    }

    #[test]
    fn test_concurrency_is_refused() {
        let inv = BinaryInvariant::never_concurrent_with("a", "b", TIME_RELATION);
        let err = LtlChecker::new().check(&linear(&["a"]), &inv).unwrap_err();
        assert!(matches!(err, LtlError::Unsupported(_)));
    }
}
