//! Checking entry points.

use crate::config::{Backend, CheckConfig};
use crate::error::{CheckError, CheckResult};
use rayon::prelude::*;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use trail_fsm::FsmChecker;
use trail_invariants::{BinaryInvariant, CExamplePath, TemporalInvariantSet};
use trail_ltl::LtlChecker;
use trail_model::{EventType, Graph};

/// Check one invariant against `graph` with `backend`.
///
/// Returns the first counterexample in traversal order, shortened, or `None`
/// when the invariant holds on every path.
pub fn verify_with<G: Graph>(
    backend: Backend,
    graph: &G,
    inv: &BinaryInvariant,
) -> CheckResult<Option<CExamplePath<G::Node>>> {
    verify_in(backend, graph, &graph.event_types(false), inv)
}

fn verify_in<G: Graph>(
    backend: Backend,
    graph: &G,
    vocabulary: &BTreeSet<EventType>,
    inv: &BinaryInvariant,
) -> CheckResult<Option<CExamplePath<G::Node>>> {
    for etype in [inv.first(), inv.second()] {
        if !vocabulary.contains(etype) {
            return Err(CheckError::MalformedInvariant {
                invariant: inv.to_string(),
                etype: etype.to_string(),
            });
        }
    }
    let found = match backend {
        Backend::Fsm => FsmChecker::new().check(graph, inv)?,
        Backend::Ltl => LtlChecker::new().check(graph, inv)?,
    };
    Ok(found)
}

/// Batch checker driven by a [`CheckConfig`].
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: CheckConfig,
}

impl Engine {
    pub fn new(config: CheckConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn check<G: Graph>(
        &self,
        graph: &G,
        inv: &BinaryInvariant,
    ) -> CheckResult<Option<CExamplePath<G::Node>>> {
        verify_with(self.config.backend, graph, inv)
    }

    /// Check every invariant of `set`. Failures stay attached to their
    /// invariant; the report keeps set order.
    pub fn check_all<G>(&self, graph: &G, set: &TemporalInvariantSet) -> CheckReport<G::Node>
    where
        G: Graph + Sync,
    {
        let backend = self.config.backend;
        let vocabulary = graph.event_types(false);
        info!(
            invariants = set.len(),
            backend = %backend,
            parallel = self.config.parallel,
            "checking invariants"
        );

        let check_one = |inv: &BinaryInvariant| CheckEntry {
            invariant: inv.clone(),
            result: verify_in(backend, graph, &vocabulary, inv),
        };

        let entries: Vec<CheckEntry<G::Node>> = if self.config.parallel {
            if self.config.num_threads > 0 {
                if let Err(e) = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.num_threads)
                    .build_global()
                {
                    debug!(error = %e, "thread pool already initialized, using existing pool");
                }
            }
            set.as_slice().par_iter().map(check_one).collect()
        } else {
            set.iter().map(check_one).collect()
        };

        let report = CheckReport { entries };
        for entry in &report.entries {
            if let Err(e) = &entry.result {
                warn!(invariant = %entry.invariant, error = %e, "check failed");
            }
        }
        info!(
            violated = report.counter_examples().len(),
            failed = report.errors().count(),
            "checking done"
        );
        report
    }
}

/// Outcome for one invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckEntry<N> {
    pub invariant: BinaryInvariant,
    pub result: CheckResult<Option<CExamplePath<N>>>,
}

/// Per-invariant outcomes of a batch, in invariant set order.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport<N> {
    entries: Vec<CheckEntry<N>>,
}

impl<N: Copy> CheckReport<N> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CheckEntry<N>] {
        &self.entries
    }

    pub fn get(&self, inv: &BinaryInvariant) -> Option<&CheckResult<Option<CExamplePath<N>>>> {
        self.entries
            .iter()
            .find(|e| &e.invariant == inv)
            .map(|e| &e.result)
    }

    /// Counterexamples of the violated invariants.
    pub fn counter_examples(&self) -> Vec<&CExamplePath<N>> {
        self.entries
            .iter()
            .filter_map(|e| e.result.as_ref().ok().and_then(|c| c.as_ref()))
            .collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = (&BinaryInvariant, &CheckError)> {
        self.entries
            .iter()
            .filter_map(|e| e.result.as_ref().err().map(|err| (&e.invariant, err)))
    }

    /// True when every invariant was checked and holds.
    pub fn all_hold(&self) -> bool {
        self.entries.iter().all(|e| matches!(e.result, Ok(None)))
    }
}

#[derive(serde::Serialize)]
struct EntryView<'a, N> {
    invariant: &'a BinaryInvariant,
    #[serde(skip_serializing_if = "Option::is_none")]
    counterexample: Option<&'a [N]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<N: Serialize> Serialize for CheckReport<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for entry in &self.entries {
            let (counterexample, error) = match &entry.result {
                Ok(found) => (found.as_ref().map(|c| c.path.as_slice()), None),
                Err(e) => (None, Some(e.to_string())),
            };
            seq.serialize_element(&EntryView {
                invariant: &entry.invariant,
                counterexample,
                error,
            })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trail_model::{ChainsTraceGraph, PartitionGraph, TraceEvent, TIME_RELATION};

    fn graph() -> ChainsTraceGraph {
        let mut g = ChainsTraceGraph::new();
        g.add_trace([TraceEvent::new("a"), TraceEvent::new("b"), TraceEvent::new("c")]);
        g.add_trace([TraceEvent::new("a"), TraceEvent::new("c")]);
        g
    }

    fn invariants() -> TemporalInvariantSet {
        vec![
            BinaryInvariant::always_precedes("a", "b", TIME_RELATION),
            BinaryInvariant::always_followed_by("a", "b", TIME_RELATION),
            BinaryInvariant::never_followed_by("a", "zz", TIME_RELATION),
            BinaryInvariant::never_concurrent_with("a", "b", TIME_RELATION),
        ]
        .into()
    }

    #[test]
    fn test_malformed_invariant() {
        let inv = BinaryInvariant::never_followed_by("a", "zz", TIME_RELATION);
        for backend in Backend::ALL {
            let err = verify_with(backend, &graph(), &inv).unwrap_err();
            assert_eq!(
                err,
                CheckError::MalformedInvariant {
                    invariant: inv.to_string(),
                    etype: "zz".to_string(),
                }
            );
        }
    }

    #[test]
    fn test_sentinels_are_not_vocabulary() {
        let inv = BinaryInvariant::new(
            trail_invariants::InvariantKind::NeverFollowedBy,
            EventType::Initial,
            "a",
            TIME_RELATION,
        );
        assert!(matches!(
            verify_with(Backend::Fsm, &graph(), &inv),
            Err(CheckError::MalformedInvariant { .. })
        ));
    }

    #[test]
    fn test_concurrency_is_checked_by_fsm_only() {
        let g = graph();
        // the time relation orders every pair of events
        let inv = BinaryInvariant::always_concurrent_with("a", "b", TIME_RELATION);
        let cex = verify_with(Backend::Fsm, &g, &inv).unwrap().unwrap();
        assert_eq!(cex.path, vec![g.initial(), g.trace(0)[0], g.trace(0)[1]]);
        let inv = BinaryInvariant::never_concurrent_with("a", "b", TIME_RELATION);
        assert_eq!(verify_with(Backend::Fsm, &g, &inv), Ok(None));
        assert!(matches!(
            verify_with(Backend::Ltl, &g, &inv),
            Err(CheckError::UnsupportedEncoding { encoding: "LTL", .. })
        ));
    }

    #[test]
    fn test_check_all_keeps_set_order() {
        let g = graph();
        let report = Engine::default().check_all(&g, &invariants());
        assert_eq!(report.len(), 4);
        let e = report.entries();
        assert!(matches!(e[0].result, Ok(None)));
        let cex = e[1].result.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(cex.path, vec![g.initial(), g.trace(1)[0]]);
        assert!(matches!(e[2].result, Err(CheckError::MalformedInvariant { .. })));
        assert!(matches!(e[3].result, Ok(None)));
        assert_eq!(report.counter_examples().len(), 1);
        assert_eq!(report.errors().count(), 1);
        assert!(!report.all_hold());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let chains = graph();
        let g = PartitionGraph::from_chains(&chains);
        let set = invariants();
        for backend in Backend::ALL {
            let sequential = Engine::new(CheckConfig {
                backend,
                ..CheckConfig::default()
            })
            .check_all(&g, &set);
            let parallel = Engine::new(CheckConfig {
                backend,
                parallel: true,
                ..CheckConfig::default()
            })
            .check_all(&g, &set);
            assert_eq!(parallel, sequential);
        }
    }

    #[test]
    fn test_report_serializes_as_list() {
        let g = graph();
        let report = Engine::default().check_all(&g, &invariants());
        let json = serde_json::to_value(&report).unwrap();
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 4);
        assert!(items[0].get("counterexample").is_none());
        assert_eq!(items[1]["counterexample"].as_array().unwrap().len(), 2);
        assert!(items[3].get("error").is_none());

        let ltl = Engine::new(CheckConfig {
            backend: Backend::Ltl,
            ..CheckConfig::default()
        })
        .check_all(&g, &invariants());
        let json = serde_json::to_value(&ltl).unwrap();
        assert_eq!(
            json[3]["error"].as_str().unwrap(),
            "a NeverConcurrentWith(t) b has no LTL encoding"
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = CheckConfig::default();
        assert_eq!(config.backend, Backend::Fsm);
        assert!(!config.parallel);
        let parsed: CheckConfig = serde_json::from_str(r#"{"backend":"ltl"}"#).unwrap();
        assert_eq!(parsed.backend, Backend::Ltl);
        assert_eq!(parsed.num_threads, 0);
    }
}
