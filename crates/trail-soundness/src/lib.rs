//! Test support: trace fixtures, the backend agreement harness and a
//! reference evaluator that checks invariants directly on words.

pub mod reference;

use tracing::warn;
use tracing_subscriber::EnvFilter;
use trail_check::{verify_with, Backend, CheckError, CheckResult};
use trail_invariants::{BinaryInvariant, CExamplePath};
use trail_model::{ChainsTraceGraph, Graph, PartitionGraph, TraceEvent, TIME_RELATION};

/// Install a test-friendly subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_test_writer()
        .try_init();
}

/// Parse `"<time> <type>"` and `"<time> <relation> <type>"` lines into one
/// trace, ordered by time.
pub fn parse_events(lines: &[&str]) -> Result<Vec<TraceEvent>, String> {
    let mut timed = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (time, relation, label) = match fields.as_slice() {
            [time, label] => (*time, None, *label),
            [time, relation, label] => (*time, Some(*relation), *label),
            _ => return Err(format!("line {}: expected 2 or 3 fields: {:?}", i + 1, line)),
        };
        let time: u64 = time
            .parse()
            .map_err(|_| format!("line {}: bad time {:?}", i + 1, time))?;
        let mut event = TraceEvent::new(label);
        if let Some(relation) = relation.filter(|r| *r != TIME_RELATION) {
            event = event.with_relation(relation);
        }
        timed.push((time, event));
    }
    timed.sort_by_key(|(time, _)| *time);
    Ok(timed.into_iter().map(|(_, event)| event).collect())
}

pub fn chains_from_lines(traces: &[&[&str]]) -> Result<ChainsTraceGraph, String> {
    let mut graph = ChainsTraceGraph::new();
    for lines in traces {
        graph.add_trace(parse_events(lines)?);
    }
    Ok(graph)
}

pub fn partition_from_lines(traces: &[&[&str]]) -> Result<PartitionGraph, String> {
    Ok(PartitionGraph::from_chains(&chains_from_lines(traces)?))
}

/// Run both backends and insist that they agree node for node.
pub fn cross_check<G: Graph>(
    graph: &G,
    inv: &BinaryInvariant,
) -> CheckResult<Option<CExamplePath<G::Node>>> {
    let fsm = verify_with(Backend::Fsm, graph, inv);
    let ltl = verify_with(Backend::Ltl, graph, inv);
    reconcile(graph, inv, fsm, ltl)
}

/// Merge the two backends' answers. Two refusals are agreement, as is an LTL
/// refusal for a kind that has no LTL encoding; anything else that differs
/// is a [`CheckError::BackendDisagreement`].
pub fn reconcile<G: Graph>(
    graph: &G,
    inv: &BinaryInvariant,
    fsm: CheckResult<Option<CExamplePath<G::Node>>>,
    ltl: CheckResult<Option<CExamplePath<G::Node>>>,
) -> CheckResult<Option<CExamplePath<G::Node>>> {
    match (fsm, ltl) {
        (Ok(f), Ok(l)) if f == l => Ok(f),
        (Err(e), Err(_)) => Err(e),
        (fsm, Err(CheckError::UnsupportedEncoding { .. })) if !inv.kind().has_ltl_encoding() => {
            fsm
        }
        (fsm, ltl) => {
            let fsm = describe(graph, &fsm);
            let ltl = describe(graph, &ltl);
            warn!(invariant = %inv, %fsm, %ltl, "backend disagreement");
            Err(CheckError::BackendDisagreement {
                invariant: inv.to_string(),
                fsm,
                ltl,
            })
        }
    }
}

fn describe<G: Graph>(graph: &G, result: &CheckResult<Option<CExamplePath<G::Node>>>) -> String {
    match result {
        Ok(Some(cex)) => cex.render(graph),
        Ok(None) => "no counterexample".to_string(),
        Err(e) => format!("error: {}", e),
    }
}

/// Event type labels along a path, sentinels dropped.
pub fn path_labels<G: Graph>(graph: &G, path: &[G::Node]) -> Vec<String> {
    path.iter()
        .map(|&n| graph.event_type(n))
        .filter(|e| !e.is_sentinel())
        .map(|e| e.to_string())
        .collect()
}
