//! End-to-end scenarios over small hand-written traces.
//!
//! Every scenario goes through `cross_check`, so each one also asserts that
//! both backends return the same path.

use trail_check::{verify_with, Backend, CheckError};
use trail_invariants::{BinaryInvariant, InvariantError};
use trail_model::{ChainsTraceGraph, EventId, EventType, Graph, TraceEvent};
use trail_soundness::{
    chains_from_lines, cross_check, init_tracing, partition_from_lines, path_labels,
};

fn nfby() -> BinaryInvariant {
    BinaryInvariant::never_followed_by("a", "b", "r")
}

fn afby() -> BinaryInvariant {
    BinaryInvariant::always_followed_by("a", "b", "r")
}

fn ap() -> BinaryInvariant {
    BinaryInvariant::always_precedes("a", "b", "r")
}

/// The first `hops` hops of the single trace of `g`, TERMINAL included.
fn chain_prefix(g: &ChainsTraceGraph, hops: usize) -> Vec<EventId> {
    let mut path = vec![g.initial()];
    path.extend_from_slice(g.trace(0));
    path.push(g.terminal());
    path.truncate(hops + 1);
    path
}

/// Check a single linear trace: `Some(hops)` expects the counterexample
/// running `hops` hops from INITIAL, `None` expects the invariant to hold.
fn linear_case(lines: &[&str], inv: BinaryInvariant, hops: Option<usize>) {
    init_tracing();
    let g = chains_from_lines(&[lines]).unwrap();
    let found = cross_check(&g, &inv).unwrap();
    match hops {
        Some(hops) => {
            let cex = found.expect("counterexample");
            assert_eq!(cex.path, chain_prefix(&g, hops), "{inv} on {lines:?}");
            assert_eq!(cex.invariant, inv);
        }
        None => assert!(found.is_none(), "{inv} on {lines:?}: {found:?}"),
    }
}

fn cycle_case(lines: &[&str], inv: BinaryInvariant) -> Option<Vec<String>> {
    init_tracing();
    let pg = partition_from_lines(&[lines]).unwrap();
    let found = cross_check(&pg, &inv).unwrap()?;
    assert_eq!(found.path[0], pg.initial_node());
    Some(path_labels(&pg, &found.path))
}

// A relation makes both ends of the link that carries it visible. With
// "4 r x" the link out of b carries r, so the walk observes x a b x.
#[test]
fn nfby_sees_b_through_the_link_out_of_it() {
    let labels = cycle_case(&["1 x", "2 r a", "3 b", "4 r x"], nfby());
    assert_eq!(labels, Some(vec!["x".into(), "a".into(), "b".into()]));
}

// Both links around b carry time only, so r never sees it.
#[test]
fn nfby_holds_when_b_is_never_observed() {
    assert_eq!(cycle_case(&["1 x", "2 r a", "3 b", "4 x"], nfby()), None);
}

#[test]
fn nfby_counterexample_through_partitions() {
    let labels = cycle_case(&["1 x", "2 r a", "3 r b", "4 x"], nfby());
    assert_eq!(labels, Some(vec!["x".into(), "a".into(), "b".into()]));
}

#[test]
fn afby_and_ap_hold_around_an_observed_cycle() {
    assert_eq!(cycle_case(&["1 x", "2 r a", "3 b", "4 r x"], afby()), None);
    assert_eq!(cycle_case(&["1 x", "2 r a", "3 b", "4 r x"], ap()), None);
}

#[test]
fn nfby_on_linear_traces() {
    linear_case(&["1 a", "2 r a", "3 z", "4 b", "5 r b"], nfby(), Some(4));
    linear_case(&["1 a", "2 b", "3 r b"], nfby(), None);
    linear_case(&["1 a", "2 r a", "3 b", "4 z", "5 r z"], nfby(), None);
    linear_case(&["1 a", "2 r a", "3 b"], nfby(), None);
}

#[test]
fn ap_on_linear_traces() {
    linear_case(&["1 a", "2 b", "3 r b"], ap(), Some(4));
    linear_case(&["1 z", "2 r z", "3 a", "4 b", "5 r b"], ap(), Some(6));
    linear_case(&["1 a", "2 r a", "3 z", "4 b", "5 r b"], ap(), None);
    linear_case(&["1 z", "2 r z", "3 b"], ap(), None);
}

#[test]
fn afby_on_linear_traces() {
    linear_case(&["1 a", "2 r a", "3 b"], afby(), Some(4));
    linear_case(&["1 a", "2 r a", "3 b", "4 z", "5 r z"], afby(), Some(6));
    linear_case(&["1 a", "2 z", "3 r z"], afby(), None);
    linear_case(&["1 a", "2 r a", "3 z", "4 b", "5 r b"], afby(), None);
}

#[test]
fn ap_counterexample_runs_four_hops() {
    init_tracing();
    let g = chains_from_lines(&[&["1 a", "2 b", "3 r b"]]).unwrap();
    let cex = cross_check(&g, &ap()).unwrap().expect("counterexample");
    assert_eq!(cex.path.len(), 5);
    assert_eq!(cex.path[0], g.initial());
    assert_eq!(&cex.path[1..4], g.trace(0));
    assert!(g.is_terminal(cex.path[4]));
}

#[test]
fn afby_counterexample_runs_four_hops() {
    init_tracing();
    let g = chains_from_lines(&[&["1 a", "2 r a", "3 b"]]).unwrap();
    let cex = cross_check(&g, &afby()).unwrap().expect("counterexample");
    assert_eq!(cex.path.len(), 5);
    assert_eq!(&cex.path[1..4], g.trace(0));
    assert!(g.is_terminal(cex.path[4]));
}

#[test]
fn never_concurrent_has_no_ltl_string() {
    let inv = BinaryInvariant::never_concurrent_with("a", "b", "r");
    assert!(matches!(
        inv.ltl_string(),
        Err(InvariantError::UnsupportedEncoding { encoding: "LTL", .. })
    ));
}

#[test]
fn concurrency_is_checked_by_fsm_and_refused_by_ltl() {
    init_tracing();
    // Plain events share one process, so a and b are always ordered.
    let g = chains_from_lines(&[&["1 a", "2 r b"]]).unwrap();
    let nc = BinaryInvariant::never_concurrent_with("a", "b", "r");
    assert_eq!(verify_with(Backend::Fsm, &g, &nc).unwrap(), None);
    assert!(matches!(
        verify_with(Backend::Ltl, &g, &nc),
        Err(CheckError::UnsupportedEncoding { encoding: "LTL", .. })
    ));
    assert_eq!(cross_check(&g, &nc).unwrap(), None);

    let ac = BinaryInvariant::always_concurrent_with("a", "b", "r");
    let cex = cross_check(&g, &ac).unwrap().expect("counterexample");
    assert_eq!(path_labels(&g, &cex.path), vec!["a", "b"]);
}

#[test]
fn never_concurrent_across_processes() {
    init_tracing();
    let send = EventType::distributed("send", 0);
    let recv = EventType::distributed("recv", 1);
    let mut g = ChainsTraceGraph::new();
    g.add_trace([
        TraceEvent::new(send.clone()),
        TraceEvent::new(recv.clone()).with_relation("m"),
    ]);
    let nc = BinaryInvariant::never_concurrent_with(send.clone(), recv.clone(), "m");
    assert_eq!(cross_check(&g, &nc).unwrap(), None);

    // Without the message link the two processes run concurrently.
    let nc = BinaryInvariant::never_concurrent_with(send, recv, "ack");
    let cex = cross_check(&g, &nc).unwrap().expect("counterexample");
    assert_eq!(cex.path, chain_prefix(&g, 2));
}

#[test]
fn unknown_event_type_is_malformed() {
    let g = chains_from_lines(&[&["1 a", "2 b"]]).unwrap();
    let inv = BinaryInvariant::always_followed_by("a", "zzz", "t");
    match cross_check(&g, &inv) {
        Err(CheckError::MalformedInvariant { etype, .. }) => assert_eq!(etype, "zzz"),
        other => panic!("expected MalformedInvariant, got {:?}", other),
    }
}

#[test]
fn counterexample_renders_for_reports() {
    let g = chains_from_lines(&[&["1 a", "2 b"]]).unwrap();
    let inv = BinaryInvariant::never_followed_by("a", "b", "t");
    let cex = cross_check(&g, &inv).unwrap().expect("counterexample");
    assert_eq!(
        cex.render(&g),
        "a NeverFollowedBy(t) b: INITIAL -> a[0:1] -> b[0:2]"
    );
    let json = serde_json::to_value(&cex).unwrap();
    assert_eq!(json["path"].as_array().map(|p| p.len()), Some(3));
}
