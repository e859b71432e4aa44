//! Chains trace graph: one linear chain of event nodes per input trace.

use crate::event::{EventType, TIME_RELATION};
use crate::graph::{Graph, Transition};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Handle of an event node inside a [`ChainsTraceGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(u32);

impl EventId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// One event as handed over by the trace parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub etype: EventType,
    /// Relations, besides time, linking this event to its predecessor.
    pub relations: Vec<String>,
}

impl TraceEvent {
    pub fn new(etype: impl Into<EventType>) -> Self {
        Self {
            etype: etype.into(),
            relations: Vec::new(),
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relations.push(relation.into());
        self
    }
}

/// An event occurrence plus its transitions.
#[derive(Debug, Clone)]
pub struct EventNode {
    pub etype: EventType,
    /// Trace index, `None` for the shared sentinels.
    pub trace: Option<usize>,
    /// 1-based position inside the trace (0 for sentinels).
    pub position: usize,
    outgoing: Vec<Transition<EventId>>,
    incoming: Vec<Transition<EventId>>,
}

impl EventNode {
    fn new(etype: EventType, trace: Option<usize>, position: usize) -> Self {
        Self {
            etype,
            trace,
            position,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }
}

const INITIAL: EventId = EventId(0);
const TERMINAL: EventId = EventId(1);

/// Per-trace linear chains sharing one INITIAL and one TERMINAL node.
#[derive(Debug, Clone)]
pub struct ChainsTraceGraph {
    nodes: Vec<EventNode>,
    traces: Vec<Vec<EventId>>,
}

impl ChainsTraceGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![
                EventNode::new(EventType::Initial, None, 0),
                EventNode::new(EventType::Terminal, None, 0),
            ],
            traces: Vec::new(),
        }
    }

    /// Append one trace as a chain `INITIAL -> e1 -> ... -> en -> TERMINAL`.
    ///
    /// Every link carries the time relation; the link into `ei` also carries
    /// the relations recorded on `ei`. Returns the trace index.
    pub fn add_trace<I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = TraceEvent>,
    {
        let trace = self.traces.len();
        let mut ids = Vec::new();
        let mut prev = INITIAL;
        for (i, event) in events.into_iter().enumerate() {
            let id = self.push_node(EventNode::new(event.etype, Some(trace), i + 1));
            let relations = std::iter::once(TIME_RELATION.to_string()).chain(event.relations);
            self.link(prev, id, relations);
            ids.push(id);
            prev = id;
        }
        self.link(prev, TERMINAL, [TIME_RELATION.to_string()]);
        debug!(trace, events = ids.len(), "added trace chain");
        self.traces.push(ids);
        trace
    }

    pub fn initial(&self) -> EventId {
        INITIAL
    }

    pub fn terminal(&self) -> EventId {
        TERMINAL
    }

    pub fn node(&self, id: EventId) -> &EventNode {
        &self.nodes[id.index()]
    }

    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    /// Event ids of one trace, sentinels excluded.
    pub fn trace(&self, trace: usize) -> &[EventId] {
        &self.traces[trace]
    }

    /// Number of nodes, sentinels included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    fn push_node(&mut self, node: EventNode) -> EventId {
        let id = EventId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn link(&mut self, source: EventId, target: EventId, relations: impl IntoIterator<Item = String>) {
        let transition = Transition::new(source, target, relations);
        self.nodes[target.index()].incoming.push(transition.clone());
        self.nodes[source.index()].outgoing.push(transition);
    }
}

impl Default for ChainsTraceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph for ChainsTraceGraph {
    type Node = EventId;

    fn initial_node(&self) -> EventId {
        INITIAL
    }

    fn outgoing(&self, node: EventId) -> &[Transition<EventId>] {
        &self.nodes[node.index()].outgoing
    }

    fn incoming(&self, node: EventId) -> &[Transition<EventId>] {
        &self.nodes[node.index()].incoming
    }

    fn nodes(&self) -> Vec<EventId> {
        (0..self.nodes.len() as u32).map(EventId).collect()
    }

    fn event_type(&self, node: EventId) -> &EventType {
        &self.nodes[node.index()].etype
    }

    fn describe(&self, node: EventId) -> String {
        let n = &self.nodes[node.index()];
        match n.trace {
            Some(trace) => format!("{}[{}:{}]", n.etype, trace, n.position),
            None => n.etype.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(labels: &[&str]) -> ChainsTraceGraph {
        let mut g = ChainsTraceGraph::new();
        g.add_trace(labels.iter().map(|l| TraceEvent::new(*l)));
        g
    }

    #[test]
    fn test_linear_chain_shape() {
        let g = linear(&["a", "b", "c"]);
        assert_eq!(g.len(), 5);

        let mut node = g.initial_node();
        let mut seen = Vec::new();
        while !g.is_terminal(node) {
            let out = g.outgoing(node);
            assert_eq!(out.len(), 1, "chain nodes have one successor");
            assert!(out[0].has_relation(TIME_RELATION));
            node = out[0].target;
            seen.push(g.event_type(node).to_string());
        }
        assert_eq!(seen, vec!["a", "b", "c", "TERMINAL"]);
    }

    #[test]
    fn test_relations_label_incoming_link() {
        let mut g = ChainsTraceGraph::new();
        g.add_trace([
            TraceEvent::new("a"),
            TraceEvent::new("b").with_relation("r"),
        ]);
        let ids = g.trace(0).to_vec();
        let into_a = &g.incoming(ids[0])[0];
        let into_b = &g.incoming(ids[1])[0];
        assert!(!into_a.has_relation("r"));
        assert!(into_b.has_relation("r"));
        assert!(into_b.has_relation(TIME_RELATION));
        assert_eq!(g.relations().len(), 2);
    }

    #[test]
    fn test_traces_share_sentinels() {
        let mut g = ChainsTraceGraph::new();
        g.add_trace([TraceEvent::new("a")]);
        g.add_trace([TraceEvent::new("b")]);
        assert_eq!(g.trace_count(), 2);
        assert_eq!(g.outgoing(g.initial()).len(), 2);
        assert_eq!(g.incoming(g.terminal()).len(), 2);
    }

    #[test]
    fn test_empty_trace_links_sentinels() {
        let mut g = ChainsTraceGraph::new();
        g.add_trace(Vec::new());
        let out = g.outgoing(g.initial());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].target, g.terminal());
    }

    #[test]
    fn test_vocabulary_excludes_sentinels() {
        let g = linear(&["a", "b", "a"]);
        let vocab = g.event_types(false);
        assert_eq!(vocab.len(), 2);
        assert_eq!(g.event_types(true).len(), 4);
    }
}
