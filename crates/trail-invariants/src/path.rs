//! Counterexample paths.

use crate::invariant::BinaryInvariant;
use serde::{Deserialize, Serialize};
use trail_model::Graph;

/// A violating path through a graph, starting at INITIAL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CExamplePath<N> {
    pub invariant: BinaryInvariant,
    pub path: Vec<N>,
}

impl<N: Copy> CExamplePath<N> {
    pub fn new(invariant: BinaryInvariant, path: Vec<N>) -> Self {
        Self { invariant, path }
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn last(&self) -> Option<N> {
        self.path.last().copied()
    }

    /// `invariant: n0 -> n1 -> ...` using the graph's node descriptions.
    pub fn render<G>(&self, graph: &G) -> String
    where
        G: Graph<Node = N>,
    {
        let nodes: Vec<String> = self.path.iter().map(|&n| graph.describe(n)).collect();
        format!("{}: {}", self.invariant, nodes.join(" -> "))
    }
}
