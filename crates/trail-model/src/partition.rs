//! Partition graph: nodes are sets of same-typed event occurrences.

use crate::chains::{ChainsTraceGraph, EventId};
use crate::event::EventType;
use crate::graph::{Graph, RelationSet, Transition};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Handle of a partition inside a [`PartitionGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionId(u32);

impl PartitionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A set of event occurrences sharing one event type.
#[derive(Debug, Clone)]
pub struct Partition {
    etype: EventType,
    events: Vec<EventId>,
    outgoing: Vec<Transition<PartitionId>>,
    incoming: Vec<Transition<PartitionId>>,
}

impl Partition {
    pub fn event_type(&self) -> &EventType {
        &self.etype
    }

    /// Member events in id order.
    pub fn events(&self) -> &[EventId] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// The coarsest partitioning of a chains graph: one partition per event type.
#[derive(Debug, Clone)]
pub struct PartitionGraph {
    partitions: Vec<Partition>,
    /// Owning partition, indexed by event id.
    owner: Vec<PartitionId>,
}

impl PartitionGraph {
    /// Group same-typed events of `chains` into partitions.
    ///
    /// Partition ids follow the first appearance of each type in event id
    /// order, so the INITIAL partition is always `p0`. A partition's
    /// transitions are the union of its members' transitions, deduplicated
    /// by target partition and relation set.
    pub fn from_chains(chains: &ChainsTraceGraph) -> Self {
        let mut partitions: Vec<Partition> = Vec::new();
        let mut by_type: HashMap<EventType, PartitionId> = HashMap::new();
        let mut owner = Vec::with_capacity(chains.len());

        for event in chains.nodes() {
            let etype = chains.event_type(event);
            let pid = *by_type.entry(etype.clone()).or_insert_with(|| {
                partitions.push(Partition {
                    etype: etype.clone(),
                    events: Vec::new(),
                    outgoing: Vec::new(),
                    incoming: Vec::new(),
                });
                PartitionId((partitions.len() - 1) as u32)
            });
            partitions[pid.index()].events.push(event);
            owner.push(pid);
        }

        for p in 0..partitions.len() {
            let source = PartitionId(p as u32);
            let mut seen: HashSet<(PartitionId, RelationSet)> = HashSet::new();
            let mut outgoing = Vec::new();
            for &event in &partitions[p].events {
                for t in chains.outgoing(event) {
                    let target = owner[t.target.index()];
                    let relations: RelationSet = t.relations().iter().cloned().collect();
                    if seen.insert((target, relations.clone())) {
                        outgoing.push(Transition::new(source, target, relations));
                    }
                }
            }
            partitions[p].outgoing = outgoing;
        }

        for p in 0..partitions.len() {
            for i in 0..partitions[p].outgoing.len() {
                let t = partitions[p].outgoing[i].clone();
                partitions[t.target.index()].incoming.push(t);
            }
        }

        debug!(
            partitions = partitions.len(),
            events = owner.len(),
            "built partition graph"
        );
        Self { partitions, owner }
    }

    pub fn partition(&self, id: PartitionId) -> &Partition {
        &self.partitions[id.index()]
    }

    /// The partition that currently holds `event`.
    pub fn partition_of(&self, event: EventId) -> PartitionId {
        self.owner[event.index()]
    }

    /// The partition holding events of `etype`, if any.
    pub fn find(&self, etype: &EventType) -> Option<PartitionId> {
        self.partitions
            .iter()
            .position(|p| &p.etype == etype)
            .map(|i| PartitionId(i as u32))
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

impl Graph for PartitionGraph {
    type Node = PartitionId;

    fn initial_node(&self) -> PartitionId {
        self.owner[0]
    }

    fn outgoing(&self, node: PartitionId) -> &[Transition<PartitionId>] {
        &self.partitions[node.index()].outgoing
    }

    fn incoming(&self, node: PartitionId) -> &[Transition<PartitionId>] {
        &self.partitions[node.index()].incoming
    }

    fn nodes(&self) -> Vec<PartitionId> {
        (0..self.partitions.len() as u32).map(PartitionId).collect()
    }

    fn event_type(&self, node: PartitionId) -> &EventType {
        &self.partitions[node.index()].etype
    }

    fn describe(&self, node: PartitionId) -> String {
        let p = &self.partitions[node.index()];
        format!("{}({})", p.etype, p.events.len())
    }
}
