//! Event and graph model for trace-derived invariant checking.
//!
//! Both model checkers work against the read-only [`Graph`] trait, which is
//! implemented by the per-trace [`ChainsTraceGraph`] and the compressed
//! [`PartitionGraph`].

pub mod chains;
pub mod event;
pub mod graph;
pub mod partition;
pub mod store;

pub use chains::{ChainsTraceGraph, EventId, EventNode, TraceEvent};
pub use event::{string_hash, EventType, TIME_RELATION};
pub use graph::{observe, Graph, Observation, RelationSet, Transition};
pub use partition::{Partition, PartitionGraph, PartitionId};
pub use store::{search_hops, search_product, ProductStore, StateInfo};
