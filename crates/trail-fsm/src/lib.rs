//! Explicit-state checker for the ordering invariants.
//!
//! Each invariant kind gets a small deterministic automaton that reaches a
//! violating state exactly on the words breaking the invariant. The product
//! with the graph is searched breadth-first. The concurrency kinds are
//! checked by a happens-before monitor that follows every hop instead.

pub mod automaton;
pub mod checker;
pub mod concurrency;

pub use automaton::{FsmState, PropertyFsm};
pub use concurrency::{ConcurrencyMonitor, ConcurrencyState, Process};
pub use checker::FsmChecker;
