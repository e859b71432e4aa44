//! Anonymous state names.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use crate::state::ObsStateId;
use trail_model::EventType;

/// Shared, monotonically increasing source of `a<n>` names.
///
/// Clones share one counter, so every construction session that holds a
/// clone draws from the same sequence.
#[derive(Debug, Clone, Default)]
pub struct AnonNames {
    next: Arc<AtomicU64>,
}

impl AnonNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh sequence whose first name is `a<start>`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn next_name(&self) -> String {
        format!("a{}", self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number the next name would carry.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

/// How a new state gets its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Naming {
    /// Next name from the session's [`AnonNames`].
    Anonymous,
    /// A label taken from the trace.
    Named(String),
    /// Deterministic name from the previous state and the event that left
    /// it, so replays produce the same names.
    Derived { prev: ObsStateId, event: EventType },
    /// `a<pid>`; only for initial roles.
    PerProcess,
}

impl Naming {
    pub fn named(name: impl Into<String>) -> Self {
        Naming::Named(name.into())
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Naming::Anonymous => "anonymous",
            Naming::Named(_) => "named",
            Naming::Derived { .. } => "derived",
            Naming::PerProcess => "per-process",
        }
    }
}

/// `a` followed by `31 * prev + hash(event)` in wrapping 32-bit arithmetic.
pub fn derived_name(prev: i32, event: &EventType) -> String {
    let hash = prev.wrapping_mul(31).wrapping_add(event.stable_hash());
    format!("a{}", hash)
}
