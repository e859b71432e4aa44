use serde::{Deserialize, Serialize};
use std::fmt;

/// Which model checker answers a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Explicit-state property automata.
    #[default]
    Fsm,
    /// LTL translation and Büchi product.
    Ltl,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Fsm, Backend::Ltl];
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Fsm => write!(f, "fsm"),
            Backend::Ltl => write!(f, "ltl"),
        }
    }
}

/// Configuration for the checking engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Backend used for every invariant.
    pub backend: Backend,
    /// Check the invariants of a batch in parallel.
    pub parallel: bool,
    /// Number of threads for parallel checking (0 = use all available).
    pub num_threads: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Fsm,
            parallel: false,
            num_threads: 0,
        }
    }
}
