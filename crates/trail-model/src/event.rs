//! Event types and relation labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relation carried by every transition of a trace chain.
pub const TIME_RELATION: &str = "t";

/// Identifier of an event kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    /// Sentinel preceding every trace.
    Initial,
    /// Sentinel following every trace.
    Terminal,
    /// Label from a totally ordered log.
    Plain(String),
    /// Label emitted by one process of a distributed system.
    Distributed { label: String, pid: u32 },
}

impl EventType {
    pub fn plain(label: impl Into<String>) -> Self {
        EventType::Plain(label.into())
    }

    pub fn distributed(label: impl Into<String>, pid: u32) -> Self {
        EventType::Distributed {
            label: label.into(),
            pid,
        }
    }

    /// INITIAL and TERMINAL live outside the label vocabulary.
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, EventType::Initial | EventType::Terminal)
    }

    #[inline]
    pub fn is_initial(&self) -> bool {
        matches!(self, EventType::Initial)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventType::Terminal)
    }

    pub fn label(&self) -> &str {
        match self {
            EventType::Initial => "INITIAL",
            EventType::Terminal => "TERMINAL",
            EventType::Plain(label) => label,
            EventType::Distributed { label, .. } => label,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            EventType::Distributed { pid, .. } => Some(*pid),
            _ => None,
        }
    }

    /// 32-bit hash that is identical across runs, builds and platforms.
    ///
    /// Names derived from this hash end up in synthesized automaton states,
    /// so it must not depend on a randomly keyed hasher.
    pub fn stable_hash(&self) -> i32 {
        match self {
            EventType::Distributed { label, pid } => {
                31i32.wrapping_mul(string_hash(label)).wrapping_add(*pid as i32)
            }
            other => string_hash(other.label()),
        }
    }
}

/// 31-multiplier polynomial hash over UTF-16 code units.
pub fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

impl From<&str> for EventType {
    fn from(label: &str) -> Self {
        EventType::Plain(label.to_string())
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Distributed { label, pid } => write!(f, "{}_{}", label, pid),
            other => f.write_str(other.label()),
        }
    }
}
