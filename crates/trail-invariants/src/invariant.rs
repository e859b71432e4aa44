//! Binary temporal invariants over `(first, second, relation)`.

use crate::error::{InvariantError, InvariantResult};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use trail_model::EventType;

/// The fixed vocabulary of binary relations between two event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InvariantKind {
    /// Every `a` is eventually followed by a `b`.
    AlwaysFollowedBy,
    /// No `b` ever follows an `a`.
    NeverFollowedBy,
    /// Every `b` is preceded by some `a`.
    AlwaysPrecedes,
    /// No `a` is directly followed by a `b`.
    NeverImmediatelyFollowedBy,
    /// `a` and `b` are always concurrent (distributed traces).
    AlwaysConcurrentWith,
    /// `a` and `b` are never concurrent (distributed traces).
    NeverConcurrentWith,
}

impl InvariantKind {
    pub const ALL: [InvariantKind; 6] = [
        InvariantKind::AlwaysFollowedBy,
        InvariantKind::NeverFollowedBy,
        InvariantKind::AlwaysPrecedes,
        InvariantKind::NeverImmediatelyFollowedBy,
        InvariantKind::AlwaysConcurrentWith,
        InvariantKind::NeverConcurrentWith,
    ];

    pub fn short_name(self) -> &'static str {
        match self {
            InvariantKind::AlwaysFollowedBy => "AFby",
            InvariantKind::NeverFollowedBy => "NFby",
            InvariantKind::AlwaysPrecedes => "AP",
            InvariantKind::NeverImmediatelyFollowedBy => "NIFby",
            InvariantKind::AlwaysConcurrentWith => "ACwith",
            InvariantKind::NeverConcurrentWith => "NCwith",
        }
    }

    pub fn long_name(self) -> &'static str {
        match self {
            InvariantKind::AlwaysFollowedBy => "AlwaysFollowedBy",
            InvariantKind::NeverFollowedBy => "NeverFollowedBy",
            InvariantKind::AlwaysPrecedes => "AlwaysPrecedes",
            InvariantKind::NeverImmediatelyFollowedBy => "NeverImmediatelyFollowedBy",
            InvariantKind::AlwaysConcurrentWith => "AlwaysConcurrentWith",
            InvariantKind::NeverConcurrentWith => "NeverConcurrentWith",
        }
    }

    /// Symmetric kinds treat `(a, b)` and `(b, a)` as the same invariant.
    pub fn is_symmetric(self) -> bool {
        self.is_concurrency()
    }

    pub fn is_concurrency(self) -> bool {
        matches!(
            self,
            InvariantKind::AlwaysConcurrentWith | InvariantKind::NeverConcurrentWith
        )
    }

    /// Concurrency kinds describe independence, which no LTL formula over a
    /// single linearized trace can state.
    pub fn has_ltl_encoding(self) -> bool {
        !self.is_concurrency()
    }

    /// Kinds whose violations are settled by a finite prefix. A check may stop
    /// at the first violating prefix instead of waiting for TERMINAL.
    ///
    /// AP and AFby counterexamples are whole traces.
    pub fn violated_by_prefix(self) -> bool {
        matches!(
            self,
            InvariantKind::NeverFollowedBy
                | InvariantKind::NeverImmediatelyFollowedBy
                | InvariantKind::AlwaysConcurrentWith
                | InvariantKind::NeverConcurrentWith
        )
    }
}

/// An immutable `(kind, first, second, relation)` value.
///
/// Equality and hashing ignore endpoint order for symmetric kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryInvariant {
    kind: InvariantKind,
    first: EventType,
    second: EventType,
    relation: String,
}

impl BinaryInvariant {
    pub fn new(
        kind: InvariantKind,
        first: impl Into<EventType>,
        second: impl Into<EventType>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            first: first.into(),
            second: second.into(),
            relation: relation.into(),
        }
    }

    pub fn always_followed_by(
        a: impl Into<EventType>,
        b: impl Into<EventType>,
        relation: impl Into<String>,
    ) -> Self {
        Self::new(InvariantKind::AlwaysFollowedBy, a, b, relation)
    }

    pub fn never_followed_by(
        a: impl Into<EventType>,
        b: impl Into<EventType>,
        relation: impl Into<String>,
    ) -> Self {
        Self::new(InvariantKind::NeverFollowedBy, a, b, relation)
    }

    pub fn always_precedes(
        a: impl Into<EventType>,
        b: impl Into<EventType>,
        relation: impl Into<String>,
    ) -> Self {
        Self::new(InvariantKind::AlwaysPrecedes, a, b, relation)
    }

    pub fn never_immediately_followed_by(
        a: impl Into<EventType>,
        b: impl Into<EventType>,
        relation: impl Into<String>,
    ) -> Self {
        Self::new(InvariantKind::NeverImmediatelyFollowedBy, a, b, relation)
    }

    pub fn always_concurrent_with(
        a: impl Into<EventType>,
        b: impl Into<EventType>,
        relation: impl Into<String>,
    ) -> Self {
        Self::new(InvariantKind::AlwaysConcurrentWith, a, b, relation)
    }

    pub fn never_concurrent_with(
        a: impl Into<EventType>,
        b: impl Into<EventType>,
        relation: impl Into<String>,
    ) -> Self {
        Self::new(InvariantKind::NeverConcurrentWith, a, b, relation)
    }

    pub fn kind(&self) -> InvariantKind {
        self.kind
    }

    pub fn first(&self) -> &EventType {
        &self.first
    }

    pub fn second(&self) -> &EventType {
        &self.second
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn short_name(&self) -> &'static str {
        self.kind.short_name()
    }

    pub fn long_name(&self) -> &'static str {
        self.kind.long_name()
    }

    /// The LTL formula this invariant asserts, over `did(x)` atoms.
    ///
    /// Concurrency invariants have no encoding and yield
    /// [`InvariantError::UnsupportedEncoding`].
    pub fn ltl_string(&self) -> InvariantResult<String> {
        self.ltl_over(&did(&self.first), &did(&self.second))
    }

    /// The same formula with `a` and `b` standing for the two endpoints.
    ///
    /// Checkers pass generated atom names here so that labels never reach
    /// the formula parser.
    pub fn ltl_over(&self, a: &str, b: &str) -> InvariantResult<String> {
        match self.kind {
            InvariantKind::AlwaysFollowedBy => Ok(format!("[]({a} -> <>({b}))")),
            InvariantKind::NeverFollowedBy => Ok(format!("[]({a} -> X([](!{b})))")),
            InvariantKind::AlwaysPrecedes => Ok(format!("(<>({b})) -> ((!{b}) U {a})")),
            InvariantKind::NeverImmediatelyFollowedBy => Ok(format!("[]({a} -> X(!{b}))")),
            InvariantKind::AlwaysConcurrentWith | InvariantKind::NeverConcurrentWith => {
                Err(InvariantError::UnsupportedEncoding {
                    invariant: self.to_string(),
                    encoding: "LTL",
                })
            }
        }
    }
}

fn did(etype: &EventType) -> String {
    format!("did({})", etype)
}

fn endpoint_hash(etype: &EventType) -> u64 {
    let mut hasher = DefaultHasher::new();
    etype.hash(&mut hasher);
    hasher.finish()
}

impl PartialEq for BinaryInvariant {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind || self.relation != other.relation {
            return false;
        }
        let same = self.first == other.first && self.second == other.second;
        let swapped = self.first == other.second && self.second == other.first;
        same || (self.kind.is_symmetric() && swapped)
    }
}

impl Eq for BinaryInvariant {}

impl Hash for BinaryInvariant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        if self.kind.is_symmetric() {
            endpoint_hash(&self.first)
                .wrapping_add(endpoint_hash(&self.second))
                .hash(state);
        } else {
            self.first.hash(state);
            self.second.hash(state);
        }
        self.relation.hash(state);
    }
}

impl fmt::Display for BinaryInvariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}({}) {}",
            self.first,
            self.kind.long_name(),
            self.relation,
            self.second
        )
    }
}
