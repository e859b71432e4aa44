//! Deterministic property automata, one per ordering invariant kind.

use serde::{Deserialize, Serialize};
use trail_invariants::{BinaryInvariant, InvariantError, InvariantKind, InvariantResult};
use trail_model::EventType;

/// Union of the states used by the property automata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FsmState {
    /// AFby: no pending `a`. NIFby: last letter was not `a`.
    Idle,
    /// AFby: an `a` is still waiting for its `b`.
    AwaitingB,
    /// NFby: no `a` seen yet.
    BeforeA,
    /// NFby: some `a` seen. NIFby: last letter was `a`.
    AfterA,
    /// AP: neither `a` nor `b` seen yet.
    Waiting,
    /// AP: `a` came first.
    Satisfied,
    Violated,
}

/// Automaton recognizing the words that violate one invariant.
#[derive(Debug, Clone)]
pub struct PropertyFsm {
    kind: InvariantKind,
    a: EventType,
    b: EventType,
}

impl PropertyFsm {
    /// Concurrency invariants are not properties of one word; see
    /// [`crate::ConcurrencyMonitor`].
    pub fn new(inv: &BinaryInvariant) -> InvariantResult<Self> {
        if inv.kind().is_concurrency() {
            return Err(InvariantError::UnsupportedEncoding {
                invariant: inv.to_string(),
                encoding: "word automaton",
            });
        }
        Ok(Self {
            kind: inv.kind(),
            a: inv.first().clone(),
            b: inv.second().clone(),
        })
    }

    pub fn initial(&self) -> FsmState {
        match self.kind {
            InvariantKind::NeverFollowedBy => FsmState::BeforeA,
            InvariantKind::AlwaysPrecedes => FsmState::Waiting,
            _ => FsmState::Idle,
        }
    }

    /// Consume one letter.
    pub fn step(&self, state: FsmState, letter: &EventType) -> FsmState {
        let is_a = letter == &self.a;
        let is_b = letter == &self.b;
        match (self.kind, state) {
            (_, FsmState::Violated) => FsmState::Violated,

            (InvariantKind::AlwaysFollowedBy, _) if is_b => FsmState::Idle,
            (InvariantKind::AlwaysFollowedBy, _) if is_a => FsmState::AwaitingB,

            (InvariantKind::NeverFollowedBy, FsmState::AfterA) if is_b => FsmState::Violated,
            (InvariantKind::NeverFollowedBy, _) if is_a => FsmState::AfterA,

            (InvariantKind::AlwaysPrecedes, FsmState::Waiting) if is_a => FsmState::Satisfied,
            (InvariantKind::AlwaysPrecedes, FsmState::Waiting) if is_b => FsmState::Violated,

            (InvariantKind::NeverImmediatelyFollowedBy, FsmState::AfterA) if is_b => {
                FsmState::Violated
            }
            (InvariantKind::NeverImmediatelyFollowedBy, _) if is_a => FsmState::AfterA,
            (InvariantKind::NeverImmediatelyFollowedBy, _) => FsmState::Idle,

            _ => state,
        }
    }

    /// Whether a word ending in `state` violates the invariant.
    pub fn is_violating(&self, state: FsmState) -> bool {
        matches!(state, FsmState::AwaitingB | FsmState::Violated)
    }

    /// Run a whole word from the initial state.
    pub fn run<'a, I>(&self, letters: I) -> FsmState
    where
        I: IntoIterator<Item = &'a EventType>,
    {
        letters
            .into_iter()
            .fold(self.initial(), |q, letter| self.step(q, letter))
    }
}
