//! Happens-before monitor for the concurrency invariants.
//!
//! Along a path, two events are ordered when a chain of steps leads from one
//! to the other. A step is either program order inside one process or a hop
//! that carries the invariant's relation. Events of a totally ordered log all
//! belong to one process.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use trail_invariants::{BinaryInvariant, InvariantKind};
use trail_model::EventType;

/// The process an event runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Process {
    Log,
    Pid(u32),
}

impl Process {
    /// Sentinels belong to no process.
    pub fn of(etype: &EventType) -> Option<Process> {
        match etype {
            EventType::Initial | EventType::Terminal => None,
            EventType::Plain(_) => Some(Process::Log),
            EventType::Distributed { pid, .. } => Some(Process::Pid(*pid)),
        }
    }
}

/// Processes whose latest event is ordered after a tracked event. Sorted.
pub type Reach = SmallVec<[Process; 4]>;

fn contains(reach: &Reach, p: Process) -> bool {
    reach.binary_search(&p).is_ok()
}

fn extend(reach: &mut Reach, p: Process) {
    if let Err(at) = reach.binary_search(&p) {
        reach.insert(at, p);
    }
}

/// Monitor state: the reach of the tracked `a` and `b`, if any was seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConcurrencyState {
    a: Option<Reach>,
    b: Option<Reach>,
    violated: bool,
}

impl ConcurrencyState {
    pub fn is_violated(&self) -> bool {
        self.violated
    }
}

/// Monitor for NeverConcurrentWith and AlwaysConcurrentWith.
///
/// Instances of one type share a process, so NCwith only needs the latest
/// `a` and `b` and ACwith only the first ones.
#[derive(Debug, Clone)]
pub struct ConcurrencyMonitor {
    never: bool,
    a: EventType,
    b: EventType,
}

impl ConcurrencyMonitor {
    /// `None` for the ordering kinds.
    pub fn new(inv: &BinaryInvariant) -> Option<Self> {
        let never = match inv.kind() {
            InvariantKind::NeverConcurrentWith => true,
            InvariantKind::AlwaysConcurrentWith => false,
            _ => return None,
        };
        Some(Self {
            never,
            a: inv.first().clone(),
            b: inv.second().clone(),
        })
    }

    pub fn initial(&self) -> ConcurrencyState {
        ConcurrencyState::default()
    }

    /// Follow one hop from `source` to `target`; `linked` tells whether the
    /// hop carries the invariant's relation.
    pub fn step(
        &self,
        state: &ConcurrencyState,
        linked: bool,
        source: &EventType,
        target: &EventType,
    ) -> ConcurrencyState {
        let mut next = state.clone();
        let Some(dst) = Process::of(target) else {
            return next;
        };
        if next.violated {
            return next;
        }
        let src = Process::of(source);
        for reach in [next.a.as_mut(), next.b.as_mut()].into_iter().flatten() {
            if linked && src.is_some_and(|p| contains(reach, p)) {
                extend(reach, dst);
            }
        }

        let is_a = target == &self.a;
        let is_b = target == &self.b;
        // Ordered after the tracked instance of the other endpoint?
        let after = |reach: &Option<Reach>| reach.as_ref().map(|r| contains(r, dst));
        let clash = |other: Option<bool>| match other {
            Some(ordered) => ordered != self.never,
            None => false,
        };
        if (is_b && clash(after(&next.a))) || (is_a && clash(after(&next.b))) {
            next.violated = true;
            return next;
        }

        let fresh: Reach = smallvec![dst];
        if is_a && (self.never || next.a.is_none()) {
            next.a = Some(fresh.clone());
        }
        if is_b && (self.never || next.b.is_none()) {
            next.b = Some(fresh);
        }
        next
    }

    /// Run a whole trace given as `(linked, event)` hops from INITIAL.
    pub fn run<'a, I>(&self, hops: I) -> ConcurrencyState
    where
        I: IntoIterator<Item = (bool, &'a EventType)>,
    {
        let mut previous = &EventType::Initial;
        let mut state = self.initial();
        for (linked, etype) in hops {
            state = self.step(&state, linked, previous, etype);
            previous = etype;
        }
        state
    }
}
