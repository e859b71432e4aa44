//! Interning table for observed states.

use crate::error::{ObsError, ObsResult};
use crate::names::{derived_name, AnonNames, Naming};
use crate::state::{ObsFsmState, ObsStateId, Role, StateKey};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, trace};

/// Owns every observed state of one model construction session.
///
/// Constructing a state whose `(pid, initial, terminal, name)` tuple already
/// exists returns the existing handle. Safe to share across threads.
#[derive(Debug, Default)]
pub struct ObsStateManager {
    states: DashMap<ObsStateId, ObsFsmState>,
    index: DashMap<StateKey, ObsStateId>,
    /// Handles retired by a mark that landed on an interned tuple.
    aliases: DashMap<ObsStateId, ObsStateId>,
    next_id: AtomicU32,
    names: AnonNames,
}

impl ObsStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing name sequence, e.g. one shared with other sessions.
    pub fn with_names(names: AnonNames) -> Self {
        Self {
            names,
            ..Self::default()
        }
    }

    pub fn anon_names(&self) -> &AnonNames {
        &self.names
    }

    pub fn new_initial(&self, pid: u32, naming: Naming) -> ObsResult<ObsStateId> {
        self.intern(pid, Role::Initial, naming)
    }

    pub fn new_terminal(&self, pid: u32, naming: Naming) -> ObsResult<ObsStateId> {
        self.intern(pid, Role::Terminal, naming)
    }

    pub fn new_initial_terminal(&self, pid: u32, naming: Naming) -> ObsResult<ObsStateId> {
        self.intern(pid, Role::InitialTerminal, naming)
    }

    pub fn new_intermediate(&self, pid: u32, naming: Naming) -> ObsResult<ObsStateId> {
        self.intern(pid, Role::Intermediate, naming)
    }

    /// Intern a state with the given role.
    ///
    /// `PerProcess` naming is limited to the initial roles and `Derived`
    /// naming to the non-initial ones.
    pub fn intern(&self, pid: u32, role: Role, naming: Naming) -> ObsResult<ObsStateId> {
        let name = match (&naming, role) {
            (Naming::Anonymous, _) => self.names.next_name(),
            (Naming::Named(name), _) => name.clone(),
            (Naming::PerProcess, Role::Initial | Role::InitialTerminal) => format!("a{}", pid),
            (Naming::Derived { prev, event }, Role::Terminal | Role::Intermediate) => {
                let prev = self.get(*prev).ok_or(ObsError::UnknownState(*prev))?;
                derived_name(prev.stable_hash(), event)
            }
            _ => {
                return Err(ObsError::InvalidNaming {
                    role,
                    naming: naming.kind(),
                })
            }
        };

        let state = ObsFsmState::new(pid, role, name);
        let id = match self.index.entry(state.key()) {
            Entry::Occupied(existing) => {
                trace!(state = %state, "reusing observed state");
                *existing.get()
            }
            Entry::Vacant(slot) => {
                let id = ObsStateId(self.next_id.fetch_add(1, Ordering::Relaxed));
                debug!(pid, state = %state, id = %id, "new observed state");
                self.states.insert(id, state);
                slot.insert(id);
                id
            }
        };
        Ok(id)
    }

    pub fn get(&self, id: ObsStateId) -> Option<ObsFsmState> {
        let id = self.resolve(id);
        self.states.get(&id).map(|s| s.value().clone())
    }

    /// The live handle `id` stands for.
    pub fn resolve(&self, mut id: ObsStateId) -> ObsStateId {
        while let Some(owner) = self.aliases.get(&id).map(|o| *o.value()) {
            id = owner;
        }
        id
    }

    /// Upgrade a state to also be initial.
    ///
    /// Returns the handle that owns the upgraded identity. If that tuple was
    /// already interned, the older handle owns it and `id` becomes an alias.
    pub fn mark_initial(&self, id: ObsStateId) -> ObsResult<ObsStateId> {
        self.mark(id, ObsFsmState::mark_initial)
    }

    /// Upgrade a state to also be terminal. See [`Self::mark_initial`].
    pub fn mark_terminal(&self, id: ObsStateId) -> ObsResult<ObsStateId> {
        self.mark(id, ObsFsmState::mark_terminal)
    }

    fn mark(&self, id: ObsStateId, upgrade: fn(&mut ObsFsmState)) -> ObsResult<ObsStateId> {
        let id = self.resolve(id);
        // The states guard is released before the index is touched; intern
        // locks them in the opposite order.
        let (old_key, new_key) = {
            let mut state = self.states.get_mut(&id).ok_or(ObsError::UnknownState(id))?;
            let old_key = state.value().key();
            upgrade(state.value_mut());
            (old_key, state.value().key())
        };
        if old_key == new_key {
            return Ok(id);
        }
        self.index.remove_if(&old_key, |_, owner| *owner == id);
        let owner = *self.index.entry(new_key).or_insert(id);
        if owner != id {
            self.aliases.insert(id, owner);
            self.states.remove(&id);
        }
        debug!(id = %id, owner = %owner, "re-keyed observed state");
        Ok(owner)
    }

    /// Number of distinct states constructed.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Display names of all states, in handle order.
    pub fn names(&self) -> Vec<String> {
        let mut all: Vec<(ObsStateId, String)> = self
            .states
            .iter()
            .map(|entry| (*entry.key(), entry.value().to_string()))
            .collect();
        all.sort();
        all.into_iter().map(|(_, name)| name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use trail_model::EventType;

    #[test]
    fn test_same_tuple_same_handle() {
        let m = ObsStateManager::new();
        let a = m.new_intermediate(0, Naming::named("s")).unwrap();
        let b = m.new_intermediate(0, Naming::named("s")).unwrap();
        let c = m.new_intermediate(1, Naming::named("s")).unwrap();
        let d = m.new_terminal(0, Naming::named("s")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn test_anonymous_names_count_up_from_a0() {
        let m = ObsStateManager::new();
        let s0 = m.new_initial(0, Naming::Anonymous).unwrap();
        let s1 = m.new_intermediate(0, Naming::Anonymous).unwrap();
        assert_eq!(m.get(s0).unwrap().name(), "a0");
        assert_eq!(m.get(s1).unwrap().name(), "a1");
        assert_eq!(m.names(), vec!["i_a0", "a1"]);
    }

    #[test]
    fn test_injected_sequence_is_shared() {
        let names = AnonNames::new();
        let m1 = ObsStateManager::with_names(names.clone());
        let m2 = ObsStateManager::with_names(names);
        m1.new_intermediate(0, Naming::Anonymous).unwrap();
        let s = m2.new_intermediate(0, Naming::Anonymous).unwrap();
        assert_eq!(m2.get(s).unwrap().name(), "a1");
    }

    #[test]
    fn test_per_process_names() {
        let m = ObsStateManager::new();
        let s = m.new_initial(3, Naming::PerProcess).unwrap();
        assert_eq!(m.get(s).unwrap().to_string(), "i_a3");
        let t = m.new_initial_terminal(3, Naming::PerProcess).unwrap();
        assert_eq!(m.get(t).unwrap().to_string(), "i_a3_t");
        assert_eq!(
            m.new_intermediate(3, Naming::PerProcess),
            Err(ObsError::InvalidNaming {
                role: Role::Intermediate,
                naming: "per-process"
            })
        );
    }

    #[test]
    fn test_derived_names_replay_identically() {
        let event = EventType::distributed("recv", 0);
        let build = || {
            let m = ObsStateManager::new();
            let init = m.new_initial(0, Naming::PerProcess).unwrap();
            let mid = m
                .new_intermediate(0, Naming::Derived { prev: init, event: event.clone() })
                .unwrap();
            let end = m
                .new_terminal(0, Naming::Derived { prev: mid, event: event.clone() })
                .unwrap();
            (m.get(mid).unwrap(), m.get(end).unwrap())
        };
        let (mid1, end1) = build();
        let (mid2, end2) = build();
        assert_eq!(mid1, mid2);
        assert_eq!(end1, end2);

        let init = ObsFsmState::new(0, Role::Initial, "a0".into());
        assert_eq!(mid1.name(), derived_name(init.stable_hash(), &event));
    }

    #[test]
    fn test_derived_from_unknown_state() {
        let m = ObsStateManager::new();
        let missing = ObsStateId(9);
        let err = m
            .new_terminal(0, Naming::Derived { prev: missing, event: "e".into() })
            .unwrap_err();
        assert_eq!(err, ObsError::UnknownState(missing));
    }

    #[test]
    fn test_mark_rekeys_index() {
        let m = ObsStateManager::new();
        let s = m.new_intermediate(0, Naming::named("s")).unwrap();
        assert_eq!(m.mark_terminal(s).unwrap(), s);
        let state = m.get(s).unwrap();
        assert!(state.is_terminal());
        assert_eq!(state.name(), "s");
        assert_eq!(state.pid(), 0);

        // The upgraded tuple now resolves to the same handle.
        assert_eq!(m.new_terminal(0, Naming::named("s")).unwrap(), s);
        // The old tuple is free again.
        let fresh = m.new_intermediate(0, Naming::named("s")).unwrap();
        assert_ne!(fresh, s);
        // Marking twice is a no-op.
        assert_eq!(m.mark_terminal(s).unwrap(), s);
    }

    #[test]
    fn test_mark_onto_existing_tuple_returns_owner() {
        let m = ObsStateManager::new();
        let init = m.new_initial(0, Naming::named("s")).unwrap();
        let mid = m.new_intermediate(0, Naming::named("s")).unwrap();
        assert_eq!(m.mark_initial(mid).unwrap(), init);

        // One identity left, reachable through both handles.
        assert_eq!(m.len(), 1);
        assert_eq!(m.names(), vec!["i_s"]);
        assert_eq!(m.resolve(mid), init);
        assert_eq!(m.get(mid), m.get(init));
        assert_eq!(m.mark_initial(mid).unwrap(), init);
        assert_eq!(m.new_initial(0, Naming::named("s")).unwrap(), init);
    }

    #[test]
    fn test_concurrent_anonymous_construction() {
        let m = Arc::new(ObsStateManager::new());
        std::thread::scope(|s| {
            for pid in 0..4 {
                let m = Arc::clone(&m);
                s.spawn(move || {
                    for _ in 0..250 {
                        m.new_intermediate(pid, Naming::Anonymous).unwrap();
                    }
                });
            }
        });
        assert_eq!(m.len(), 1000);
        let mut names: Vec<String> = m.names();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 1000);
    }
}
