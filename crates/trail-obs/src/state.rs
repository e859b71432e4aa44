//! Observed per-process automaton states.

use serde::{Deserialize, Serialize};
use std::fmt;
use trail_model::string_hash;

/// Handle of an interned state inside an `ObsStateManager`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObsStateId(pub(crate) u32);

impl ObsStateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObsStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// The role a state plays in its process's traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Initial,
    Terminal,
    InitialTerminal,
    Intermediate,
}

impl Role {
    pub fn flags(self) -> (bool, bool) {
        match self {
            Role::Initial => (true, false),
            Role::Terminal => (false, true),
            Role::InitialTerminal => (true, true),
            Role::Intermediate => (false, false),
        }
    }
}

/// `(pid, initial, terminal, name)`. Only the two role flags may change
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObsFsmState {
    pid: u32,
    initial: bool,
    terminal: bool,
    name: String,
}

impl ObsFsmState {
    pub(crate) fn new(pid: u32, role: Role, name: String) -> Self {
        let (initial, terminal) = role.flags();
        Self {
            pid,
            initial,
            terminal,
            name,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn mark_initial(&mut self) {
        self.initial = true;
    }

    pub(crate) fn mark_terminal(&mut self) {
        self.terminal = true;
    }

    pub(crate) fn key(&self) -> StateKey {
        (self.pid, self.initial, self.terminal, self.name.clone())
    }

    /// Run-independent 32-bit hash over all four fields; feeds derived
    /// names.
    pub fn stable_hash(&self) -> i32 {
        let flag = |b: bool| if b { 1231 } else { 1237 };
        let mut result: i32 = 17;
        result = result.wrapping_mul(31).wrapping_add(flag(self.initial));
        result = result.wrapping_mul(31).wrapping_add(flag(self.terminal));
        result = result.wrapping_mul(31).wrapping_add(self.pid as i32);
        result = result.wrapping_mul(31).wrapping_add(string_hash(&self.name));
        result
    }
}

pub(crate) type StateKey = (u32, bool, bool, String);

impl fmt::Display for ObsFsmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.initial {
            write!(f, "i_")?;
        }
        write!(f, "{}", self.name)?;
        if self.terminal {
            write!(f, "_t")?;
        }
        Ok(())
    }
}
