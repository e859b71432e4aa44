//! Observed-state identities for per-process automata.
//!
//! While a distributed trace is replayed per process, every state the
//! process passes through is interned in an [`ObsStateManager`]. States with
//! no label in the trace get a synthesized name.

pub mod error;
pub mod manager;
pub mod names;
pub mod state;

pub use error::{ObsError, ObsResult};
pub use manager::ObsStateManager;
pub use names::{derived_name, AnonNames, Naming};
pub use state::{ObsFsmState, ObsStateId, Role};
