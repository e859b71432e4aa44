//! The binary temporal invariant catalog.
//!
//! Each [`BinaryInvariant`] relates two event types over one relation, knows
//! its LTL encoding and knows how to cut a violating path down to the part
//! that matters.

pub mod error;
pub mod invariant;
pub mod path;
pub mod set;
mod shorten;

pub use error::{InvariantError, InvariantResult};
pub use invariant::{BinaryInvariant, InvariantKind};
pub use path::CExamplePath;
pub use set::TemporalInvariantSet;
