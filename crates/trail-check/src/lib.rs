//! Invariant checking engine.
//!
//! [`verify_with`] answers one invariant with one backend; [`Engine`] runs
//! a whole invariant set under a [`CheckConfig`] and collects a
//! [`CheckReport`].

pub mod config;
pub mod engine;
pub mod error;

pub use config::{Backend, CheckConfig};
pub use engine::{verify_with, CheckEntry, CheckReport, Engine};
pub use error::{CheckError, CheckResult};
