//! Invariant-level errors.

use thiserror::Error;

/// Errors raised by invariant encodings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("{invariant} has no {encoding} encoding")]
    UnsupportedEncoding {
        invariant: String,
        encoding: &'static str,
    },
}

pub type InvariantResult<T> = Result<T, InvariantError>;
