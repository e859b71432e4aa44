use crate::parser::ParseError;
use thiserror::Error;
use trail_invariants::InvariantError;

/// Errors from the LTL backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LtlError {
    #[error("failed to parse LTL formula: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Unsupported(#[from] InvariantError),
}

pub type LtlResult<T> = Result<T, LtlError>;
