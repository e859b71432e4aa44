use thiserror::Error;
use trail_invariants::InvariantError;
use trail_ltl::{LtlError, ParseError};

/// Checking error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("{invariant} has no {encoding} encoding")]
    UnsupportedEncoding {
        invariant: String,
        encoding: &'static str,
    },

    #[error("invariant '{invariant}' mentions event type '{etype}', which the graph does not contain")]
    MalformedInvariant { invariant: String, etype: String },

    #[error("backends disagree on '{invariant}': fsm found {fsm}, ltl found {ltl}")]
    BackendDisagreement {
        invariant: String,
        fsm: String,
        ltl: String,
    },

    #[error("LTL formula error: {0}")]
    Formula(#[from] ParseError),
}

pub type CheckResult<T> = Result<T, CheckError>;

impl From<InvariantError> for CheckError {
    fn from(err: InvariantError) -> Self {
        match err {
            InvariantError::UnsupportedEncoding {
                invariant,
                encoding,
            } => CheckError::UnsupportedEncoding {
                invariant,
                encoding,
            },
        }
    }
}

impl From<LtlError> for CheckError {
    fn from(err: LtlError) -> Self {
        match err {
            LtlError::Parse(e) => CheckError::Formula(e),
            LtlError::Unsupported(e) => e.into(),
        }
    }
}
