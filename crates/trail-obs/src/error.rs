use crate::state::{ObsStateId, Role};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObsError {
    #[error("unknown observed state {0}")]
    UnknownState(ObsStateId),

    #[error("{naming} naming is not available for {role:?} states")]
    InvalidNaming { role: Role, naming: &'static str },
}

pub type ObsResult<T> = Result<T, ObsError>;
