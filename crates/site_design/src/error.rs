//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, infeasible placement requests, inconsistent allocations,
//! inconsistent prior-design records, and cancelled runs.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("infeasible request at placement step {step}: {reason}")]
    Infeasible { step: usize, reason: String },

    #[error("allocation inconsistency: {0}")]
    AllocationInconsistency(String),

    #[error("data inconsistency: {0}")]
    DataInconsistency(String),

    #[error("placement cancelled after {placed} sites")]
    Cancelled { placed: usize },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn infeasible(step: usize, reason: impl Into<String>) -> Self {
        Error::Infeasible {
            step,
            reason: reason.into(),
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
