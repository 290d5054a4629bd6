//! Error taxonomy for the control plane.
//!
//! Mirrors the kinds named in the design: pre-commit errors (`Validation`,
//! `Conflict`, `Dependency`, `Backend`, `NotFound`) abort the mutation and
//! propagate to the caller unchanged; `ExternalSync` never aborts and is
//! only ever observed by the condition manager.

use thiserror::Error;

use crate::model::identifier::Identifier;

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed for {0}: {1}")]
    Validation(Identifier, String),

    #[error("dependency error for {0}: {1}")]
    Dependency(Identifier, String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("conflict for {0}: {1}")]
    Conflict(Identifier, String),

    #[error("external sync failed: {0}")]
    ExternalSync(String),

    #[error("not found: {0}")]
    NotFound(Identifier),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// A short machine-stable reason string, used both in condition messages
    /// and in tracing fields.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::Validation(..) => "ValidationFailed",
            Error::Dependency(..) => "DependencyError",
            Error::Backend(..) => "BackendError",
            Error::Conflict(..) => "Conflict",
            Error::ExternalSync(..) => "SyncFailed",
            Error::NotFound(..) => "NotFound",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
