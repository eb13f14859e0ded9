//! Record absorption errors.

use backoffice_shared::{AppError, ErrorKind};
use thiserror::Error;

/// Errors that can occur while absorbing records or undoing an absorb.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbsorbError {
    /// Caller lacks the `absorb` claim.
    #[error("User does not have permission to absorb records")]
    Unauthorized,

    /// Job editing is switched off.
    #[error("Job editing is currently disabled")]
    JobsEditingDisabled,

    /// Request named no source ids.
    #[error("No IDs provided to absorb")]
    EmptyIds,

    /// Target appears among the sources.
    #[error("Cannot absorb a record into itself")]
    SelfAbsorb,

    /// Collection cannot be absorbed.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// Target record does not exist.
    #[error("Failed to find target record")]
    TargetNotFound,

    /// A source record does not exist.
    #[error("Failed to find record to absorb: {0}")]
    SourceNotFound(String),

    /// Source and target have different parents.
    #[error("Cannot absorb records with different {0} values")]
    ParentMismatch(&'static str),

    /// An absorb on this collection has not been undone or cleared.
    #[error("An absorb action already exists for {0}")]
    ActionExists(String),

    /// No absorb to undo.
    #[error("No absorb action found for {0}")]
    ActionNotFound(String),

    /// Stored absorb action cannot be replayed.
    #[error("Stored absorb action is unreadable: {0}")]
    CorruptAction(String),

    /// Wrapped store error.
    #[error("{message}")]
    Database {
        /// Operation-specific code.
        code: &'static str,
        /// Store message.
        message: String,
    },
}

impl AbsorbError {
    /// Wraps a store error under an operation-specific code.
    pub fn database(code: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Database {
            code,
            message: err.to_string(),
        }
    }

    /// Returns the taxonomy kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized | Self::JobsEditingDisabled => ErrorKind::Authorization,
            Self::EmptyIds | Self::SelfAbsorb | Self::ParentMismatch(_) => {
                ErrorKind::InputValidation
            }
            Self::TargetNotFound | Self::SourceNotFound(_) | Self::ActionNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::ActionExists(_) => ErrorKind::Conflict,
            Self::UnknownCollection(_) | Self::CorruptAction(_) | Self::Database { .. } => {
                ErrorKind::Downstream
            }
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized_absorb",
            Self::JobsEditingDisabled => "jobs_editing_disabled",
            Self::EmptyIds => "no_ids_to_absorb",
            Self::SelfAbsorb => "self_absorb",
            Self::UnknownCollection(_) => "unknown_collection",
            Self::TargetNotFound => "target_not_found",
            Self::SourceNotFound(_) => "record_not_found",
            Self::ParentMismatch(_) => "parent_mismatch",
            Self::ActionExists(_) => "absorb_action_exists",
            Self::ActionNotFound(_) => "absorb_action_not_found",
            Self::CorruptAction(_) => "corrupt_absorb_action",
            Self::Database { code, .. } => code,
        }
    }
}

impl From<AbsorbError> for AppError {
    fn from(err: AbsorbError) -> Self {
        Self::new(err.kind(), err.error_code(), err.to_string())
    }
}
