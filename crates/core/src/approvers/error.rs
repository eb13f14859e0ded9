//! Approver resolution errors.

use backoffice_shared::{AppError, ErrorKind};
use thiserror::Error;

/// Errors raised while resolving approver candidates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApproverError {
    /// Division was blank.
    #[error("A division is required")]
    InvalidDivision,

    /// Kind is not a known expenditure kind.
    #[error("Unknown expenditure kind {0:?}")]
    InvalidKind(String),

    /// Amount was not a non-negative number.
    #[error("Amount must be a valid number")]
    InvalidAmount,

    /// No approval thresholds are configured.
    #[error("Purchase order approval thresholds are not configured")]
    ThresholdsMissing,
}

impl ApproverError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDivision => "invalid_division",
            Self::InvalidKind(_) => "invalid_kind",
            Self::InvalidAmount => "invalid_amount",
            Self::ThresholdsMissing => "thresholds_missing",
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            Self::ThresholdsMissing => ErrorKind::Downstream,
            _ => ErrorKind::InputValidation,
        }
    }
}

impl From<ApproverError> for AppError {
    fn from(err: ApproverError) -> Self {
        Self::new(err.kind(), err.error_code(), err.to_string())
    }
}
