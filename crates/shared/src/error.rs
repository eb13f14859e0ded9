//! Application-wide error types.
//!
//! Every failure that reaches a client is a `{code, message}` pair plus the
//! HTTP status implied by its [`ErrorKind`]. Domain crates define their own
//! `thiserror` enums and convert into [`AppError`] at the boundary.

use std::fmt;

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Error taxonomy shared by every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Target record missing.
    NotFound,
    /// The record is in a state that forbids the operation.
    StatePrecondition,
    /// Caller lacks the required claim, scope or feature gate.
    Authorization,
    /// No usable caller identity was presented.
    Unauthenticated,
    /// Missing or malformed request input.
    InputValidation,
    /// Policy requires a collaborator that is not currently available.
    Assignability,
    /// A competing record already occupies the slot.
    Conflict,
    /// An allocator ran out of identifiers.
    ResourceExhaustion,
    /// Wrapped store or infrastructure error.
    Downstream,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::StatePrecondition | Self::InputValidation | Self::Assignability => 400,
            Self::Authorization => 403,
            Self::Unauthenticated => 401,
            Self::Conflict => 409,
            Self::ResourceExhaustion | Self::Downstream => 500,
        }
    }

    /// Returns a lowercase label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::StatePrecondition => "state_precondition",
            Self::Authorization => "authorization",
            Self::Unauthenticated => "unauthenticated",
            Self::InputValidation => "input_validation",
            Self::Assignability => "assignability",
            Self::Conflict => "conflict",
            Self::ResourceExhaustion => "resource_exhaustion",
            Self::Downstream => "downstream",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client-facing error: stable machine code, English message, and kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct AppError {
    kind: ErrorKind,
    code: &'static str,
    message: String,
}

impl AppError {
    /// Creates an error of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Not-found error (404).
    #[must_use]
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, code, message)
    }

    /// Authorization error (403).
    #[must_use]
    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, code, message)
    }

    /// Missing or invalid caller identity (401).
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, "unauthenticated", message)
    }

    /// Input-validation error (400).
    #[must_use]
    pub fn invalid_input(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputValidation, code, message)
    }

    /// Wraps a store or infrastructure failure (500).
    #[must_use]
    pub fn downstream(code: &'static str, source: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Downstream, code, source.to_string())
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Returns the stable machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        self.code
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True for errors the operator should look at (5xx).
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::NotFound, 404)]
    #[case(ErrorKind::StatePrecondition, 400)]
    #[case(ErrorKind::Authorization, 403)]
    #[case(ErrorKind::Unauthenticated, 401)]
    #[case(ErrorKind::InputValidation, 400)]
    #[case(ErrorKind::Assignability, 400)]
    #[case(ErrorKind::Conflict, 409)]
    #[case(ErrorKind::ResourceExhaustion, 500)]
    #[case(ErrorKind::Downstream, 500)]
    fn test_kind_status_codes(#[case] kind: ErrorKind, #[case] status: u16) {
        assert_eq!(kind.status_code(), status);
        assert_eq!(AppError::new(kind, "x", "y").status_code(), status);
    }

    #[test]
    fn test_constructors_pick_kind() {
        assert_eq!(AppError::not_found("po_not_found", "m").kind(), ErrorKind::NotFound);
        assert_eq!(
            AppError::forbidden("unauthorized_approval", "m").kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            AppError::invalid_input("invalid_amount", "m").kind(),
            ErrorKind::InputValidation
        );
        assert_eq!(AppError::unauthenticated("m").error_code(), "unauthenticated");
    }

    #[test]
    fn test_downstream_keeps_source_text() {
        let err = AppError::downstream("error_saving_record", "connection reset");
        assert_eq!(err.error_code(), "error_saving_record");
        assert_eq!(err.message(), "connection reset");
        assert!(err.is_server_error());
    }

    #[test]
    fn test_error_display() {
        let err = AppError::invalid_input("invalid_rejection_reason", "too short");
        assert_eq!(err.to_string(), "invalid_rejection_reason: too short");
    }
}
