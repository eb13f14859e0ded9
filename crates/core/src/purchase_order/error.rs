//! Purchase order lifecycle errors.
//!
//! Each variant fixes its code and HTTP status where it is defined, so the
//! handler only has to render it.

use backoffice_shared::{AppError, ErrorKind};
use thiserror::Error;

/// Errors that can occur during purchase order lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseOrderError {
    /// No purchase order with the requested id.
    #[error("Purchase order not found")]
    NotFound,

    /// Operation requires an Unapproved purchase order.
    #[error("Only unapproved purchase orders can be approved or rejected")]
    NotUnapproved,

    /// Purchase order carries a rejection.
    #[error("This purchase order has been rejected")]
    Rejected,

    /// Operation requires an Active purchase order.
    #[error("Only active purchase orders can be changed this way")]
    NotActive,

    /// Caller may not approve.
    #[error("You are not authorized to approve this purchase order")]
    UnauthorizedApproval,

    /// Caller may not reject.
    #[error("You are not authorized to reject this purchase order")]
    UnauthorizedRejection,

    /// Caller may not cancel.
    #[error("You are not authorized to cancel this purchase order")]
    UnauthorizedCancellation,

    /// Caller may not close.
    #[error("You are not authorized to close this purchase order")]
    UnauthorizedClosure,

    /// Caller may not convert.
    #[error("You are not authorized to convert this purchase order")]
    UnauthorizedConversion,

    /// Job editing is switched off.
    #[error("Job editing is currently disabled")]
    JobsEditingDisabled,

    /// A second approval will be needed but nobody could give it.
    #[error("This purchase order requires a second approval but no second approver is available")]
    SecondApprovalUnassignable,

    /// Request body missing or not the expected shape.
    #[error("The request body is missing or malformed")]
    InvalidRequestBody,

    /// Rejection reason shorter than five characters after trimming.
    #[error("A rejection reason of at least 5 characters is required")]
    InvalidRejectionReason,

    /// Expenses reference the purchase order.
    #[error("Purchase orders with expenses cannot be cancelled")]
    HasExpenses,

    /// Manual close of a One-Time purchase order.
    #[error("One-Time purchase orders may be cancelled but not manually closed")]
    InvalidPoType,

    /// Recurring purchase order has no committed expenses.
    #[error("Recurring purchase orders require at least one committed expense before closing")]
    NoExpenses,

    /// Conversion of a purchase order that is not One-Time.
    #[error("Only One-Time purchase orders can be converted to Cumulative")]
    NotOneTime,

    /// Recurring schedule fields are unusable.
    #[error("Invalid recurring schedule: {0}")]
    InvalidSchedule(String),

    /// Wrapped store error.
    #[error("{message}")]
    Database {
        /// Operation-specific code.
        code: &'static str,
        /// Store message.
        message: String,
    },
}

impl PurchaseOrderError {
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
            Self::NotFound => ErrorKind::NotFound,
            Self::NotUnapproved
            | Self::Rejected
            | Self::NotActive
            | Self::HasExpenses
            | Self::InvalidPoType
            | Self::NoExpenses
            | Self::NotOneTime => ErrorKind::StatePrecondition,
            Self::UnauthorizedApproval
            | Self::UnauthorizedRejection
            | Self::UnauthorizedCancellation
            | Self::UnauthorizedClosure
            | Self::UnauthorizedConversion
            | Self::JobsEditingDisabled => ErrorKind::Authorization,
            Self::InvalidRequestBody | Self::InvalidRejectionReason | Self::InvalidSchedule(_) => {
                ErrorKind::InputValidation
            }
            Self::SecondApprovalUnassignable => ErrorKind::Assignability,
            Self::Database { .. } => ErrorKind::Downstream,
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
            Self::NotFound => "po_not_found",
            Self::NotUnapproved => "po_not_unapproved",
            Self::Rejected => "po_rejected",
            Self::NotActive => "po_not_active",
            Self::UnauthorizedApproval => "unauthorized_approval",
            Self::UnauthorizedRejection => "unauthorized_rejection",
            Self::UnauthorizedCancellation => "unauthorized_cancellation",
            Self::UnauthorizedClosure => "unauthorized_closure",
            Self::UnauthorizedConversion => "unauthorized_conversion",
            Self::JobsEditingDisabled => "jobs_editing_disabled",
            Self::SecondApprovalUnassignable => "second_approval_unassignable",
            Self::InvalidRequestBody => "invalid_request_body",
            Self::InvalidRejectionReason => "invalid_rejection_reason",
            Self::HasExpenses => "po_has_expenses",
            Self::InvalidPoType => "invalid_po_type",
            Self::NoExpenses => "no_expenses",
            Self::NotOneTime => "po_not_one_time",
            Self::InvalidSchedule(_) => "invalid_recurring_schedule",
            Self::Database { code, .. } => code,
        }
    }
}

impl From<PurchaseOrderError> for AppError {
    fn from(err: PurchaseOrderError) -> Self {
        Self::new(err.kind(), err.error_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PurchaseOrderError::NotFound, "po_not_found", 404)]
    #[case(PurchaseOrderError::NotUnapproved, "po_not_unapproved", 400)]
    #[case(PurchaseOrderError::Rejected, "po_rejected", 400)]
    #[case(PurchaseOrderError::UnauthorizedApproval, "unauthorized_approval", 403)]
    #[case(PurchaseOrderError::SecondApprovalUnassignable, "second_approval_unassignable", 400)]
    #[case(PurchaseOrderError::InvalidRequestBody, "invalid_request_body", 400)]
    #[case(PurchaseOrderError::InvalidRejectionReason, "invalid_rejection_reason", 400)]
    #[case(PurchaseOrderError::UnauthorizedRejection, "unauthorized_rejection", 403)]
    #[case(PurchaseOrderError::UnauthorizedCancellation, "unauthorized_cancellation", 403)]
    #[case(PurchaseOrderError::NotActive, "po_not_active", 400)]
    #[case(PurchaseOrderError::HasExpenses, "po_has_expenses", 400)]
    #[case(PurchaseOrderError::JobsEditingDisabled, "jobs_editing_disabled", 403)]
    #[case(PurchaseOrderError::UnauthorizedClosure, "unauthorized_closure", 403)]
    #[case(PurchaseOrderError::InvalidPoType, "invalid_po_type", 400)]
    #[case(PurchaseOrderError::NoExpenses, "no_expenses", 400)]
    #[case(PurchaseOrderError::UnauthorizedConversion, "unauthorized_conversion", 403)]
    #[case(PurchaseOrderError::NotOneTime, "po_not_one_time", 400)]
    fn test_codes_and_status(
        #[case] err: PurchaseOrderError,
        #[case] code: &str,
        #[case] status: u16,
    ) {
        assert_eq!(err.error_code(), code);
        assert_eq!(err.status_code(), status);
    }

    #[test]
    fn test_invalid_po_type_message() {
        assert_eq!(
            PurchaseOrderError::InvalidPoType.to_string(),
            "One-Time purchase orders may be cancelled but not manually closed"
        );
    }

    #[test]
    fn test_database_error_keeps_code() {
        let err = PurchaseOrderError::database("error_fetching_expenses", "timeout");
        assert_eq!(err.error_code(), "error_fetching_expenses");
        assert_eq!(err.status_code(), 500);
        let app: AppError = err.into();
        assert_eq!(app.message(), "timeout");
    }
}
