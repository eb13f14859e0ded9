//! Expense commit and reconciliation errors.

use backoffice_shared::{AppError, ErrorKind};
use thiserror::Error;

use crate::purchase_order::PurchaseOrderError;

/// Errors raised while committing an expense and reconciling its PO.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Expense does not exist.
    #[error("Expense not found")]
    RecordNotFound,

    /// Caller lacks the `commit` claim.
    #[error("You are not authorized to commit this record")]
    UnauthorizedCommit,

    /// Expense editing is switched off.
    #[error("Expense editing is currently disabled")]
    ExpensesEditingDisabled,

    /// Expense has not been submitted.
    #[error("This record is not submitted")]
    NotSubmitted,

    /// Expense has not been approved.
    #[error("This record is not approved")]
    NotApproved,

    /// Expense carries a rejection.
    #[error("Rejected records cannot be committed")]
    Rejected,

    /// Expense was committed before.
    #[error("This record is already committed")]
    AlreadyCommitted,

    /// Referenced purchase order does not exist.
    #[error("Purchase order referenced by expense not found")]
    PurchaseOrderNotFound,

    /// Referenced purchase order is not Active.
    #[error("Purchase order is not active")]
    PurchaseOrderNotActive,

    /// Cumulative total would pass the allowed excess.
    #[error(
        "The committed expenses total exceeds the total value of the purchase order beyond the allowed surplus of {excess}"
    )]
    ExceededPurchaseOrderTotal {
        /// Human-readable allowance, e.g. `5.00%` or `$100.00`.
        excess: String,
    },

    /// Recurring schedule of the purchase order is unusable.
    #[error("Invalid recurring schedule: {0}")]
    InvalidSchedule(String),

    /// Mileage distance is not a whole number.
    #[error("Distance must be a whole number of kilometres for mileage expenses")]
    InvalidMileageDistance,

    /// No expense rate is effective on the expense date.
    #[error("No expense rate found for the expense date")]
    ExpenseRateMissing,

    /// Expense rate mileage bands are unusable.
    #[error("Invalid mileage rates: {0}")]
    InvalidMileageRates(String),

    /// Wrapped store error.
    #[error("{message}")]
    Database {
        /// Operation-specific code.
        code: &'static str,
        /// Store message.
        message: String,
    },
}

impl ReconcileError {
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
            Self::RecordNotFound => ErrorKind::NotFound,
            Self::UnauthorizedCommit | Self::ExpensesEditingDisabled => ErrorKind::Authorization,
            Self::NotSubmitted
            | Self::NotApproved
            | Self::Rejected
            | Self::AlreadyCommitted
            | Self::PurchaseOrderNotFound
            | Self::PurchaseOrderNotActive
            | Self::ExceededPurchaseOrderTotal { .. } => ErrorKind::StatePrecondition,
            Self::InvalidSchedule(_) | Self::InvalidMileageDistance => ErrorKind::InputValidation,
            Self::ExpenseRateMissing | Self::InvalidMileageRates(_) | Self::Database { .. } => {
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
            Self::RecordNotFound => "record_not_found",
            Self::UnauthorizedCommit => "unauthorized_commit",
            Self::ExpensesEditingDisabled => "expenses_editing_disabled",
            Self::NotSubmitted => "record_not_submitted",
            Self::NotApproved => "record_not_approved",
            Self::Rejected => "record_rejected",
            Self::AlreadyCommitted => "record_already_committed",
            Self::PurchaseOrderNotFound => "purchase_order_not_found",
            Self::PurchaseOrderNotActive => "purchase_order_not_active",
            Self::ExceededPurchaseOrderTotal { .. } => "exceeded_purchase_order_total",
            Self::InvalidSchedule(_) => "invalid_recurring_schedule",
            Self::InvalidMileageDistance => "invalid_mileage_distance",
            Self::ExpenseRateMissing => "error_fetching_expense_rate",
            Self::InvalidMileageRates(_) => "invalid_mileage_rates",
            Self::Database { code, .. } => code,
        }
    }
}

impl From<PurchaseOrderError> for ReconcileError {
    fn from(err: PurchaseOrderError) -> Self {
        match err {
            PurchaseOrderError::InvalidSchedule(msg) => Self::InvalidSchedule(msg),
            PurchaseOrderError::NotActive => Self::PurchaseOrderNotActive,
            PurchaseOrderError::NotFound => Self::PurchaseOrderNotFound,
            other => Self::Database {
                code: other.error_code(),
                message: other.to_string(),
            },
        }
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        Self::new(err.kind(), err.error_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ReconcileError::RecordNotFound, "record_not_found", 404)]
    #[case(ReconcileError::UnauthorizedCommit, "unauthorized_commit", 403)]
    #[case(ReconcileError::NotSubmitted, "record_not_submitted", 400)]
    #[case(ReconcileError::AlreadyCommitted, "record_already_committed", 400)]
    #[case(ReconcileError::PurchaseOrderNotFound, "purchase_order_not_found", 400)]
    #[case(ReconcileError::PurchaseOrderNotActive, "purchase_order_not_active", 400)]
    #[case(ReconcileError::InvalidMileageDistance, "invalid_mileage_distance", 400)]
    #[case(ReconcileError::ExpenseRateMissing, "error_fetching_expense_rate", 500)]
    fn test_codes_and_status(
        #[case] err: ReconcileError,
        #[case] code: &str,
        #[case] status: u16,
    ) {
        assert_eq!(err.error_code(), code);
        assert_eq!(err.status_code(), status);
    }

    #[test]
    fn test_schedule_error_converts() {
        let err: ReconcileError = PurchaseOrderError::InvalidSchedule("bad".into()).into();
        assert_eq!(err, ReconcileError::InvalidSchedule("bad".into()));
    }
}
