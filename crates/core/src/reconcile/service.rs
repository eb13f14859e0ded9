//! Expense commit and the purchase order reconciliation it triggers.

use backoffice_shared::types::{ExpenseId, PurchaseOrderId, UserId};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;

use crate::purchase_order::{PoSnapshot, PoStatus, PoType, RecurringSchedule};
use crate::reconcile::error::ReconcileError;
use crate::reconcile::excess::ExcessPolicy;

/// Payment type of mileage expenses.
pub const MILEAGE_PAYMENT_TYPE: &str = "Mileage";

/// The commit-relevant state of an expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseSnapshot {
    /// Record id.
    pub id: ExpenseId,
    /// Owner.
    pub uid: UserId,
    /// Expense date.
    pub date: NaiveDate,
    /// Payment type, e.g. `Mileage`.
    pub payment_type: String,
    /// Amount.
    pub total: Decimal,
    /// Kilometres for mileage expenses.
    pub distance: Option<Decimal>,
    /// Purchase order charged, if any.
    pub purchase_order: Option<PurchaseOrderId>,
    /// Submitted by its owner.
    pub submitted: bool,
    /// Approval time.
    pub approved: Option<DateTime<Utc>>,
    /// Rejection time.
    pub rejected: Option<DateTime<Utc>>,
    /// Commit time.
    pub committed: Option<DateTime<Utc>>,
}

impl ExpenseSnapshot {
    /// True for mileage expenses.
    #[must_use]
    pub fn is_mileage(&self) -> bool {
        self.payment_type == MILEAGE_PAYMENT_TYPE
    }
}

/// Fields written on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStamp {
    /// The committing user.
    pub committer: UserId,
    /// Commit time.
    pub committed: DateTime<Utc>,
    /// Saturday on or after the commit date.
    pub committed_week_ending: NaiveDate,
}

/// Stateless expense commit checks.
pub struct ExpenseCommit;

impl ExpenseCommit {
    /// Checks commit preconditions in order.
    ///
    /// # Errors
    /// `UnauthorizedCommit`, `ExpensesEditingDisabled`, `NotSubmitted`,
    /// `NotApproved`, `Rejected` or `AlreadyCommitted`.
    pub fn validate(
        expense: &ExpenseSnapshot,
        has_commit_claim: bool,
        expenses_editing_enabled: bool,
    ) -> Result<(), ReconcileError> {
        if !has_commit_claim {
            return Err(ReconcileError::UnauthorizedCommit);
        }
        if !expenses_editing_enabled {
            return Err(ReconcileError::ExpensesEditingDisabled);
        }
        if !expense.submitted {
            return Err(ReconcileError::NotSubmitted);
        }
        if expense.approved.is_none() {
            return Err(ReconcileError::NotApproved);
        }
        if expense.rejected.is_some() {
            return Err(ReconcileError::Rejected);
        }
        if expense.committed.is_some() {
            return Err(ReconcileError::AlreadyCommitted);
        }
        Ok(())
    }

    /// Commit fields for `caller` at `now`; `today` is the business-zone date.
    #[must_use]
    pub fn stamp(caller: &UserId, now: DateTime<Utc>, today: NaiveDate) -> CommitStamp {
        CommitStamp {
            committer: caller.clone(),
            committed: now,
            committed_week_ending: week_ending(today),
        }
    }
}

/// The Saturday on or after `date`.
#[must_use]
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let ahead = (Weekday::Sat.num_days_from_monday() + 7 - date.weekday().num_days_from_monday()) % 7;
    date + Duration::days(i64::from(ahead))
}

/// Committed expenses already charged to a purchase order, excluding the one
/// being committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommittedExpenses {
    /// How many.
    pub count: u64,
    /// Their sum.
    pub total: Decimal,
}

/// What the reconciler decided for the purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Leave the purchase order as it is.
    Unchanged,
    /// Close it on behalf of the system.
    Close,
}

/// Stateless expense to purchase order reconciler.
pub struct PoReconciler;

impl PoReconciler {
    /// Decides what committing an expense of `pending_total` does to `po`.
    ///
    /// # Errors
    /// * `PurchaseOrderNotActive` if the PO is not Active
    /// * `ExceededPurchaseOrderTotal` when a Cumulative PO would pass its limit
    /// * `InvalidSchedule` when a Recurring PO has an unusable schedule
    pub fn reconcile(
        po: &PoSnapshot,
        pending_total: Decimal,
        committed: CommittedExpenses,
        policy: &ExcessPolicy,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if po.status != PoStatus::Active {
            return Err(ReconcileError::PurchaseOrderNotActive);
        }

        match po.po_type {
            PoType::OneTime => Ok(ReconcileOutcome::Close),
            PoType::Recurring => {
                let schedule = RecurringSchedule::from_snapshot(po)?;
                if schedule.is_exhausted(committed.count)? {
                    Ok(ReconcileOutcome::Close)
                } else {
                    Ok(ReconcileOutcome::Unchanged)
                }
            }
            PoType::Cumulative => {
                let limit = policy.limit(po.total);
                let running = committed.total + pending_total;
                if running > limit.total_limit {
                    Err(ReconcileError::ExceededPurchaseOrderTotal {
                        excess: limit.excess_text,
                    })
                } else if running >= po.total {
                    Ok(ReconcileOutcome::Close)
                } else {
                    Ok(ReconcileOutcome::Unchanged)
                }
            }
        }
    }
}
