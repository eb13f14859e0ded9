//! Purchase order state machine.
//!
//! All methods are associated functions that check preconditions in a fixed
//! order and return the [`LifecycleAction`] to persist. Store lookups
//! (claims, candidate pools, expense counts) are done by the caller and
//! passed in as plain values.

use backoffice_shared::types::UserId;
use chrono::{DateTime, Utc};

use crate::approvers::ApprovalThresholds;
use crate::notifications::{NotificationIntent, TemplateCode};
use crate::purchase_order::error::PurchaseOrderError;
use crate::purchase_order::types::{PoSnapshot, PoStatus, PoType};

/// Minimum trimmed length of a rejection reason.
pub const MIN_REJECTION_REASON_LEN: usize = 5;

/// Whether the caller sits in the first and/or second approver pool for a PO.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalAuthority {
    /// Caller is a first-tier candidate.
    pub first_tier: bool,
    /// Caller is a qualified second-tier candidate.
    pub second_tier: bool,
}

impl ApprovalAuthority {
    /// True if the caller is in either pool.
    #[must_use]
    pub fn any(&self) -> bool {
        self.first_tier || self.second_tier
    }
}

/// What an approve call will do, decided before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPlan {
    /// `approval_total > T1`.
    pub requires_second_approval: bool,
    /// Record the first approval.
    pub set_approved: bool,
    /// Record the second approval.
    pub set_second_approval: bool,
    /// Move to Active and assign a PO number.
    pub activate: bool,
    /// A second approver must exist before the first approval is accepted.
    pub needs_second_approver: bool,
}

/// A validated rejection reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionReason(String);

impl RejectionReason {
    /// Validates the `rejection_reason` field of a request body.
    pub fn parse(raw: Option<&str>) -> Result<Self, PurchaseOrderError> {
        let raw = raw.ok_or(PurchaseOrderError::InvalidRequestBody)?;
        let trimmed = raw.trim();
        if trimmed.chars().count() < MIN_REJECTION_REASON_LEN {
            return Err(PurchaseOrderError::InvalidRejectionReason);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The trimmed reason.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// State change to persist, with audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleAction {
    /// First and/or second approval, possibly activating the PO.
    Approve {
        /// Status after the call.
        new_status: PoStatus,
        /// Set as `approver` when the first approval is recorded.
        approver: Option<UserId>,
        /// Set as `second_approver` when the second approval is recorded.
        second_approver: Option<UserId>,
        /// Timestamp for whichever approvals are recorded.
        at: DateTime<Utc>,
        /// A PO number must be allocated in the same transaction.
        assign_number: bool,
    },
    /// Rejection; status stays Unapproved.
    Reject {
        /// The rejecting user.
        rejector: UserId,
        /// Reason shown to the creator.
        reason: String,
        /// When.
        at: DateTime<Utc>,
    },
    /// Cancellation of an unused Active PO.
    Cancel {
        /// Always Cancelled.
        new_status: PoStatus,
        /// The cancelling user.
        canceller: UserId,
        /// When.
        at: DateTime<Utc>,
    },
    /// Closure of an Active PO.
    Close {
        /// Always Closed.
        new_status: PoStatus,
        /// The closing user; `None` when the reconciler closes it.
        closer: Option<UserId>,
        /// When.
        at: DateTime<Utc>,
        /// Closed by the reconciler rather than a person.
        by_system: bool,
    },
    /// One-Time to Cumulative conversion.
    MakeCumulative {
        /// Always Cumulative.
        new_type: PoType,
    },
}

/// Stateless purchase order lifecycle service.
pub struct PurchaseOrderLifecycle;

impl PurchaseOrderLifecycle {
    /// Checks approve preconditions and decides what the call will record.
    ///
    /// # Errors
    /// * `NotUnapproved` if the PO is not Unapproved
    /// * `Rejected` if it carries a rejection
    /// * `UnauthorizedApproval` if the caller cannot act at the current stage
    pub fn plan_approval(
        po: &PoSnapshot,
        authority: ApprovalAuthority,
        thresholds: &ApprovalThresholds,
    ) -> Result<ApprovalPlan, PurchaseOrderError> {
        if po.status != PoStatus::Unapproved {
            return Err(PurchaseOrderError::NotUnapproved);
        }
        if po.rejected.is_some() {
            return Err(PurchaseOrderError::Rejected);
        }

        let requires_second_approval = thresholds.requires_second_approval(po.approval_total);
        let is_approved = po.approved.is_some();

        if !is_approved && !authority.any() {
            return Err(PurchaseOrderError::UnauthorizedApproval);
        }
        if is_approved && requires_second_approval && !authority.second_tier {
            return Err(PurchaseOrderError::UnauthorizedApproval);
        }
        if is_approved && !requires_second_approval && !authority.any() {
            return Err(PurchaseOrderError::UnauthorizedApproval);
        }

        let set_approved = !is_approved;
        let set_second_approval =
            requires_second_approval && authority.second_tier && po.second_approval.is_none();
        let activate =
            !requires_second_approval || set_second_approval || po.second_approval.is_some();
        let needs_second_approver = set_approved
            && requires_second_approval
            && !set_second_approval
            && po.priority_second_approver.is_none();

        Ok(ApprovalPlan {
            requires_second_approval,
            set_approved,
            set_second_approval,
            activate,
            needs_second_approver,
        })
    }

    /// Applies the assignability guard to a plan.
    ///
    /// `second_approvers_available` is the outcome of a strict second-tier
    /// candidate query; it is ignored when the plan does not need one.
    pub fn check_assignable(
        plan: &ApprovalPlan,
        second_approvers_available: bool,
    ) -> Result<(), PurchaseOrderError> {
        if plan.needs_second_approver && !second_approvers_available {
            return Err(PurchaseOrderError::SecondApprovalUnassignable);
        }
        Ok(())
    }

    /// Turns a checked plan into the action to persist.
    #[must_use]
    pub fn approve(plan: &ApprovalPlan, caller: &UserId, at: DateTime<Utc>) -> LifecycleAction {
        LifecycleAction::Approve {
            new_status: if plan.activate {
                PoStatus::Active
            } else {
                PoStatus::Unapproved
            },
            approver: plan.set_approved.then(|| caller.clone()),
            second_approver: plan.set_second_approval.then(|| caller.clone()),
            at,
            assign_number: plan.activate,
        }
    }

    /// Notifications owed after an approve call.
    #[must_use]
    pub fn approval_notifications(
        po: &PoSnapshot,
        plan: &ApprovalPlan,
        caller: &UserId,
    ) -> Vec<NotificationIntent> {
        let mut intents = Vec::new();
        if plan.set_approved && !plan.activate {
            if let Some(priority) = &po.priority_second_approver {
                intents.push(NotificationIntent::required(
                    priority.clone(),
                    TemplateCode::PoPrioritySecondApprovalRequired,
                ));
            }
        }
        if plan.activate && &po.uid != caller {
            intents.push(NotificationIntent::required(
                po.uid.clone(),
                TemplateCode::PoActive,
            ));
        }
        intents
    }

    /// Reject an Unapproved purchase order.
    ///
    /// # Errors
    /// * `Rejected` if already rejected
    /// * `NotUnapproved` if not Unapproved
    /// * `UnauthorizedRejection` if the caller is in neither approver pool
    pub fn reject(
        po: &PoSnapshot,
        caller: &UserId,
        reason: RejectionReason,
        authority: ApprovalAuthority,
        at: DateTime<Utc>,
    ) -> Result<LifecycleAction, PurchaseOrderError> {
        if po.rejected.is_some() {
            return Err(PurchaseOrderError::Rejected);
        }
        if po.status != PoStatus::Unapproved {
            return Err(PurchaseOrderError::NotUnapproved);
        }
        if !authority.any() {
            return Err(PurchaseOrderError::UnauthorizedRejection);
        }
        Ok(LifecycleAction::Reject {
            rejector: caller.clone(),
            reason: reason.0,
            at,
        })
    }

    /// Notification owed after a rejection (best-effort).
    #[must_use]
    pub fn rejection_notification(po: &PoSnapshot) -> NotificationIntent {
        NotificationIntent::best_effort(po.uid.clone(), TemplateCode::PoRejected)
    }

    /// Cancel an Active purchase order that has no expenses.
    ///
    /// # Errors
    /// * `UnauthorizedCancellation` without `payables_admin`
    /// * `JobsEditingDisabled` when the jobs editing gate is off
    /// * `NotActive` if not Active
    /// * `HasExpenses` if any expense references it
    pub fn cancel(
        po: &PoSnapshot,
        caller: &UserId,
        is_payables_admin: bool,
        jobs_editing_enabled: bool,
        expense_count: u64,
        at: DateTime<Utc>,
    ) -> Result<LifecycleAction, PurchaseOrderError> {
        if !is_payables_admin {
            return Err(PurchaseOrderError::UnauthorizedCancellation);
        }
        if !jobs_editing_enabled {
            return Err(PurchaseOrderError::JobsEditingDisabled);
        }
        if po.status != PoStatus::Active {
            return Err(PurchaseOrderError::NotActive);
        }
        if expense_count > 0 {
            return Err(PurchaseOrderError::HasExpenses);
        }
        Ok(LifecycleAction::Cancel {
            new_status: PoStatus::Cancelled,
            canceller: caller.clone(),
            at,
        })
    }

    /// Manually close an Active Cumulative or Recurring purchase order.
    ///
    /// # Errors
    /// * `UnauthorizedClosure` without `payables_admin`
    /// * `InvalidPoType` for One-Time
    /// * `NotActive` if not Active
    /// * `NoExpenses` for a Recurring PO without committed expenses
    pub fn close(
        po: &PoSnapshot,
        caller: &UserId,
        is_payables_admin: bool,
        committed_expense_count: u64,
        at: DateTime<Utc>,
    ) -> Result<LifecycleAction, PurchaseOrderError> {
        if !is_payables_admin {
            return Err(PurchaseOrderError::UnauthorizedClosure);
        }
        if po.po_type == PoType::OneTime {
            return Err(PurchaseOrderError::InvalidPoType);
        }
        if po.status != PoStatus::Active {
            return Err(PurchaseOrderError::NotActive);
        }
        if po.po_type == PoType::Recurring && committed_expense_count == 0 {
            return Err(PurchaseOrderError::NoExpenses);
        }
        Ok(LifecycleAction::Close {
            new_status: PoStatus::Closed,
            closer: Some(caller.clone()),
            at,
            by_system: false,
        })
    }

    /// Close performed by the expense reconciler.
    pub fn close_by_system(
        po: &PoSnapshot,
        at: DateTime<Utc>,
    ) -> Result<LifecycleAction, PurchaseOrderError> {
        if po.status != PoStatus::Active {
            return Err(PurchaseOrderError::NotActive);
        }
        Ok(LifecycleAction::Close {
            new_status: PoStatus::Closed,
            closer: None,
            at,
            by_system: true,
        })
    }

    /// Convert an Active One-Time purchase order to Cumulative.
    ///
    /// # Errors
    /// * `UnauthorizedConversion` without `payables_admin`
    /// * `NotActive` if not Active
    /// * `NotOneTime` if already Cumulative or Recurring
    pub fn make_cumulative(
        po: &PoSnapshot,
        is_payables_admin: bool,
    ) -> Result<LifecycleAction, PurchaseOrderError> {
        if !is_payables_admin {
            return Err(PurchaseOrderError::UnauthorizedConversion);
        }
        if po.status != PoStatus::Active {
            return Err(PurchaseOrderError::NotActive);
        }
        if po.po_type != PoType::OneTime {
            return Err(PurchaseOrderError::NotOneTime);
        }
        Ok(LifecycleAction::MakeCumulative {
            new_type: PoType::Cumulative,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_shared::types::PurchaseOrderId;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn user(s: &str) -> UserId {
        UserId::from_db(s.to_string())
    }

    fn po(approval_total: Decimal) -> PoSnapshot {
        PoSnapshot {
            id: PurchaseOrderId::from_db("gal6e5la2fa4rpn".into()),
            uid: user("rzr98oadsp9qc11"),
            status: PoStatus::Unapproved,
            po_type: PoType::OneTime,
            total: approval_total,
            approval_total,
            date: NaiveDate::from_ymd_opt(2026, 1, 30).unwrap(),
            end_date: None,
            frequency: None,
            approved: None,
            second_approval: None,
            rejected: None,
            priority_second_approver: None,
            parent_po: None,
        }
    }

    fn thresholds() -> ApprovalThresholds {
        ApprovalThresholds::new(vec![dec!(500), dec!(2500)]).unwrap()
    }

    const FIRST: ApprovalAuthority = ApprovalAuthority {
        first_tier: true,
        second_tier: false,
    };
    const SECOND: ApprovalAuthority = ApprovalAuthority {
        first_tier: false,
        second_tier: true,
    };
    const NONE: ApprovalAuthority = ApprovalAuthority {
        first_tier: false,
        second_tier: false,
    };

    #[test]
    fn test_first_approval_under_t1_activates() {
        let plan = PurchaseOrderLifecycle::plan_approval(&po(dec!(329.01)), FIRST, &thresholds())
            .unwrap();
        assert!(plan.set_approved);
        assert!(!plan.set_second_approval);
        assert!(plan.activate);
        assert!(!plan.needs_second_approver);

        let caller = user("f2j5a8vk006baub");
        let action = PurchaseOrderLifecycle::approve(&plan, &caller, Utc::now());
        assert!(matches!(
            action,
            LifecycleAction::Approve {
                new_status: PoStatus::Active,
                assign_number: true,
                second_approver: None,
                ..
            }
        ));
    }

    #[test]
    fn test_first_approval_above_t1_holds() {
        let plan = PurchaseOrderLifecycle::plan_approval(&po(dec!(862.12)), FIRST, &thresholds())
            .unwrap();
        assert!(plan.set_approved);
        assert!(!plan.activate);
        assert!(plan.needs_second_approver);
        assert_eq!(
            PurchaseOrderLifecycle::check_assignable(&plan, false),
            Err(PurchaseOrderError::SecondApprovalUnassignable)
        );
        assert!(PurchaseOrderLifecycle::check_assignable(&plan, true).is_ok());
    }

    #[test]
    fn test_priority_approver_skips_guard_and_is_notified() {
        let mut record = po(dec!(862.12));
        record.priority_second_approver = Some(user("6bq4j0eb26631dy"));
        let plan = PurchaseOrderLifecycle::plan_approval(&record, FIRST, &thresholds()).unwrap();
        assert!(!plan.needs_second_approver);
        assert!(PurchaseOrderLifecycle::check_assignable(&plan, false).is_ok());

        let intents =
            PurchaseOrderLifecycle::approval_notifications(&record, &plan, &user("f2j5a8vk006baub"));
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].template, TemplateCode::PoPrioritySecondApprovalRequired);
        assert_eq!(intents[0].recipient, user("6bq4j0eb26631dy"));
    }

    #[test]
    fn test_single_call_completion() {
        let plan = PurchaseOrderLifecycle::plan_approval(&po(dec!(862.12)), SECOND, &thresholds())
            .unwrap();
        assert!(plan.set_approved && plan.set_second_approval && plan.activate);
        let caller = user("66ct66w380ob6w8");
        match PurchaseOrderLifecycle::approve(&plan, &caller, Utc::now()) {
            LifecycleAction::Approve {
                approver,
                second_approver,
                new_status,
                ..
            } => {
                assert_eq!(approver.as_ref(), Some(&caller));
                assert_eq!(second_approver.as_ref(), Some(&caller));
                assert_eq!(new_status, PoStatus::Active);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_second_stage_requires_second_tier() {
        let mut record = po(dec!(862.12));
        record.approved = Some(Utc::now());
        assert_eq!(
            PurchaseOrderLifecycle::plan_approval(&record, FIRST, &thresholds()),
            Err(PurchaseOrderError::UnauthorizedApproval)
        );
        let plan = PurchaseOrderLifecycle::plan_approval(&record, SECOND, &thresholds()).unwrap();
        assert!(!plan.set_approved);
        assert!(plan.set_second_approval);
        assert!(plan.activate);
    }

    #[test]
    fn test_unauthorized_caller() {
        assert_eq!(
            PurchaseOrderLifecycle::plan_approval(&po(dec!(10)), NONE, &thresholds()),
            Err(PurchaseOrderError::UnauthorizedApproval)
        );
    }

    #[test]
    fn test_active_po_not_unapproved() {
        let mut record = po(dec!(10));
        record.status = PoStatus::Active;
        assert_eq!(
            PurchaseOrderLifecycle::plan_approval(&record, FIRST, &thresholds()),
            Err(PurchaseOrderError::NotUnapproved)
        );
    }

    #[test]
    fn test_rejected_po_cannot_be_approved() {
        let mut record = po(dec!(10));
        record.rejected = Some(Utc::now());
        assert_eq!(
            PurchaseOrderLifecycle::plan_approval(&record, FIRST, &thresholds()),
            Err(PurchaseOrderError::Rejected)
        );
    }

    #[test]
    fn test_creator_not_notified_of_own_activation() {
        let record = po(dec!(10));
        let plan = PurchaseOrderLifecycle::plan_approval(&record, FIRST, &thresholds()).unwrap();
        assert!(PurchaseOrderLifecycle::approval_notifications(&record, &plan, &record.uid)
            .is_empty());
        let other = PurchaseOrderLifecycle::approval_notifications(
            &record,
            &plan,
            &user("f2j5a8vk006baub"),
        );
        assert_eq!(other[0].template, TemplateCode::PoActive);
        assert_eq!(other[0].recipient, record.uid);
    }

    #[test]
    fn test_rejection_reason_validation() {
        assert_eq!(
            RejectionReason::parse(None),
            Err(PurchaseOrderError::InvalidRequestBody)
        );
        assert_eq!(
            RejectionReason::parse(Some("  nope   ")),
            Err(PurchaseOrderError::InvalidRejectionReason)
        );
        assert_eq!(
            RejectionReason::parse(Some("  wrong vendor ")).unwrap().as_str(),
            "wrong vendor"
        );
    }

    #[test]
    fn test_reject_precondition_order() {
        let caller = user("f2j5a8vk006baub");
        let reason = RejectionReason::parse(Some("wrong vendor")).unwrap();

        let mut rejected = po(dec!(10));
        rejected.rejected = Some(Utc::now());
        rejected.status = PoStatus::Active;
        assert_eq!(
            PurchaseOrderLifecycle::reject(&rejected, &caller, reason.clone(), FIRST, Utc::now()),
            Err(PurchaseOrderError::Rejected)
        );

        let mut active = po(dec!(10));
        active.status = PoStatus::Active;
        assert_eq!(
            PurchaseOrderLifecycle::reject(&active, &caller, reason.clone(), NONE, Utc::now()),
            Err(PurchaseOrderError::NotUnapproved)
        );

        assert_eq!(
            PurchaseOrderLifecycle::reject(&po(dec!(10)), &caller, reason.clone(), NONE, Utc::now()),
            Err(PurchaseOrderError::UnauthorizedRejection)
        );
        assert!(PurchaseOrderLifecycle::reject(&po(dec!(10)), &caller, reason, SECOND, Utc::now())
            .is_ok());
    }

    #[test]
    fn test_cancel_rules() {
        let caller = user("f2j5a8vk006baub");
        let mut active = po(dec!(10));
        active.status = PoStatus::Active;

        assert_eq!(
            PurchaseOrderLifecycle::cancel(&active, &caller, false, true, 0, Utc::now()),
            Err(PurchaseOrderError::UnauthorizedCancellation)
        );
        assert_eq!(
            PurchaseOrderLifecycle::cancel(&active, &caller, true, false, 0, Utc::now()),
            Err(PurchaseOrderError::JobsEditingDisabled)
        );
        assert_eq!(
            PurchaseOrderLifecycle::cancel(&po(dec!(10)), &caller, true, true, 0, Utc::now()),
            Err(PurchaseOrderError::NotActive)
        );
        assert_eq!(
            PurchaseOrderLifecycle::cancel(&active, &caller, true, true, 1, Utc::now()),
            Err(PurchaseOrderError::HasExpenses)
        );
        assert!(matches!(
            PurchaseOrderLifecycle::cancel(&active, &caller, true, true, 0, Utc::now()),
            Ok(LifecycleAction::Cancel {
                new_status: PoStatus::Cancelled,
                ..
            })
        ));
    }

    #[test]
    fn test_close_rules() {
        let caller = user("f2j5a8vk006baub");
        let mut one_time = po(dec!(10));
        one_time.status = PoStatus::Active;
        assert_eq!(
            PurchaseOrderLifecycle::close(&one_time, &caller, false, 0, Utc::now()),
            Err(PurchaseOrderError::UnauthorizedClosure)
        );
        assert_eq!(
            PurchaseOrderLifecycle::close(&one_time, &caller, true, 0, Utc::now()),
            Err(PurchaseOrderError::InvalidPoType)
        );

        let mut recurring = one_time.clone();
        recurring.po_type = PoType::Recurring;
        assert_eq!(
            PurchaseOrderLifecycle::close(&recurring, &caller, true, 0, Utc::now()),
            Err(PurchaseOrderError::NoExpenses)
        );
        assert!(PurchaseOrderLifecycle::close(&recurring, &caller, true, 2, Utc::now()).is_ok());

        let mut cumulative = one_time;
        cumulative.po_type = PoType::Cumulative;
        assert!(matches!(
            PurchaseOrderLifecycle::close(&cumulative, &caller, true, 0, Utc::now()),
            Ok(LifecycleAction::Close { by_system: false, .. })
        ));
        cumulative.status = PoStatus::Closed;
        assert_eq!(
            PurchaseOrderLifecycle::close(&cumulative, &caller, true, 0, Utc::now()),
            Err(PurchaseOrderError::NotActive)
        );
    }

    #[test]
    fn test_make_cumulative_rules() {
        let mut record = po(dec!(10));
        assert_eq!(
            PurchaseOrderLifecycle::make_cumulative(&record, false),
            Err(PurchaseOrderError::UnauthorizedConversion)
        );
        assert_eq!(
            PurchaseOrderLifecycle::make_cumulative(&record, true),
            Err(PurchaseOrderError::NotActive)
        );
        record.status = PoStatus::Active;
        assert_eq!(
            PurchaseOrderLifecycle::make_cumulative(&record, true),
            Ok(LifecycleAction::MakeCumulative {
                new_type: PoType::Cumulative
            })
        );
        record.po_type = PoType::Recurring;
        assert_eq!(
            PurchaseOrderLifecycle::make_cumulative(&record, true),
            Err(PurchaseOrderError::NotOneTime)
        );
    }
}
