//! Purchase order lifecycle repository.
//!
//! Each operation opens a serializable transaction, loads the purchase
//! order, asks [`PurchaseOrderLifecycle`] what to do, persists the resulting
//! [`LifecycleAction`], queues notifications and commits. Any error drops the
//! transaction, which rolls back the write and every queued notification.
//! Attempts that lose a race with a concurrent transaction are rerun by
//! [`retry_conflicts`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, Set,
};

use backoffice_core::approvers::{
    ApprovalThresholds, ApproverQuery, ApproverTier, ExpenditureKind, SecondTierMode,
};
use backoffice_core::claims::ClaimName;
use backoffice_core::config_gate::EditingGate;
use backoffice_core::notifications::{NotificationData, NotificationIntent};
use backoffice_core::purchase_order::holdover::PURCHASE_ORDERS_DOMAIN;
use backoffice_core::purchase_order::{
    ApprovalAuthority, Frequency, LifecycleAction, PoSnapshot, PoStatus, PoType,
    PurchaseOrderError, PurchaseOrderLifecycle, RejectionReason, SecondApprovalHoldover,
};
use backoffice_shared::types::{PurchaseOrderId, UserId};
use backoffice_shared::{AppError, AppResult};

use crate::entities::{expenses, notifications, purchase_orders};
use crate::repositories::approvers::{load_thresholds, select};
use crate::repositories::claims::has_claim;
use crate::repositories::config::{domain_bag, gate_enabled};
use crate::repositories::notification::emit;
use crate::repositories::po_number::generate_po_number;
use crate::repositories::user::display_name;
use crate::tx::{SerializableExt, conflict_or, retry_conflicts};

const UPDATE_ERROR: &str = "error_updating_purchase_order";

fn update_error(err: DbErr) -> PurchaseOrderError {
    store_error(UPDATE_ERROR, err)
}

fn store_error(code: &'static str, err: DbErr) -> PurchaseOrderError {
    PurchaseOrderError::database(conflict_or(code, &err), err)
}

/// Purchase order repository.
#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    db: DatabaseConnection,
}

impl PurchaseOrderRepository {
    /// Creates a new purchase order repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a purchase order by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        id: &PurchaseOrderId,
    ) -> Result<Option<purchase_orders::Model>, DbErr> {
        purchase_orders::Entity::find_by_id(id.as_str())
            .one(&self.db)
            .await
    }

    /// Records the caller's approval, activating and numbering the purchase
    /// order once every required approval is present.
    ///
    /// # Errors
    ///
    /// `po_not_found`, `po_not_unapproved`, `po_rejected`,
    /// `unauthorized_approval`, `second_approval_unassignable`, a PO-number
    /// error or a downstream error.
    pub async fn approve(
        &self,
        id: &PurchaseOrderId,
        caller: &UserId,
        now: DateTime<Utc>,
    ) -> AppResult<purchase_orders::Model> {
        retry_conflicts("approve", || self.approve_once(id, caller, now)).await
    }

    async fn approve_once(
        &self,
        id: &PurchaseOrderId,
        caller: &UserId,
        now: DateTime<Utc>,
    ) -> AppResult<purchase_orders::Model> {
        let tx = self.db.serializable().await.map_err(update_error)?;
        let conn = tx.transaction();

        let model = load(conn, id).await?;
        let po = snapshot(&model)?;
        let thresholds = load_thresholds(conn).await?;
        let pools = ApproverPools::for_purchase_order(&model)?;
        let authority = pools
            .authority(conn, caller, &thresholds, SecondTierMode::Strict)
            .await?;

        let plan = PurchaseOrderLifecycle::plan_approval(&po, authority, &thresholds)?;
        if plan.needs_second_approver {
            let query = pools.query(ApproverTier::Second(SecondTierMode::Strict))?;
            let available = select(conn, &query, &thresholds, None).await?;
            PurchaseOrderLifecycle::check_assignable(&plan, !available.candidates.is_empty())?;
        }

        let action = PurchaseOrderLifecycle::approve(&plan, caller, now);
        let po_number = match &action {
            LifecycleAction::Approve {
                assign_number: true,
                ..
            } => Some(generate_po_number(conn, &model, now).await?),
            _ => None,
        };

        let mut active = apply(model, &action);
        if let Some(number) = po_number {
            active.po_number = Set(number);
        }
        let updated = active.update(conn).await.map_err(update_error)?;

        let intents = PurchaseOrderLifecycle::approval_notifications(&po, &plan, caller);
        if !intents.is_empty() {
            let data = notification_data(conn, &updated, caller).await?;
            for intent in &intents {
                queue(conn, intent, &data, caller).await?;
            }
        }

        tx.commit().await.map_err(update_error)?;
        tracing::info!(
            po_id = %updated.id,
            user_id = %caller,
            status = %updated.status,
            po_number = %updated.po_number,
            "purchase order approved"
        );
        Ok(updated)
    }

    /// Rejects an Unapproved purchase order.
    ///
    /// Second-tier holders may reject regardless of their lower threshold.
    ///
    /// # Errors
    ///
    /// `po_not_found`, `po_rejected`, `po_not_unapproved`,
    /// `unauthorized_rejection` or a downstream error.
    pub async fn reject(
        &self,
        id: &PurchaseOrderId,
        caller: &UserId,
        reason: RejectionReason,
        now: DateTime<Utc>,
    ) -> AppResult<purchase_orders::Model> {
        retry_conflicts("reject", || self.reject_once(id, caller, reason.clone(), now)).await
    }

    async fn reject_once(
        &self,
        id: &PurchaseOrderId,
        caller: &UserId,
        reason: RejectionReason,
        now: DateTime<Utc>,
    ) -> AppResult<purchase_orders::Model> {
        let tx = self.db.serializable().await.map_err(update_error)?;
        let conn = tx.transaction();

        let model = load(conn, id).await?;
        let po = snapshot(&model)?;
        let thresholds = load_thresholds(conn).await?;
        let authority = ApproverPools::for_purchase_order(&model)?
            .authority(conn, caller, &thresholds, SecondTierMode::Relaxed)
            .await?;

        let action = PurchaseOrderLifecycle::reject(&po, caller, reason, authority, now)?;
        let updated = apply(model, &action)
            .update(conn)
            .await
            .map_err(update_error)?;

        let data = notification_data(conn, &updated, caller)
            .await?
            .with_rejection_reason(&updated.rejection_reason);
        queue(
            conn,
            &PurchaseOrderLifecycle::rejection_notification(&po),
            &data,
            caller,
        )
        .await?;

        tx.commit().await.map_err(update_error)?;
        tracing::info!(po_id = %updated.id, user_id = %caller, "purchase order rejected");
        Ok(updated)
    }

    /// Cancels an Active purchase order that no expense references.
    ///
    /// # Errors
    ///
    /// `po_not_found`, `unauthorized_cancellation`, `jobs_editing_disabled`,
    /// `po_not_active`, `po_has_expenses`, `error_fetching_expenses` or a
    /// downstream error.
    pub async fn cancel(
        &self,
        id: &PurchaseOrderId,
        caller: &UserId,
        now: DateTime<Utc>,
    ) -> AppResult<purchase_orders::Model> {
        retry_conflicts("cancel", || self.cancel_once(id, caller, now)).await
    }

    async fn cancel_once(
        &self,
        id: &PurchaseOrderId,
        caller: &UserId,
        now: DateTime<Utc>,
    ) -> AppResult<purchase_orders::Model> {
        let tx = self.db.serializable().await.map_err(update_error)?;
        let conn = tx.transaction();

        let model = load(conn, id).await?;
        let po = snapshot(&model)?;
        let is_admin = payables_admin(conn, caller).await?;
        let jobs_enabled = gate_enabled(conn, EditingGate::Jobs).await;
        let expense_count = expenses::Entity::find()
            .filter(expenses::Column::PurchaseOrder.eq(model.id.as_str()))
            .count(conn)
            .await
            .map_err(|e| store_error("error_fetching_expenses", e))?;

        let action = PurchaseOrderLifecycle::cancel(
            &po,
            caller,
            is_admin,
            jobs_enabled,
            expense_count,
            now,
        )?;
        let updated = apply(model, &action)
            .update(conn)
            .await
            .map_err(update_error)?;

        tx.commit().await.map_err(update_error)?;
        tracing::info!(po_id = %updated.id, user_id = %caller, "purchase order cancelled");
        Ok(updated)
    }

    /// Manually closes an Active Cumulative or Recurring purchase order.
    ///
    /// # Errors
    ///
    /// `po_not_found`, `unauthorized_closure`, `invalid_po_type`,
    /// `po_not_active`, `no_expenses` or a downstream error.
    pub async fn close(
        &self,
        id: &PurchaseOrderId,
        caller: &UserId,
        now: DateTime<Utc>,
    ) -> AppResult<purchase_orders::Model> {
        retry_conflicts("close", || self.close_once(id, caller, now)).await
    }

    async fn close_once(
        &self,
        id: &PurchaseOrderId,
        caller: &UserId,
        now: DateTime<Utc>,
    ) -> AppResult<purchase_orders::Model> {
        let tx = self.db.serializable().await.map_err(update_error)?;
        let conn = tx.transaction();

        let model = load(conn, id).await?;
        let po = snapshot(&model)?;
        let is_admin = payables_admin(conn, caller).await?;
        let committed = expenses::Entity::find()
            .filter(expenses::Column::PurchaseOrder.eq(model.id.as_str()))
            .filter(expenses::Column::Committed.is_not_null())
            .count(conn)
            .await
            .map_err(|e| store_error("error_fetching_expenses", e))?;

        let action = PurchaseOrderLifecycle::close(&po, caller, is_admin, committed, now)?;
        let updated = apply(model, &action)
            .update(conn)
            .await
            .map_err(update_error)?;

        tx.commit().await.map_err(update_error)?;
        tracing::info!(po_id = %updated.id, user_id = %caller, "purchase order closed");
        Ok(updated)
    }

    /// Converts an Active One-Time purchase order to Cumulative.
    ///
    /// # Errors
    ///
    /// `po_not_found`, `unauthorized_conversion`, `po_not_active`,
    /// `po_not_one_time` or a downstream error.
    pub async fn make_cumulative(
        &self,
        id: &PurchaseOrderId,
        caller: &UserId,
    ) -> AppResult<purchase_orders::Model> {
        retry_conflicts("make_cumulative", || self.make_cumulative_once(id, caller)).await
    }

    async fn make_cumulative_once(
        &self,
        id: &PurchaseOrderId,
        caller: &UserId,
    ) -> AppResult<purchase_orders::Model> {
        let tx = self.db.serializable().await.map_err(update_error)?;
        let conn = tx.transaction();

        let model = load(conn, id).await?;
        let po = snapshot(&model)?;
        let is_admin = payables_admin(conn, caller).await?;

        let action = PurchaseOrderLifecycle::make_cumulative(&po, is_admin)?;
        let updated = apply(model, &action)
            .update(conn)
            .await
            .map_err(update_error)?;

        tx.commit().await.map_err(update_error)?;
        tracing::info!(po_id = %updated.id, user_id = %caller, "purchase order converted to cumulative");
        Ok(updated)
    }

    /// Asks every eligible second approver to act on purchase orders whose
    /// priority holdover has lapsed. Each recipient gets one reminder per
    /// run however many purchase orders qualify them; the creator of a
    /// purchase order is never reminded about it. Runs daily from the
    /// `reminders` binary.
    ///
    /// # Errors
    ///
    /// `thresholds_missing`, a corrupt purchase order or a downstream error.
    pub async fn queue_second_approver_reminders(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<notifications::Model>> {
        retry_conflicts("queue_second_approver_reminders", || {
            self.queue_second_approver_reminders_once(now)
        })
        .await
    }

    async fn queue_second_approver_reminders_once(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<notifications::Model>> {
        let tx = self.db.serializable().await.map_err(update_error)?;
        let conn = tx.transaction();

        let bag = domain_bag(conn, PURCHASE_ORDERS_DOMAIN).await;
        let holdover = SecondApprovalHoldover::from_config(bag.as_ref());
        let thresholds = load_thresholds(conn).await?;
        let waiting = purchase_orders::Entity::find()
            .filter(purchase_orders::Column::Status.eq(PoStatus::Unapproved.as_str()))
            .filter(purchase_orders::Column::Approved.lt(holdover.cutoff(now)))
            .filter(purchase_orders::Column::SecondApproval.is_null())
            .filter(purchase_orders::Column::Rejected.is_null())
            .all(conn)
            .await
            .map_err(|e| store_error("error_fetching_purchase_order", e))?;

        let mut lapsed = 0_usize;
        let mut recipients = Vec::new();
        for model in &waiting {
            let po = snapshot(model)?;
            if !holdover.is_lapsed(&po, &thresholds, now) {
                continue;
            }
            lapsed += 1;
            let query = ApproverPools::for_purchase_order(model)?
                .query(ApproverTier::Second(SecondTierMode::Strict))?;
            let selection = select(conn, &query, &thresholds, Some(&po.uid)).await?;
            recipients.extend(selection.candidates.into_iter().map(|a| a.id));
        }

        let mut queued = Vec::new();
        for intent in SecondApprovalHoldover::reminders(recipients) {
            let row = emit(conn, &intent, &NotificationData::default(), None)
                .await
                .map_err(|e| store_error("error_creating_notification", e))?;
            queued.extend(row);
        }

        tx.commit().await.map_err(update_error)?;
        tracing::info!(
            lapsed,
            reminders = queued.len(),
            timeout_hours = holdover.timeout().num_hours(),
            "second approver reminders queued"
        );
        Ok(queued)
    }
}

/// Loads a purchase order or fails with `po_not_found`.
async fn load<C: ConnectionTrait>(
    conn: &C,
    id: &PurchaseOrderId,
) -> Result<purchase_orders::Model, PurchaseOrderError> {
    purchase_orders::Entity::find_by_id(id.as_str())
        .one(conn)
        .await
        .map_err(|e| store_error("error_fetching_purchase_order", e))?
        .ok_or(PurchaseOrderError::NotFound)
}

/// Reads the lifecycle-relevant fields of a stored purchase order.
pub(crate) fn snapshot(model: &purchase_orders::Model) -> Result<PoSnapshot, PurchaseOrderError> {
    let corrupt = |field: &str, value: &str| {
        PurchaseOrderError::database(
            "error_reading_purchase_order",
            format!("purchase order {} has invalid {field} {value:?}", model.id),
        )
    };
    let status = PoStatus::parse(&model.status).ok_or_else(|| corrupt("status", &model.status))?;
    let po_type = PoType::parse(&model.po_type).ok_or_else(|| corrupt("type", &model.po_type))?;
    let frequency = match model.frequency.as_deref().filter(|f| !f.is_empty()) {
        Some(f) => Some(Frequency::parse(f).ok_or_else(|| corrupt("frequency", f))?),
        None => None,
    };

    Ok(PoSnapshot {
        id: PurchaseOrderId::from_db(model.id.clone()),
        uid: UserId::from_db(model.uid.clone()),
        status,
        po_type,
        total: model.total,
        approval_total: model.approval_total,
        date: model.date,
        end_date: model.end_date,
        frequency,
        approved: model.approved.map(|t| t.with_timezone(&Utc)),
        second_approval: model.second_approval.map(|t| t.with_timezone(&Utc)),
        rejected: model.rejected.map(|t| t.with_timezone(&Utc)),
        priority_second_approver: model
            .priority_second_approver
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| UserId::from_db(p.to_string())),
        parent_po: model
            .parent_po
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| PurchaseOrderId::from_db(p.to_string())),
    })
}

/// Writes `action` onto the stored row.
pub(crate) fn apply(
    model: purchase_orders::Model,
    action: &LifecycleAction,
) -> purchase_orders::ActiveModel {
    let mut active: purchase_orders::ActiveModel = model.into();
    match action {
        LifecycleAction::Approve {
            new_status,
            approver,
            second_approver,
            at,
            ..
        } => {
            active.status = Set(new_status.as_str().to_string());
            if let Some(approver) = approver {
                active.approver = Set(Some(approver.to_string()));
                active.approved = Set(Some((*at).into()));
            }
            if let Some(second) = second_approver {
                active.second_approver = Set(Some(second.to_string()));
                active.second_approval = Set(Some((*at).into()));
            }
        }
        LifecycleAction::Reject {
            rejector,
            reason,
            at,
        } => {
            active.rejector = Set(Some(rejector.to_string()));
            active.rejected = Set(Some((*at).into()));
            active.rejection_reason = Set(reason.clone());
        }
        LifecycleAction::Cancel {
            new_status,
            canceller,
            at,
        } => {
            active.status = Set(new_status.as_str().to_string());
            active.canceller = Set(Some(canceller.to_string()));
            active.cancelled = Set(Some((*at).into()));
        }
        LifecycleAction::Close {
            new_status,
            closer,
            at,
            by_system,
        } => {
            active.status = Set(new_status.as_str().to_string());
            active.closer = Set(closer.as_ref().map(ToString::to_string));
            active.closed = Set(Some((*at).into()));
            active.closed_by_system = Set(*by_system);
        }
        LifecycleAction::MakeCumulative { new_type } => {
            active.po_type = Set(new_type.as_str().to_string());
        }
    }
    active
}

/// Approver pool lookups for one purchase order.
struct ApproverPools {
    division: String,
    amount: Decimal,
    kind: ExpenditureKind,
    has_job: bool,
}

impl ApproverPools {
    fn for_purchase_order(model: &purchase_orders::Model) -> Result<Self, AppError> {
        Ok(Self {
            division: model.division.clone(),
            amount: model.approval_total,
            kind: ExpenditureKind::parse(&model.kind)?,
            has_job: model.job.as_deref().is_some_and(|j| !j.is_empty()),
        })
    }

    fn query(&self, tier: ApproverTier) -> Result<ApproverQuery, AppError> {
        Ok(ApproverQuery::new(
            &self.division,
            self.amount,
            self.kind,
            self.has_job,
            tier,
        )?)
    }

    /// Whether `caller` sits in the first-tier and second-tier pools.
    async fn authority<C: ConnectionTrait>(
        &self,
        conn: &C,
        caller: &UserId,
        thresholds: &ApprovalThresholds,
        mode: SecondTierMode,
    ) -> Result<ApprovalAuthority, AppError> {
        let first = self.query(ApproverTier::First)?;
        let second = self.query(ApproverTier::Second(mode))?;
        Ok(ApprovalAuthority {
            first_tier: select(conn, &first, thresholds, None)
                .await?
                .contains(caller),
            second_tier: select(conn, &second, thresholds, None)
                .await?
                .contains(caller),
        })
    }
}

async fn payables_admin<C: ConnectionTrait>(
    conn: &C,
    caller: &UserId,
) -> Result<bool, AppError> {
    has_claim(conn, caller, ClaimName::PayablesAdmin)
        .await
        .map_err(|e| AppError::downstream(conflict_or("error_fetching_user_claims", &e), e))
}

async fn notification_data<C: ConnectionTrait>(
    conn: &C,
    po: &purchase_orders::Model,
    actor: &UserId,
) -> Result<NotificationData, PurchaseOrderError> {
    let creator = display_name(conn, &po.uid).await.map_err(update_error)?;
    let approver = display_name(conn, actor.as_str())
        .await
        .map_err(update_error)?;
    Ok(NotificationData::purchase_order(
        &PurchaseOrderId::from_db(po.id.clone()),
        &po.po_number,
        &creator,
        &approver,
    ))
}

async fn queue(
    conn: &DatabaseTransaction,
    intent: &NotificationIntent,
    data: &NotificationData,
    actor: &UserId,
) -> Result<(), PurchaseOrderError> {
    emit(conn, intent, data, Some(actor))
        .await
        .map_err(|e| store_error("error_creating_notification", e))?;
    Ok(())
}
