//! Expense commit and purchase order reconciliation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use backoffice_core::claims::ClaimName;
use backoffice_core::config_gate::EditingGate;
use backoffice_core::purchase_order::PurchaseOrderLifecycle;
use backoffice_core::reconcile::{
    CommitStamp, CommittedExpenses, ExcessPolicy, ExpenseCommit, ExpenseSnapshot, MileageRates,
    PoReconciler, ReconcileError, ReconcileOutcome, whole_distance,
};
use backoffice_core::reconcile::service::MILEAGE_PAYMENT_TYPE;
use backoffice_shared::types::{ExpenseId, PurchaseOrderId, UserId};

use crate::entities::{expense_rates, expenses, mileage_reset_dates, purchase_orders};
use crate::repositories::claims::has_claim;
use crate::repositories::config::{expenses_bag, gate_enabled};
use crate::repositories::purchase_order::{apply, snapshot};
use crate::tx::SerializableExt;

/// Response message of a successful commit.
pub const COMMIT_MESSAGE: &str = "Record committed successfully";

const SAVE_ERROR: &str = "error_saving_record";

fn save_error(err: DbErr) -> ReconcileError {
    ReconcileError::database(SAVE_ERROR, err)
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an expense by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, id: &ExpenseId) -> Result<Option<expenses::Model>, DbErr> {
        expenses::Entity::find_by_id(id.as_str()).one(&self.db).await
    }

    /// Commits an approved expense and reconciles its purchase order.
    ///
    /// `today` is the commit date in the business time zone and decides the
    /// week ending.
    ///
    /// # Errors
    ///
    /// Any [`ReconcileError`]; the expense and purchase order are left
    /// untouched on error.
    pub async fn commit(
        &self,
        id: &ExpenseId,
        caller: &UserId,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<expenses::Model, ReconcileError> {
        let tx = self.db.serializable().await.map_err(save_error)?;
        let conn = tx.transaction();

        let can_commit = has_claim(conn, caller, ClaimName::Commit)
            .await
            .map_err(|e| ReconcileError::database("error_fetching_user_claims", e))?;
        if !can_commit {
            return Err(ReconcileError::UnauthorizedCommit);
        }

        let model = expenses::Entity::find_by_id(id.as_str())
            .one(conn)
            .await
            .map_err(|e| ReconcileError::database("error_fetching_record", e))?
            .ok_or(ReconcileError::RecordNotFound)?;
        let expense = expense_snapshot(&model);
        let editing_enabled = gate_enabled(conn, EditingGate::Expenses).await;
        ExpenseCommit::validate(&expense, can_commit, editing_enabled)?;

        let total = if expense.is_mileage() {
            mileage_total(conn, &expense).await?
        } else {
            expense.total
        };

        let stamp = ExpenseCommit::stamp(caller, now, today);
        let updated = stamp_expense(model, &stamp, total)
            .update(conn)
            .await
            .map_err(save_error)?;

        if let Some(po_id) = &expense.purchase_order {
            reconcile(conn, po_id, &expense.id, total, now).await?;
        }

        tx.commit().await.map_err(save_error)?;
        tracing::info!(
            expense_id = %updated.id,
            user_id = %caller,
            total = %updated.total,
            purchase_order = ?updated.purchase_order,
            "expense committed"
        );
        Ok(updated)
    }
}

fn expense_snapshot(model: &expenses::Model) -> ExpenseSnapshot {
    ExpenseSnapshot {
        id: ExpenseId::from_db(model.id.clone()),
        uid: UserId::from_db(model.uid.clone()),
        date: model.date,
        payment_type: model.payment_type.clone(),
        total: model.total,
        distance: model.distance,
        purchase_order: model
            .purchase_order
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| PurchaseOrderId::from_db(p.to_string())),
        submitted: model.submitted,
        approved: model.approved.map(|t| t.with_timezone(&Utc)),
        rejected: model.rejected.map(|t| t.with_timezone(&Utc)),
        committed: model.committed.map(|t| t.with_timezone(&Utc)),
    }
}

fn stamp_expense(
    model: expenses::Model,
    stamp: &CommitStamp,
    total: Decimal,
) -> expenses::ActiveModel {
    let mut active: expenses::ActiveModel = model.into();
    active.committer = Set(Some(stamp.committer.to_string()));
    active.committed = Set(Some(stamp.committed.into()));
    active.committed_week_ending = Set(Some(stamp.committed_week_ending));
    active.total = Set(total);
    active
}

/// Reprices a mileage expense against the rate sheet in force on its date.
async fn mileage_total<C: ConnectionTrait>(
    conn: &C,
    expense: &ExpenseSnapshot,
) -> Result<Decimal, ReconcileError> {
    let distance = whole_distance(
        expense
            .distance
            .ok_or(ReconcileError::InvalidMileageDistance)?,
    )?;

    let rate = expense_rates::Entity::find()
        .filter(expense_rates::Column::EffectiveDate.lte(expense.date))
        .order_by_desc(expense_rates::Column::EffectiveDate)
        .one(conn)
        .await
        .map_err(|e| ReconcileError::database("error_fetching_expense_rate", e))?
        .ok_or(ReconcileError::ExpenseRateMissing)?;
    let rates = MileageRates::from_json(&rate.mileage)?;

    let prior = whole_distance(prior_distance(conn, expense).await?)?;
    let amount = rates.amount(prior, distance);
    tracing::debug!(
        expense_id = %expense.id,
        prior,
        distance,
        amount = %amount,
        "mileage repriced"
    );
    Ok(amount)
}

/// Committed mileage for the same user since the last reset date, ordered
/// before `expense` by date and then id.
async fn prior_distance<C: ConnectionTrait>(
    conn: &C,
    expense: &ExpenseSnapshot,
) -> Result<Decimal, ReconcileError> {
    let reset = mileage_reset_dates::Entity::find()
        .filter(mileage_reset_dates::Column::Date.lte(expense.date))
        .order_by_desc(mileage_reset_dates::Column::Date)
        .one(conn)
        .await
        .map_err(|e| ReconcileError::database("error_fetching_mileage_reset_date", e))?;

    let mut query = expenses::Entity::find()
        .select_only()
        .column_as(Expr::col(expenses::Column::Distance).sum(), "prior")
        .filter(expenses::Column::Uid.eq(expense.uid.as_str()))
        .filter(expenses::Column::PaymentType.eq(MILEAGE_PAYMENT_TYPE))
        .filter(expenses::Column::Committed.is_not_null())
        .filter(
            Condition::any()
                .add(expenses::Column::Date.lt(expense.date))
                .add(
                    Condition::all()
                        .add(expenses::Column::Date.eq(expense.date))
                        .add(expenses::Column::Id.lt(expense.id.as_str())),
                ),
        );
    if let Some(reset) = reset {
        query = query.filter(expenses::Column::Date.gte(reset.date));
    }

    let prior = query
        .into_tuple::<Option<Decimal>>()
        .one(conn)
        .await
        .map_err(|e| ReconcileError::database("error_fetching_prior_mileage", e))?
        .flatten()
        .unwrap_or_default();
    Ok(prior)
}

async fn committed_against<C: ConnectionTrait>(
    conn: &C,
    po_id: &PurchaseOrderId,
    exclude: &ExpenseId,
) -> Result<CommittedExpenses, ReconcileError> {
    let row = expenses::Entity::find()
        .select_only()
        .column_as(Expr::col(expenses::Column::Id).count(), "count")
        .column_as(Expr::col(expenses::Column::Total).sum(), "total")
        .filter(expenses::Column::PurchaseOrder.eq(po_id.as_str()))
        .filter(expenses::Column::Committed.is_not_null())
        .filter(expenses::Column::Id.ne(exclude.as_str()))
        .into_tuple::<(i64, Option<Decimal>)>()
        .one(conn)
        .await
        .map_err(|e| ReconcileError::database("error_fetching_expenses", e))?;

    let (count, total) = row.unwrap_or((0, None));
    Ok(CommittedExpenses {
        count: u64::try_from(count).unwrap_or_default(),
        total: total.unwrap_or_default(),
    })
}

/// Applies the reconciler's decision to the purchase order.
async fn reconcile<C: ConnectionTrait>(
    conn: &C,
    po_id: &PurchaseOrderId,
    expense_id: &ExpenseId,
    pending_total: Decimal,
    now: DateTime<Utc>,
) -> Result<(), ReconcileError> {
    let model = purchase_orders::Entity::find_by_id(po_id.as_str())
        .one(conn)
        .await
        .map_err(|e| ReconcileError::database("error_fetching_purchase_order", e))?
        .ok_or(ReconcileError::PurchaseOrderNotFound)?;
    let po = snapshot(&model)?;
    let committed = committed_against(conn, po_id, expense_id).await?;
    let policy = ExcessPolicy::from_config(expenses_bag(conn).await.as_ref());

    match PoReconciler::reconcile(&po, pending_total, committed, &policy)? {
        ReconcileOutcome::Unchanged => Ok(()),
        ReconcileOutcome::Close => {
            let action = PurchaseOrderLifecycle::close_by_system(&po, now)?;
            apply(model, &action)
                .update(conn)
                .await
                .map_err(|e| ReconcileError::database("error_updating_purchase_order", e))?;
            tracing::info!(po_id = %po_id, expense_id = %expense_id, "purchase order closed by reconciler");
            Ok(())
        }
    }
}
