//! PO-number allocation inside a lifecycle transaction.
//!
//! Takes the advisory lock, reads the numbers already used under the prefix
//! and walks the candidates the core allocator yields until one is free.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};

use backoffice_core::purchase_order::po_number::{child_candidates, month_prefix, parent_candidates};
use backoffice_core::purchase_order::{PoNumberError, PoType};

use crate::entities::purchase_orders;
use crate::tx::{PO_NUMBER_LOCK_KEY, advisory_xact_lock, conflict_or};

fn store_error(err: DbErr) -> PoNumberError {
    PoNumberError::database(conflict_or("error_generating_po_number", &err), err)
}

fn is_recurring(po_type: &str) -> bool {
    PoType::parse(po_type) == Some(PoType::Recurring)
}

async fn numbers_with_prefix<C: ConnectionTrait>(
    conn: &C,
    prefix: &str,
) -> Result<Vec<String>, PoNumberError> {
    purchase_orders::Entity::find()
        .select_only()
        .column(purchase_orders::Column::PoNumber)
        .filter(purchase_orders::Column::PoNumber.starts_with(prefix))
        .into_tuple::<String>()
        .all(conn)
        .await
        .map_err(store_error)
}

async fn is_taken<C: ConnectionTrait>(conn: &C, number: &str) -> Result<bool, PoNumberError> {
    Ok(purchase_orders::Entity::find()
        .filter(purchase_orders::Column::PoNumber.eq(number))
        .one(conn)
        .await
        .map_err(store_error)?
        .is_some())
}

/// Generates the PO number for `po` as it becomes Active.
///
/// Parents get the smallest unused `YYMM-NNNN` of the current UTC month;
/// children get `<parent>-NN` after the highest existing suffix. Both the
/// child and its parent must be Recurring.
///
/// # Errors
///
/// `ParentNotFound`, `ParentMissingNumber`, `ParentNotRecurring`,
/// `Exhausted` or a wrapped store error.
pub(crate) async fn generate_po_number<C: ConnectionTrait>(
    conn: &C,
    po: &purchase_orders::Model,
    now: DateTime<Utc>,
) -> Result<String, PoNumberError> {
    advisory_xact_lock(conn, PO_NUMBER_LOCK_KEY)
        .await
        .map_err(store_error)?;

    if let Some(parent_id) = po.parent_po.as_deref().filter(|p| !p.is_empty()) {
        let parent = purchase_orders::Entity::find_by_id(parent_id)
            .one(conn)
            .await
            .map_err(store_error)?
            .ok_or(PoNumberError::ParentNotFound)?;
        if !is_recurring(&po.po_type) || !is_recurring(&parent.po_type) {
            return Err(PoNumberError::ParentNotRecurring);
        }
        if parent.po_number.is_empty() {
            return Err(PoNumberError::ParentMissingNumber);
        }

        let existing = numbers_with_prefix(conn, &format!("{}-", parent.po_number)).await?;
        for candidate in child_candidates(&parent.po_number, &existing) {
            if !is_taken(conn, &candidate).await? {
                return Ok(candidate);
            }
        }
        return Err(PoNumberError::Exhausted(parent.po_number));
    }

    let prefix = month_prefix(now);
    let existing = numbers_with_prefix(conn, &format!("{prefix}-")).await?;
    for candidate in parent_candidates(&prefix, &existing) {
        if !is_taken(conn, &candidate).await? {
            return Ok(candidate);
        }
    }
    Err(PoNumberError::Exhausted(prefix))
}
