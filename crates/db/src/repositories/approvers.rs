//! Approver candidate queries and approval thresholds.

use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder};

use backoffice_core::approvers::{
    ApprovalThresholds, Approver, ApproverError, ApproverQuery, ApproverResolver,
    ApproverSelection, ApproverTier, ExpenditureKind, SecondApproverMeta, SecondTierMode,
};
use backoffice_shared::types::UserId;
use backoffice_shared::{AppError, AppResult};

use crate::entities::{divisions, po_approval_thresholds};
use crate::repositories::claims::approver_records;
use crate::tx::conflict_or;

/// Approver repository.
#[derive(Debug, Clone)]
pub struct ApproverRepository {
    db: DatabaseConnection,
}

impl ApproverRepository {
    /// Creates a new approver repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// First-tier approvers for a prospective purchase order, excluding the
    /// requester.
    ///
    /// # Errors
    ///
    /// `invalid_division`, `thresholds_missing` or a downstream error.
    pub async fn approvers(
        &self,
        requester: &UserId,
        division: &str,
        amount: Decimal,
        kind: ExpenditureKind,
        has_job: bool,
    ) -> AppResult<Vec<Approver>> {
        let query = self
            .query(division, amount, kind, has_job, ApproverTier::First)
            .await?;
        let thresholds = load_thresholds(&self.db).await?;
        let selection = select(&self.db, &query, &thresholds, Some(requester)).await?;
        Ok(selection.candidates)
    }

    /// Second-tier approvers and the metadata explaining the lookup.
    ///
    /// # Errors
    ///
    /// `invalid_division`, `thresholds_missing` or a downstream error.
    pub async fn second_approvers(
        &self,
        requester: &UserId,
        division: &str,
        amount: Decimal,
        kind: ExpenditureKind,
        has_job: bool,
    ) -> AppResult<(Vec<Approver>, SecondApproverMeta)> {
        let query = self
            .query(
                division,
                amount,
                kind,
                has_job,
                ApproverTier::Second(SecondTierMode::Strict),
            )
            .await?;
        let thresholds = load_thresholds(&self.db).await?;

        let selection = if thresholds.requires_second_approval(amount) {
            select(&self.db, &query, &thresholds, Some(requester)).await?
        } else {
            ApproverSelection::default()
        };
        let meta = SecondApproverMeta::describe(&thresholds, amount, &selection);
        Ok((selection.candidates, meta))
    }

    async fn query(
        &self,
        division: &str,
        amount: Decimal,
        kind: ExpenditureKind,
        has_job: bool,
        tier: ApproverTier,
    ) -> AppResult<ApproverQuery> {
        let query = ApproverQuery::new(division, amount, kind, has_job, tier)?;
        let known = divisions::Entity::find_by_id(query.division.as_str())
            .one(&self.db)
            .await
            .map_err(|e| AppError::downstream("error_fetching_division", e))?;
        if known.is_none() {
            return Err(ApproverError::InvalidDivision.into());
        }
        Ok(query)
    }
}

/// Configured tier ceilings.
///
/// # Errors
///
/// `thresholds_missing` when the table is empty.
pub(crate) async fn load_thresholds<C: ConnectionTrait>(
    conn: &C,
) -> AppResult<ApprovalThresholds> {
    let rows = po_approval_thresholds::Entity::find()
        .order_by_asc(po_approval_thresholds::Column::Tier)
        .all(conn)
        .await
        .map_err(|e| AppError::downstream(conflict_or("error_fetching_thresholds", &e), e))?;
    Ok(ApprovalThresholds::new(
        rows.into_iter().map(|r| r.ceiling).collect(),
    )?)
}

/// Runs `query` against the current approver grants.
pub(crate) async fn select<C: ConnectionTrait>(
    conn: &C,
    query: &ApproverQuery,
    thresholds: &ApprovalThresholds,
    requester: Option<&UserId>,
) -> Result<ApproverSelection, AppError> {
    let records = approver_records(conn, query.tier.claims())
        .await
        .map_err(|e: DbErr| AppError::downstream(conflict_or("error_fetching_user_claims", &e), e))?;
    Ok(ApproverResolver::select(
        &records, query, thresholds, requester,
    ))
}
