//! Claim lookups.
//!
//! The free functions take any connection so they can run inside a
//! lifecycle transaction and see its snapshot.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, QuerySelect, Set,
};
use serde_json::Value;

use backoffice_core::approvers::CandidateRecord;
use backoffice_core::claims::{ClaimName, ClaimPayload};
use backoffice_shared::types::{UserId, generate_record_id};

use crate::entities::{claims, user_claims, users};

/// Claim repository.
#[derive(Debug, Clone)]
pub struct ClaimRepository {
    db: DatabaseConnection,
}

impl ClaimRepository {
    /// Creates a new claim repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the payload of `claim` if `user` holds it.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the payload is malformed.
    pub async fn find(
        &self,
        user: &UserId,
        claim: ClaimName,
    ) -> Result<Option<ClaimPayload>, DbErr> {
        find_claim(&self.db, user, claim).await
    }

    /// True if `user` holds `claim`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn has_claim(&self, user: &UserId, claim: ClaimName) -> Result<bool, DbErr> {
        has_claim(&self.db, user, claim).await
    }

    /// Grants `claim` to `user`, replacing any previous payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim is not in the catalog or the write fails.
    pub async fn grant(
        &self,
        user: &UserId,
        claim: ClaimName,
        payload: Option<Value>,
    ) -> Result<user_claims::Model, DbErr> {
        let catalog = claims::Entity::find()
            .filter(claims::Column::Name.eq(claim.as_str()))
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("claim {claim}")))?;

        user_claims::Entity::delete_many()
            .filter(user_claims::Column::Uid.eq(user.as_str()))
            .filter(user_claims::Column::Cid.eq(catalog.id.as_str()))
            .exec(&self.db)
            .await?;

        user_claims::ActiveModel {
            id: Set(generate_record_id()),
            uid: Set(user.to_string()),
            cid: Set(catalog.id),
            payload: Set(payload),
            created: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }
}

/// Payload of `claim` held by an active `user`, if any.
pub(crate) async fn find_claim<C: ConnectionTrait>(
    conn: &C,
    user: &UserId,
    claim: ClaimName,
) -> Result<Option<ClaimPayload>, DbErr> {
    let row = user_claims::Entity::find()
        .inner_join(claims::Entity)
        .inner_join(users::Entity)
        .filter(user_claims::Column::Uid.eq(user.as_str()))
        .filter(claims::Column::Name.eq(claim.as_str()))
        .filter(users::Column::Active.eq(true))
        .one(conn)
        .await?;

    row.map(|r| {
        ClaimPayload::parse(claim, r.payload.as_ref()).map_err(|e| DbErr::Custom(e.to_string()))
    })
    .transpose()
}

pub(crate) async fn has_claim<C: ConnectionTrait>(
    conn: &C,
    user: &UserId,
    claim: ClaimName,
) -> Result<bool, DbErr> {
    Ok(find_claim(conn, user, claim).await?.is_some())
}

#[derive(Debug, FromQueryResult)]
struct GrantRow {
    uid: String,
    given_name: String,
    surname: String,
    claim_name: String,
    payload: Option<Value>,
}

/// Every active approver grant for `names`.
///
/// Grants whose payload cannot be read are skipped with a warning so one bad
/// row does not hide every other approver.
pub(crate) async fn approver_records<C: ConnectionTrait>(
    conn: &C,
    names: &[ClaimName],
) -> Result<Vec<CandidateRecord>, DbErr> {
    let rows = user_claims::Entity::find()
        .select_only()
        .column(user_claims::Column::Uid)
        .column(users::Column::GivenName)
        .column(users::Column::Surname)
        .column_as(claims::Column::Name, "claim_name")
        .column(user_claims::Column::Payload)
        .inner_join(claims::Entity)
        .inner_join(users::Entity)
        .filter(claims::Column::Name.is_in(names.iter().map(ClaimName::as_str)))
        .filter(users::Column::Active.eq(true))
        .into_model::<GrantRow>()
        .all(conn)
        .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(claim) = ClaimName::parse(&row.claim_name) else {
            continue;
        };
        match ClaimPayload::parse(claim, row.payload.as_ref()) {
            Ok(ClaimPayload::PoApprover(payload)) => records.push(CandidateRecord {
                user_id: UserId::from_db(row.uid),
                given_name: row.given_name,
                surname: row.surname,
                claim,
                payload,
            }),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(user_id = %row.uid, claim = %claim, error = %e, "skipping malformed approver payload");
            }
        }
    }
    Ok(records)
}
