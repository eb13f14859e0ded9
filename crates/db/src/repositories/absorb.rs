//! Record absorption and its undo.
//!
//! Table and column names come from the static descriptors on
//! [`AbsorbCollection`]; only ids travel as bind parameters.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, QueryFilter, Set, Statement,
};
use serde_json::Value;

use backoffice_core::absorb::{AbsorbCollection, AbsorbError, AbsorbPlan, UpdatedReferences};
use backoffice_core::claims::ClaimName;
use backoffice_core::config_gate::EditingGate;
use backoffice_shared::types::{UserId, generate_record_id};

use crate::entities::absorb_actions;
use crate::repositories::claims::has_claim;
use crate::repositories::config::gate_enabled;
use crate::tx::SerializableExt;

fn stmt(sql: String, values: Vec<sea_orm::Value>) -> Statement {
    Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
}

/// Absorb repository.
#[derive(Debug, Clone)]
pub struct AbsorbRepository {
    db: DatabaseConnection,
}

impl AbsorbRepository {
    /// Creates a new absorb repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Merges `ids_to_absorb` into `target_id`.
    ///
    /// References to the sources are rewritten to the target, the sources
    /// are deleted, and an audit row is written so the merge can be undone.
    ///
    /// # Errors
    ///
    /// Any [`AbsorbError`]; nothing is changed on error.
    pub async fn absorb(
        &self,
        collection: AbsorbCollection,
        target_id: &str,
        ids_to_absorb: &[String],
        caller: &UserId,
    ) -> Result<String, AbsorbError> {
        let tx = self
            .db
            .serializable()
            .await
            .map_err(|e| AbsorbError::database("error_starting_transaction", e))?;
        let conn = tx.transaction();

        let plan = AbsorbPlan::new(
            collection,
            target_id,
            ids_to_absorb,
            caller_may_absorb(conn, caller).await?,
            gate_enabled(conn, EditingGate::Jobs).await,
        )?;

        if find_action(conn, collection).await?.is_some() {
            return Err(AbsorbError::ActionExists(collection.name().to_string()));
        }

        let target = fetch_row(conn, collection, &plan.target_id)
            .await?
            .ok_or(AbsorbError::TargetNotFound)?;

        let malformed = plan.malformed_ids();
        if !malformed.is_empty() {
            return Err(AbsorbError::database(
                "error_populating_temp_table",
                format!("malformed ids: {}", malformed.join(", ")),
            ));
        }

        let mut absorbed = Vec::with_capacity(plan.source_ids.len());
        for id in &plan.source_ids {
            let row = fetch_row(conn, collection, id)
                .await?
                .ok_or_else(|| AbsorbError::SourceNotFound(id.clone()))?;
            if let Some(column) = collection.parent_column() {
                plan.check_parent(
                    target.get(column).and_then(Value::as_str),
                    row.get(column).and_then(Value::as_str),
                )?;
            }
            absorbed.push(row);
        }

        populate_ids(conn, &plan.source_ids).await?;
        let updated = rewrite_references(conn, collection, &plan.target_id).await?;

        conn.execute(stmt(
            format!(
                "DELETE FROM {} WHERE id IN (SELECT old_id FROM ids_to_absorb)",
                collection.table()
            ),
            vec![],
        ))
        .await
        .map_err(|e| AbsorbError::database("error_deleting_absorbed_records", e))?;

        conn.execute_unprepared("DROP TABLE ids_to_absorb")
            .await
            .map_err(|e| AbsorbError::database("error_dropping_temp_table", e))?;

        let updated_json = serde_json::to_value(&updated)
            .map_err(|e| AbsorbError::database("error_recording_absorb_action", e))?;
        absorb_actions::ActiveModel {
            id: Set(generate_record_id()),
            collection_name: Set(collection.name().to_string()),
            target_id: Set(plan.target_id.clone()),
            absorbed_records: Set(Value::Array(absorbed)),
            updated_references: Set(updated_json),
            uid: Set(caller.to_string()),
            created: Set(chrono::Utc::now().into()),
        }
        .insert(conn)
        .await
        .map_err(|e| AbsorbError::database("error_recording_absorb_action", e))?;

        tx.commit()
            .await
            .map_err(|e| AbsorbError::database("error_committing_absorb", e))?;
        tracing::info!(
            collection = collection.name(),
            target_id = %plan.target_id,
            absorbed = plan.source_ids.len(),
            references = updated.len(),
            user_id = %caller,
            "records absorbed"
        );
        Ok(plan.success_message())
    }

    /// Reverts the pending absorb on `collection`.
    ///
    /// # Errors
    ///
    /// `unauthorized_absorb`, `jobs_editing_disabled`,
    /// `absorb_action_not_found`, `corrupt_absorb_action` or a store error.
    pub async fn undo_absorb(
        &self,
        collection: AbsorbCollection,
        caller: &UserId,
    ) -> Result<String, AbsorbError> {
        let tx = self
            .db
            .serializable()
            .await
            .map_err(|e| AbsorbError::database("error_starting_transaction", e))?;
        let conn = tx.transaction();

        if !caller_may_absorb(conn, caller).await? {
            return Err(AbsorbError::Unauthorized);
        }
        if !gate_enabled(conn, EditingGate::Jobs).await {
            return Err(AbsorbError::JobsEditingDisabled);
        }

        let action = find_action(conn, collection)
            .await?
            .ok_or_else(|| AbsorbError::ActionNotFound(collection.name().to_string()))?;
        let Value::Array(records) = &action.absorbed_records else {
            return Err(AbsorbError::CorruptAction(
                "absorbed_records is not an array".to_string(),
            ));
        };
        let updated: UpdatedReferences =
            serde_json::from_value(action.updated_references.clone())
                .map_err(|e| AbsorbError::CorruptAction(e.to_string()))?;

        let table = collection.table();
        for record in records {
            conn.execute(stmt(
                format!(
                    "INSERT INTO {table} SELECT * FROM jsonb_populate_record(NULL::{table}, $1::jsonb)"
                ),
                vec![record.clone().into()],
            ))
            .await
            .map_err(|e| AbsorbError::database("error_restoring_records", e))?;
        }

        for (child, row_id, old) in updated.iter() {
            let column = collection
                .column_for(child)
                .ok_or_else(|| AbsorbError::CorruptAction(format!("unknown table {child}")))?;
            conn.execute(stmt(
                format!("UPDATE {child} SET {column} = $1 WHERE id = $2"),
                vec![old.into(), row_id.into()],
            ))
            .await
            .map_err(|e| AbsorbError::database("error_restoring_references", e))?;
        }

        absorb_actions::Entity::delete_by_id(action.id.as_str())
            .exec(conn)
            .await
            .map_err(|e| AbsorbError::database("error_deleting_absorb_action", e))?;

        tx.commit()
            .await
            .map_err(|e| AbsorbError::database("error_committing_undo", e))?;
        tracing::info!(
            collection = collection.name(),
            target_id = %action.target_id,
            restored = records.len(),
            references = updated.len(),
            user_id = %caller,
            "absorb undone"
        );
        Ok(format!(
            "Successfully undid absorb of {} records into {}",
            records.len(),
            action.target_id
        ))
    }
}

async fn caller_may_absorb<C: ConnectionTrait>(
    conn: &C,
    caller: &UserId,
) -> Result<bool, AbsorbError> {
    has_claim(conn, caller, ClaimName::Absorb)
        .await
        .map_err(|e| AbsorbError::database("error_fetching_user_claims", e))
}

async fn find_action<C: ConnectionTrait>(
    conn: &C,
    collection: AbsorbCollection,
) -> Result<Option<absorb_actions::Model>, AbsorbError> {
    absorb_actions::Entity::find()
        .filter(absorb_actions::Column::CollectionName.eq(collection.name()))
        .one(conn)
        .await
        .map_err(|e| AbsorbError::database("error_fetching_absorb_action", e))
}

/// The full row as JSON, or `None` if it does not exist.
async fn fetch_row<C: ConnectionTrait>(
    conn: &C,
    collection: AbsorbCollection,
    id: &str,
) -> Result<Option<Value>, AbsorbError> {
    let row = conn
        .query_one(stmt(
            format!(
                "SELECT to_jsonb(t) AS row FROM {} t WHERE t.id = $1",
                collection.table()
            ),
            vec![id.into()],
        ))
        .await
        .map_err(|e| AbsorbError::database("error_fetching_record", e))?;
    row.map(|r| r.try_get::<Value>("", "row"))
        .transpose()
        .map_err(|e: DbErr| AbsorbError::database("error_fetching_record", e))
}

async fn populate_ids<C: ConnectionTrait>(conn: &C, ids: &[String]) -> Result<(), AbsorbError> {
    conn.execute_unprepared(
        "CREATE TEMP TABLE ids_to_absorb (old_id TEXT NOT NULL) ON COMMIT DROP",
    )
    .await
    .map_err(|e| AbsorbError::database("error_creating_temp_table", e))?;

    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("(${i})")).collect();
    conn.execute(stmt(
        format!(
            "INSERT INTO ids_to_absorb (old_id) VALUES {}",
            placeholders.join(", ")
        ),
        ids.iter().map(|id| id.as_str().into()).collect(),
    ))
    .await
    .map_err(|e| AbsorbError::database("error_populating_temp_table", e))?;
    Ok(())
}

/// Points every reference at `target_id`, returning the previous values.
async fn rewrite_references<C: ConnectionTrait>(
    conn: &C,
    collection: AbsorbCollection,
    target_id: &str,
) -> Result<UpdatedReferences, AbsorbError> {
    let mut updated = UpdatedReferences::default();
    for reference in collection.references() {
        let (table, column) = (reference.table, reference.column);
        let rows = conn
            .query_all(stmt(
                format!(
                    "SELECT id, {column} AS old FROM {table} \
                     WHERE {column} IN (SELECT old_id FROM ids_to_absorb)"
                ),
                vec![],
            ))
            .await
            .map_err(|e| AbsorbError::database("error_updating_references", e))?;
        for row in rows {
            let id: String = row
                .try_get("", "id")
                .map_err(|e| AbsorbError::database("error_updating_references", e))?;
            let old: String = row
                .try_get("", "old")
                .map_err(|e| AbsorbError::database("error_updating_references", e))?;
            updated.track(table, id, old);
        }

        conn.execute(stmt(
            format!(
                "UPDATE {table} SET {column} = $1 \
                 WHERE EXISTS (SELECT 1 FROM ids_to_absorb WHERE old_id = {table}.{column})"
            ),
            vec![target_id.into()],
        ))
        .await
        .map_err(|e| AbsorbError::database("error_updating_references", e))?;
    }
    Ok(updated)
}
