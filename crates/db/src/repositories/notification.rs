//! Notification emitter.
//!
//! Emissions are rows in `notifications` with status `pending`, written in
//! the caller's transaction so the mailer only ever sees notifications whose
//! originating change committed. Best-effort emissions run inside a
//! savepoint; a failure is logged and rolled back to it.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use backoffice_core::notifications::{
    NotificationData, NotificationIntent, NotificationStatus, TemplateCode,
};
use backoffice_shared::types::{UserId, generate_record_id};

use crate::entities::{notification_templates, notifications};

/// Notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Queues a notification outside any lifecycle transaction.
    ///
    /// # Errors
    ///
    /// Returns an error for a required emission whose template is missing
    /// or whose insert fails.
    pub async fn emit(
        &self,
        intent: &NotificationIntent,
        data: &NotificationData,
        actor: Option<&UserId>,
    ) -> Result<Option<notifications::Model>, DbErr> {
        emit(&self.db, intent, data, actor).await
    }

    /// Pending notifications for `recipient`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn pending_for(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<(notifications::Model, Option<notification_templates::Model>)>, DbErr> {
        notifications::Entity::find()
            .find_also_related(notification_templates::Entity)
            .filter(notifications::Column::Recipient.eq(recipient.as_str()))
            .filter(notifications::Column::Status.eq(NotificationStatus::Pending.as_str()))
            .order_by_asc(notifications::Column::Created)
            .all(&self.db)
            .await
    }
}

async fn insert<C: ConnectionTrait>(
    conn: &C,
    template: &notification_templates::Model,
    intent: &NotificationIntent,
    data: &NotificationData,
    actor: Option<&UserId>,
) -> Result<notifications::Model, DbErr> {
    let data = serde_json::to_value(data).map_err(|e| DbErr::Custom(e.to_string()))?;
    let now = chrono::Utc::now().into();
    notifications::ActiveModel {
        id: Set(generate_record_id()),
        recipient: Set(intent.recipient.to_string()),
        template: Set(template.id.clone()),
        status: Set(NotificationStatus::Pending.as_str().to_string()),
        data: Set(data),
        actor: Set(actor.map(ToString::to_string)),
        error: Set(String::new()),
        created: Set(now),
        updated: Set(now),
    }
    .insert(conn)
    .await
}

async fn find_template<C: ConnectionTrait>(
    conn: &C,
    code: TemplateCode,
) -> Result<Option<notification_templates::Model>, DbErr> {
    notification_templates::Entity::find()
        .filter(notification_templates::Column::Code.eq(code.as_str()))
        .one(conn)
        .await
}

/// Queues `intent` on `conn`.
///
/// Returns `Ok(None)` when a best-effort emission was skipped.
pub(crate) async fn emit<C>(
    conn: &C,
    intent: &NotificationIntent,
    data: &NotificationData,
    actor: Option<&UserId>,
) -> Result<Option<notifications::Model>, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    if intent.required {
        let template = find_template(conn, intent.template)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound(format!("notification template {}", intent.template))
            })?;
        let row = insert(conn, &template, intent, data, actor).await?;
        tracing::debug!(notification_id = %row.id, template = %intent.template, recipient = %intent.recipient, "notification queued");
        return Ok(Some(row));
    }

    let savepoint = conn.begin().await?;
    let outcome = match find_template(&savepoint, intent.template).await {
        Ok(Some(template)) => insert(&savepoint, &template, intent, data, actor)
            .await
            .map(Some),
        Ok(None) => Ok(None),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(Some(row)) => {
            savepoint.commit().await?;
            tracing::debug!(notification_id = %row.id, template = %intent.template, recipient = %intent.recipient, "notification queued");
            Ok(Some(row))
        }
        Ok(None) => {
            savepoint.rollback().await?;
            tracing::warn!(template = %intent.template, recipient = %intent.recipient, "notification template missing, skipping");
            Ok(None)
        }
        Err(e) => {
            savepoint.rollback().await?;
            tracing::warn!(template = %intent.template, recipient = %intent.recipient, error = %e, "best-effort notification failed");
            Ok(None)
        }
    }
}
