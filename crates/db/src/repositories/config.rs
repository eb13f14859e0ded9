//! Runtime configuration reads.
//!
//! Rows are re-read on every call so administrators' changes apply to the
//! next request. Read failures fail open.

use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use serde_json::Value;

use backoffice_core::config_gate::{EXPENSES_DOMAIN, EditingGate, normalize_bag};

use crate::entities::app_config;

/// `app_config` repository.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    db: DatabaseConnection,
}

impl ConfigRepository {
    /// Creates a new config repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Evaluates an editing gate.
    pub async fn is_enabled(&self, gate: EditingGate) -> bool {
        gate_enabled(&self.db, gate).await
    }

    /// Writes a domain bag, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn set_domain(&self, domain: &str, value: Value) -> Result<(), DbErr> {
        let existing = app_config::Entity::find_by_id(domain).one(&self.db).await?;
        let now = chrono::Utc::now().into();
        match existing {
            Some(row) => {
                let mut active: app_config::ActiveModel = row.into();
                active.value = Set(value);
                active.updated = Set(now);
                active.update(&self.db).await?;
            }
            None => {
                app_config::ActiveModel {
                    key: Set(domain.to_string()),
                    value: Set(value),
                    description: Set(String::new()),
                    updated: Set(now),
                }
                .insert(&self.db)
                .await?;
            }
        }
        Ok(())
    }
}

/// Normalized bag of `domain`; `None` when missing or unreadable.
pub(crate) async fn domain_bag<C: ConnectionTrait>(conn: &C, domain: &str) -> Option<Value> {
    match app_config::Entity::find_by_id(domain).one(conn).await {
        Ok(row) => row.and_then(|r| normalize_bag(r.value)),
        Err(e) => {
            tracing::warn!(domain, error = %e, "app_config read failed, failing open");
            None
        }
    }
}

pub(crate) async fn gate_enabled<C: ConnectionTrait>(conn: &C, gate: EditingGate) -> bool {
    gate.is_enabled(domain_bag(conn, gate.domain()).await.as_ref())
}

pub(crate) async fn expenses_bag<C: ConnectionTrait>(conn: &C) -> Option<Value> {
    domain_bag(conn, EXPENSES_DOMAIN).await
}
