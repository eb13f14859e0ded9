//! Machine secret storage.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use backoffice_core::claims::ClaimName;
use backoffice_core::machine_token::{MachineRole, MachineSecretError, MachineTokens, StoredSecret};
use backoffice_shared::types::{MachineSecretId, UserId};

use crate::entities::machine_secrets;
use crate::repositories::claims::has_claim;

/// A newly created secret. The plain secret is only ever returned here.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedSecret {
    /// Record id.
    pub id: MachineSecretId,
    /// Plain secret.
    pub secret: String,
    /// Expiry.
    pub expiry: DateTime<Utc>,
    /// Role.
    pub role: MachineRole,
}

/// A listed secret, without hash or salt.
#[derive(Debug, Clone, Serialize)]
pub struct SecretSummary {
    /// Record id.
    pub id: String,
    /// Role.
    pub role: String,
    /// Expiry.
    pub expiry: DateTime<Utc>,
}

/// Machine secret repository.
#[derive(Debug, Clone)]
pub struct MachineSecretRepository {
    db: DatabaseConnection,
}

impl MachineSecretRepository {
    /// Creates a new machine secret repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Mints and stores a secret for `role` valid for `days`.
    ///
    /// # Errors
    ///
    /// `admin_claim_required`, `invalid_days`, `invalid_role` or a store error.
    pub async fn create(
        &self,
        caller: &UserId,
        days: i64,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<CreatedSecret, MachineSecretError> {
        self.require_admin(caller).await?;
        let role = MachineTokens::validate_request(days, role)?;
        let minted = MachineTokens::mint(role, days, now);

        let id = MachineSecretId::generate();
        machine_secrets::ActiveModel {
            id: Set(id.to_string()),
            sha256_hash: Set(minted.sha256_hash),
            salt: Set(minted.salt),
            role: Set(role.as_str().to_string()),
            expiry: Set(minted.expiry.into()),
            created: Set(now.into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| MachineSecretError::database("error_creating_machine_secret", e))?;

        tracing::info!(secret_id = %id, role = %role, user_id = %caller, expiry = %minted.expiry, "machine secret created");
        Ok(CreatedSecret {
            id,
            secret: minted.secret,
            expiry: minted.expiry,
            role,
        })
    }

    /// Lists stored secrets, soonest expiry first.
    ///
    /// # Errors
    ///
    /// `admin_claim_required` or a store error.
    pub async fn list(&self, caller: &UserId) -> Result<Vec<SecretSummary>, MachineSecretError> {
        self.require_admin(caller).await?;
        let rows = machine_secrets::Entity::find()
            .order_by_asc(machine_secrets::Column::Expiry)
            .all(&self.db)
            .await
            .map_err(|e| MachineSecretError::database("error_fetching_machine_secrets", e))?;
        Ok(rows
            .into_iter()
            .map(|r| SecretSummary {
                id: r.id,
                role: r.role,
                expiry: r.expiry.with_timezone(&Utc),
            })
            .collect())
    }

    /// True if `token` matches an unexpired secret of `role`.
    ///
    /// # Errors
    ///
    /// Returns a store error if the secrets cannot be read.
    pub async fn verify(
        &self,
        token: &str,
        role: MachineRole,
        now: DateTime<Utc>,
    ) -> Result<bool, MachineSecretError> {
        let rows = machine_secrets::Entity::find()
            .filter(machine_secrets::Column::Role.eq(role.as_str()))
            .filter(machine_secrets::Column::Expiry.gt(now))
            .all(&self.db)
            .await
            .map_err(|e| MachineSecretError::database("error_fetching_machine_secrets", e))?;
        let stored: Vec<StoredSecret> = rows
            .into_iter()
            .map(|r| StoredSecret {
                sha256_hash: r.sha256_hash,
                salt: r.salt,
                role: r.role,
                expiry: r.expiry.with_timezone(&Utc),
            })
            .collect();
        Ok(MachineTokens::verify(token, role, &stored, now))
    }

    async fn require_admin(&self, caller: &UserId) -> Result<(), MachineSecretError> {
        let is_admin = has_claim(&self.db, caller, ClaimName::Admin)
            .await
            .map_err(|e| MachineSecretError::database("error_fetching_user_claims", e))?;
        if is_admin {
            Ok(())
        } else {
            Err(MachineSecretError::AdminRequired)
        }
    }
}
