//! User repository for database operations.
//!
//! Users are owned by the external identity store; this crate only reads
//! them (and the seeder writes fixtures).

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set,
};

use backoffice_shared::types::UserId;

use crate::entities::users;

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id.as_str()).one(&self.db).await
    }

    /// Finds an active user by ID. Inactive users read as missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active(&self, id: &UserId) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id.as_str())
            .filter(users::Column::Active.eq(true))
            .one(&self.db)
            .await
    }

    /// Creates a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        id: &UserId,
        email: &str,
        given_name: &str,
        surname: &str,
    ) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(id.to_string()),
            email: Set(email.to_string()),
            given_name: Set(given_name.to_string()),
            surname: Set(surname.to_string()),
            active: Set(true),
            created: Set(now),
            updated: Set(now),
        };

        user.insert(&self.db).await
    }
}

/// Display name of a user, or an empty string when the user is unknown.
pub(crate) async fn display_name<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> Result<String, DbErr> {
    Ok(users::Entity::find_by_id(id)
        .one(conn)
        .await?
        .map(|u| u.full_name())
        .unwrap_or_default())
}
