//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Serializable transactions and the PO-number advisory lock
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod tx;

pub use repositories::{
    AbsorbRepository, ApproverRepository, ClaimRepository, ConfigRepository, CreatedSecret,
    ExpenseRepository, MachineSecretRepository, NotificationRepository, PurchaseOrderRepository,
    SecretSummary, UserRepository,
};

use std::time::Duration;

use backoffice_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}

/// Establishes a connection to `database_url` with default pool settings.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_url(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Round-trips `SELECT 1`.
///
/// # Errors
///
/// Returns an error if the database does not answer.
pub async fn ping(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute_unprepared("SELECT 1").await?;
    Ok(())
}
