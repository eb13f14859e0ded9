//! Serializable transactions for lifecycle writes.
//!
//! Every lifecycle operation loads, checks and writes inside one
//! `SERIALIZABLE` transaction. PO-number allocation additionally takes a
//! transaction-scoped advisory lock. A concurrent activation that read the
//! numbers before the winner committed fails with a serialization error (or
//! the unique index on `po_number`); [`retry_conflicts`] reruns such attempts
//! from scratch.
//!
//! # Usage
//!
//! ```ignore
//! use backoffice_db::tx::SerializableExt;
//!
//! let tx = db.serializable().await?;
//! let po = PurchaseOrders::find_by_id(id).one(tx.transaction()).await?;
//! tx.commit().await?;
//! ```

use std::future::Future;
use std::time::Duration;

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, IsolationLevel,
    RuntimeErr, Statement, TransactionTrait,
};

use backoffice_shared::AppResult;

/// Advisory lock key held while a PO number is generated.
pub const PO_NUMBER_LOCK_KEY: i64 = 0x504f_4e55_4d42;

/// Error code of a store failure that lost a race with a concurrent
/// transaction and is safe to rerun.
pub const TX_CONFLICT: &str = "transaction_conflict";

/// Attempts made by [`retry_conflicts`] before the conflict is returned.
pub const MAX_TX_ATTEMPTS: u32 = 10;

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const UNIQUE_VIOLATION: &str = "23505";

/// True if `err` is a serialization failure, a deadlock or a unique
/// violation raised by a concurrent writer.
#[must_use]
pub fn is_conflict(err: &DbErr) -> bool {
    let (DbErr::Conn(runtime) | DbErr::Exec(runtime) | DbErr::Query(runtime)) = err else {
        return false;
    };
    match runtime {
        RuntimeErr::SqlxError(sea_orm::sqlx::Error::Database(db)) => matches!(
            db.code().as_deref(),
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED | UNIQUE_VIOLATION)
        ),
        _ => false,
    }
}

/// `code`, or [`TX_CONFLICT`] when `err` is a retryable conflict.
#[must_use]
pub fn conflict_or(code: &'static str, err: &DbErr) -> &'static str {
    if is_conflict(err) { TX_CONFLICT } else { code }
}

/// Runs `attempt` until it succeeds, fails with anything other than
/// [`TX_CONFLICT`], or [`MAX_TX_ATTEMPTS`] attempts have been made.
///
/// Each attempt must open and finish its own transaction.
///
/// # Errors
///
/// The first non-conflict error, or the last conflict.
pub async fn retry_conflicts<T, F, Fut>(operation: &'static str, mut attempt: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(err) if err.error_code() == TX_CONFLICT && tries < MAX_TX_ATTEMPTS => {
                tracing::debug!(operation, attempt = tries, error = %err, "transaction conflict, retrying");
                tokio::time::sleep(Duration::from_millis(5 * u64::from(tries))).await;
                tries += 1;
            }
            result => return result,
        }
    }
}

/// A `SERIALIZABLE` transaction.
///
/// Dropping it without calling [`SerializableTx::commit`] rolls it back.
pub struct SerializableTx {
    txn: DatabaseTransaction,
}

impl SerializableTx {
    /// Begins a serializable transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    pub async fn begin(db: &DatabaseConnection) -> Result<Self, DbErr> {
        let txn = db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;
        Ok(Self { txn })
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction, persisting all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction, discarding all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Extension trait for `DatabaseConnection` to open serializable transactions.
#[async_trait::async_trait]
pub trait SerializableExt {
    /// Begins a serializable transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    async fn serializable(&self) -> Result<SerializableTx, DbErr>;
}

#[async_trait::async_trait]
impl SerializableExt for DatabaseConnection {
    async fn serializable(&self) -> Result<SerializableTx, DbErr> {
        SerializableTx::begin(self).await
    }
}

/// Takes a transaction-scoped advisory lock on `key`.
///
/// The lock is released when the surrounding transaction ends.
///
/// # Errors
///
/// Returns an error if the lock statement fails.
pub async fn advisory_xact_lock<C: ConnectionTrait>(conn: &C, key: i64) -> Result<(), DbErr> {
    conn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock($1)",
        [key.into()],
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_shared::AppError;

    fn conflict() -> AppError {
        AppError::downstream(TX_CONFLICT, "could not serialize access")
    }

    #[test]
    fn test_non_database_errors_are_not_conflicts() {
        assert!(!is_conflict(&DbErr::Custom("boom".to_string())));
        assert!(!is_conflict(&DbErr::RecordNotFound("po".to_string())));
        assert!(!is_conflict(&DbErr::Query(RuntimeErr::Internal(
            "pool timed out".to_string()
        ))));
        assert_eq!(
            conflict_or("error_updating_purchase_order", &DbErr::Custom("boom".to_string())),
            "error_updating_purchase_order"
        );
    }

    #[tokio::test]
    async fn test_retry_reruns_conflicts_until_success() {
        let mut calls = 0;
        let result = retry_conflicts("approve", || {
            calls += 1;
            let outcome = if calls < 3 { Err(conflict()) } else { Ok(calls) };
            async move { outcome }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_retry_returns_other_errors_immediately() {
        let mut calls = 0;
        let result: AppResult<()> = retry_conflicts("approve", || {
            calls += 1;
            async { Err(AppError::not_found("po_not_found", "Purchase order not found")) }
        })
        .await;
        assert_eq!(result.unwrap_err().error_code(), "po_not_found");
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: AppResult<()> = retry_conflicts("approve", || {
            calls += 1;
            async { Err(conflict()) }
        })
        .await;
        assert_eq!(result.unwrap_err().error_code(), TX_CONFLICT);
        assert_eq!(calls, MAX_TX_ATTEMPTS);
    }
}
