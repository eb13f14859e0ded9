//! Expense commit route.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use chrono::Utc;
use serde_json::{Value, json};

use backoffice_core::reconcile::ReconcileError;
use backoffice_db::repositories::{COMMIT_MESSAGE, ExpenseRepository};
use backoffice_shared::types::ExpenseId;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/expenses/{id}/commit", post(commit))
}

/// POST `/expenses/{id}/commit`
///
/// Commits the expense and reconciles it against its purchase order.
async fn commit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: ExpenseId = id.parse().map_err(|_| ReconcileError::RecordNotFound)?;
    let now = Utc::now();
    let today = state.business.local_date(now);
    let expense = ExpenseRepository::new((*state.db).clone())
        .commit(&id, auth.user_id(), now, today)
        .await?;
    tracing::debug!(expense_id = %expense.id, total = %expense.total, "commit response");
    Ok(Json(json!({ "message": COMMIT_MESSAGE })))
}
