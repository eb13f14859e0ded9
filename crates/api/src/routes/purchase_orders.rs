//! Purchase order lifecycle routes.
//!
//! Every transition answers with the updated record.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::post,
};
use chrono::Utc;
use serde::Deserialize;

use backoffice_core::purchase_order::{PurchaseOrderError, RejectionReason};
use backoffice_db::{PurchaseOrderRepository, entities::purchase_orders};
use backoffice_shared::types::PurchaseOrderId;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the purchase order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchase_orders/{id}/approve", post(approve))
        .route("/purchase_orders/{id}/reject", post(reject))
        .route("/purchase_orders/{id}/cancel", post(cancel))
        .route("/purchase_orders/{id}/close", post(close))
        .route("/purchase_orders/{id}/make_cumulative", post(make_cumulative))
}

/// Request body for rejecting a purchase order.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Why the purchase order is rejected.
    pub rejection_reason: Option<String>,
}

type PoResponse = Result<Json<purchase_orders::Model>, ApiError>;

/// Unparseable ids cannot name a record.
fn po_id(raw: String) -> Result<PurchaseOrderId, ApiError> {
    raw.parse().map_err(|_| PurchaseOrderError::NotFound.into())
}

fn repo(state: &AppState) -> PurchaseOrderRepository {
    PurchaseOrderRepository::new((*state.db).clone())
}

/// POST `/purchase_orders/{id}/approve`
async fn approve(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> PoResponse {
    let id = po_id(id)?;
    let po = repo(&state).approve(&id, auth.user_id(), Utc::now()).await?;
    Ok(Json(po))
}

/// POST `/purchase_orders/{id}/reject`
async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<RejectRequest>, JsonRejection>,
) -> PoResponse {
    let Ok(Json(body)) = body else {
        return Err(PurchaseOrderError::InvalidRequestBody.into());
    };
    let reason = RejectionReason::parse(body.rejection_reason.as_deref())?;
    let id = po_id(id)?;
    let po = repo(&state)
        .reject(&id, auth.user_id(), reason, Utc::now())
        .await?;
    Ok(Json(po))
}

/// POST `/purchase_orders/{id}/cancel`
async fn cancel(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> PoResponse {
    let id = po_id(id)?;
    let po = repo(&state).cancel(&id, auth.user_id(), Utc::now()).await?;
    Ok(Json(po))
}

/// POST `/purchase_orders/{id}/close`
async fn close(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> PoResponse {
    let id = po_id(id)?;
    let po = repo(&state).close(&id, auth.user_id(), Utc::now()).await?;
    Ok(Json(po))
}

/// POST `/purchase_orders/{id}/make_cumulative`
async fn make_cumulative(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> PoResponse {
    let id = po_id(id)?;
    let po = repo(&state).make_cumulative(&id, auth.user_id()).await?;
    Ok(Json(po))
}
