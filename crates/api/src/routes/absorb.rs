//! Record absorption routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::post,
};
use serde::Deserialize;
use serde_json::{Value, json};

use backoffice_core::absorb::AbsorbCollection;
use backoffice_db::AbsorbRepository;

use crate::{
    AppState,
    error::{ApiError, invalid_request_body},
    middleware::AuthUser,
};

/// Creates the absorb routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{collection}/{id}/absorb", post(absorb))
        .route("/{collection}/undo_absorb", post(undo_absorb))
}

/// Request body for absorbing records.
#[derive(Debug, Deserialize)]
pub struct AbsorbRequest {
    /// Records to merge into the target.
    pub ids_to_absorb: Vec<String>,
}

/// POST `/{collection}/{id}/absorb`
async fn absorb(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((collection, id)): Path<(String, String)>,
    body: Result<Json<AbsorbRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let collection = AbsorbCollection::parse(&collection)?;
    let Ok(Json(body)) = body else {
        return Err(invalid_request_body());
    };
    let message = AbsorbRepository::new((*state.db).clone())
        .absorb(collection, &id, &body.ids_to_absorb, auth.user_id())
        .await?;
    Ok(Json(json!({ "message": message })))
}

/// POST `/{collection}/undo_absorb`
async fn undo_absorb(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(collection): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let collection = AbsorbCollection::parse(&collection)?;
    let message = AbsorbRepository::new((*state.db).clone())
        .undo_absorb(collection, auth.user_id())
        .await?;
    Ok(Json(json!({ "message": message })))
}
