//! Machine secret administration routes.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;

use backoffice_db::{CreatedSecret, MachineSecretRepository, SecretSummary};

use crate::{
    AppState,
    error::{ApiError, invalid_request_body},
    middleware::AuthUser,
};

/// Creates the machine secret routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/machine_secrets/create", post(create_secret))
        .route("/machine_secrets/list", get(list_secrets))
}

/// Request body for minting a secret.
#[derive(Debug, Deserialize)]
pub struct CreateSecretRequest {
    /// Validity in days.
    pub days: i64,
    /// Role name.
    pub role: String,
}

/// POST `/machine_secrets/create`
///
/// The plain secret appears only in this response.
async fn create_secret(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<CreateSecretRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedSecret>), ApiError> {
    let Ok(Json(body)) = body else {
        return Err(invalid_request_body());
    };
    let created = MachineSecretRepository::new((*state.db).clone())
        .create(auth.user_id(), body.days, &body.role, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET `/machine_secrets/list`
async fn list_secrets(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<SecretSummary>>, ApiError> {
    let secrets = MachineSecretRepository::new((*state.db).clone())
        .list(auth.user_id())
        .await?;
    Ok(Json(secrets))
}
