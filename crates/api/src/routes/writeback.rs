//! Endpoints for machine callers.

use axum::{Extension, Json, Router, routing::get};
use serde_json::{Value, json};

use crate::{AppState, middleware::MachineCaller};

/// Creates the machine-caller routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/writeback/status", get(status))
}

/// GET `/writeback/status`: lets a machine caller check its credentials.
async fn status(Extension(MachineCaller(role)): Extension<MachineCaller>) -> Json<Value> {
    Json(json!({ "role": role, "ok": true }))
}
