//! Machine-token authentication.
//!
//! Machine callers present a bearer secret minted by an administrator; the
//! guard checks it against the unexpired secrets stored for one role.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use chrono::Utc;

use backoffice_core::machine_token::{MachineRole, MachineSecretError};
use backoffice_db::MachineSecretRepository;

use crate::{AppState, error::ApiError};

/// State for [`require_machine_role`]: the app state and the role a route
/// requires.
#[derive(Clone)]
pub struct MachineGuard {
    /// Application state.
    pub state: AppState,
    /// Required role.
    pub role: MachineRole,
}

/// Role of a verified machine caller, stored in request extensions.
#[derive(Debug, Clone, Copy)]
pub struct MachineCaller(pub MachineRole);

/// Rejects requests without a valid machine token for the guard's role.
pub async fn require_machine_role(
    State(guard): State<MachineGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| bearer.token().to_string());
    let Some(token) = token else {
        return ApiError::from(MachineSecretError::InvalidToken).into_response();
    };

    let repo = MachineSecretRepository::new((*guard.state.db).clone());
    match repo.verify(&token, guard.role, Utc::now()).await {
        Ok(true) => {
            request.extensions_mut().insert(MachineCaller(guard.role));
            next.run(request).await
        }
        Ok(false) => {
            tracing::warn!(role = %guard.role, "machine token rejected");
            ApiError::from(MachineSecretError::InvalidToken).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
