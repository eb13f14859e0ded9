//! Session authentication for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use backoffice_db::UserRepository;
use backoffice_shared::types::UserId;
use backoffice_shared::{AppError, JwtError};

use crate::{AppState, error::ApiError};

/// Validates the bearer session token and resolves the caller.
///
/// The token's subject must name an existing, active user. The caller's id
/// is stored in request extensions for [`AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>()
    else {
        return Err(AppError::unauthenticated("Authorization header with Bearer token is required").into());
    };

    let claims = state
        .jwt_service
        .validate_token(bearer.token())
        .map_err(|e| match e {
            JwtError::Expired => AppError::unauthenticated("Token has expired"),
            _ => AppError::unauthenticated("Invalid or malformed token"),
        })?;
    let user_id = claims
        .user_id()
        .map_err(|_| AppError::unauthenticated("Invalid or malformed token"))?;

    let user = UserRepository::new((*state.db).clone())
        .find_active(&user_id)
        .await
        .map_err(|e| AppError::downstream("error_fetching_user", e))?;
    if user.is_none() {
        tracing::debug!(user_id = %user_id, "token for unknown or inactive user");
        return Err(AppError::unauthenticated("User is not active").into());
    }
    Ok(AuthUser(user_id))
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

impl AuthUser {
    /// Returns the caller's user id.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::unauthenticated("Authentication required").into())
    }
}
