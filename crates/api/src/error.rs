//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use backoffice_shared::AppError;

/// An error rendered as `{ "code", "message" }` with the kind's status.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Returns the wrapped error.
    #[must_use]
    pub fn inner(&self) -> &AppError {
        &self.0
    }
}

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.0.is_server_error() {
            tracing::error!(code = self.0.error_code(), message = self.0.message(), "request failed");
        }
        (
            status,
            Json(json!({
                "code": self.0.error_code(),
                "message": self.0.message(),
            })),
        )
            .into_response()
    }
}

/// The error for an unparseable request body.
#[must_use]
pub fn invalid_request_body() -> ApiError {
    ApiError(AppError::invalid_input(
        "invalid_request_body",
        "Invalid request body",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::purchase_order::PurchaseOrderError;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use serde_json::Value;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_renders_code_and_message() {
        let (status, body) = render(PurchaseOrderError::NotUnapproved.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "po_not_unapproved");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[rstest]
    #[case(AppError::not_found("po_not_found", "m"), StatusCode::NOT_FOUND)]
    #[case(AppError::forbidden("unauthorized_approval", "m"), StatusCode::FORBIDDEN)]
    #[case(AppError::unauthenticated("m"), StatusCode::UNAUTHORIZED)]
    #[case(AppError::downstream("error_updating_purchase_order", "boom"), StatusCode::INTERNAL_SERVER_ERROR)]
    #[tokio::test]
    async fn test_status_follows_kind(#[case] err: AppError, #[case] status: StatusCode) {
        let code = err.error_code();
        let (actual, body) = render(ApiError(err)).await;
        assert_eq!(actual, status);
        assert_eq!(body["code"], code);
    }

    #[tokio::test]
    async fn test_invalid_request_body() {
        let (status, body) = render(invalid_request_body()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_request_body");
    }
}
