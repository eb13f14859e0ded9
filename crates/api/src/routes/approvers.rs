//! Approver candidate lookups for a prospective purchase order.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use backoffice_core::approvers::{Approver, ApproverError, ExpenditureKind, SecondApproverMeta};
use backoffice_db::ApproverRepository;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the approver lookup routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/purchase_orders/approvers/{division}/{amount}",
            get(list_approvers),
        )
        .route(
            "/purchase_orders/second_approvers/{division}/{amount}",
            get(list_second_approvers),
        )
}

/// Optional lookup parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ApproverParams {
    /// Expenditure kind, `capital` when absent.
    pub kind: Option<String>,
    /// Whether the purchase order is attributed to a job.
    #[serde(default)]
    pub has_job: bool,
}

impl ApproverParams {
    fn kind(&self) -> Result<ExpenditureKind, ApproverError> {
        self.kind
            .as_deref()
            .map_or(Ok(ExpenditureKind::Capital), ExpenditureKind::parse)
    }
}

/// Second-approver lookup response.
#[derive(Debug, Serialize)]
pub struct SecondApproversResponse {
    /// Candidates other than the caller.
    pub approvers: Vec<Approver>,
    /// How the lookup was decided.
    pub meta: SecondApproverMeta,
}

/// Parses a path amount; it must be a non-negative decimal.
fn parse_amount(raw: &str) -> Result<Decimal, ApproverError> {
    match Decimal::from_str(raw.trim()) {
        Ok(amount) if !amount.is_sign_negative() => Ok(amount),
        _ => Err(ApproverError::InvalidAmount),
    }
}

/// GET `/purchase_orders/approvers/{division}/{amount}`
async fn list_approvers(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((division, amount)): Path<(String, String)>,
    Query(params): Query<ApproverParams>,
) -> Result<Json<Vec<Approver>>, ApiError> {
    let amount = parse_amount(&amount)?;
    let approvers = ApproverRepository::new((*state.db).clone())
        .approvers(auth.user_id(), &division, amount, params.kind()?, params.has_job)
        .await?;
    Ok(Json(approvers))
}

/// GET `/purchase_orders/second_approvers/{division}/{amount}`
async fn list_second_approvers(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((division, amount)): Path<(String, String)>,
    Query(params): Query<ApproverParams>,
) -> Result<Json<SecondApproversResponse>, ApiError> {
    let amount = parse_amount(&amount)?;
    let (approvers, meta) = ApproverRepository::new((*state.db).clone())
        .second_approvers(auth.user_id(), &division, amount, params.kind()?, params.has_job)
        .await?;
    Ok(Json(SecondApproversResponse { approvers, meta }))
}
