//! API route definitions.

use axum::{Router, middleware};

use backoffice_core::machine_token::MachineRole;

use crate::{
    AppState,
    middleware::{MachineGuard, auth::auth_middleware, require_machine_role},
};

pub mod absorb;
pub mod approvers;
pub mod expenses;
pub mod health;
pub mod machine_secrets;
pub mod purchase_orders;
pub mod writeback;

/// Creates the API router with session- and machine-protected routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(purchase_orders::routes())
        .merge(approvers::routes())
        .merge(expenses::routes())
        .merge(machine_secrets::routes())
        .merge(absorb::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let machine_routes = writeback::routes().layer(middleware::from_fn_with_state(
        MachineGuard {
            state: state.clone(),
            role: MachineRole::LegacyWriteback,
        },
        require_machine_role,
    ));

    Router::new()
        .merge(health::routes())
        .merge(machine_routes)
        .merge(protected_routes)
}
