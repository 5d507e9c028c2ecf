//! API Route Definitions
//!
//! Route tree split into three tiers: public authentication endpoints,
//! token-protected account endpoints, and administrator endpoints that
//! additionally require the administrator role.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};

use super::handlers::*;
use super::middleware::{auth_middleware, require_admin};

/// Endpoints reachable without a token
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/roles", get(list_registration_roles))
        .route("/auth/register", post(register))
        .route("/auth/verify", post(verify_account))
        .route("/auth/login", post(login))
        .route("/auth/login/verify", post(verify_two_factor))
        .route("/auth/password-reset", post(request_password_reset))
        .route("/auth/password-reset/confirm", post(confirm_password_reset))
}

/// Endpoints for the authenticated account
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account", get(get_profile))
        .route("/account/password", put(change_password))
        .route("/account/two-factor", put(set_two_factor))
}

/// Administrator-only endpoints
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/accounts/{national_id}",
            get(find_account_by_national_id),
        )
        .route("/admin/accounts/{national_id}/state", put(set_account_state))
        .route("/admin/citizens/{national_id}", get(lookup_citizen))
        .layer(from_fn(require_admin))
}

/// Build the full application router
pub fn create_routes(state: AppState) -> Router {
    let protected = account_routes()
        .merge(admin_routes())
        .layer(from_fn_with_state(state.jwt_service.clone(), auth_middleware));

    public_routes()
        .merge(protected)
        .with_state(state)
}
