//! Router assembly.

use crate::auth::{AppState, authenticate, login_callback, logout, session_info, webhook};
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Builds the teamgate router with only its own routes.
pub fn router(state: AppState) -> Router {
    gated_router(state, Router::new())
}

/// Builds the teamgate router with `routes` placed behind the gate.
///
/// Handlers in `routes` may extract
/// [`GateIdentity`](crate::auth::GateIdentity) as an `Extension`.
pub fn gated_router(state: AppState, routes: Router<AppState>) -> Router {
    let gated = routes
        .route("/api/session", get(session_info))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/login/cb", get(login_callback))
        .route("/login/webhook", post(webhook))
        .route("/logout", get(logout))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
