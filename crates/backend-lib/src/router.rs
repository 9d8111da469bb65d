// ============================
// teachdesk-backend-lib/src/router.rs
// ============================
//! HTTP router and middleware stack.
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{any, get, post},
    Router,
};
use teachdesk_common::{CHECK_PATH, LOGIN_PATH, LOGOUT_PATH};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{deny_sensitive_paths, require_session, with_security_headers};
use crate::AppState;

/// Create the application router.
///
/// Request flow, outermost first: tracing, security headers, sensitive path
/// block, session gate, handler.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health))
        .route(LOGIN_PATH, post(handlers::login))
        .route(LOGOUT_PATH, post(handlers::logout))
        .route(CHECK_PATH, get(handlers::check))
        .route("/api", any(handlers::api_not_found))
        .route("/api/{*rest}", any(handlers::api_not_found))
        .layer(from_fn_with_state(state.clone(), require_session))
        .layer(from_fn(deny_sensitive_paths));

    with_security_headers(router, &state.settings)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
