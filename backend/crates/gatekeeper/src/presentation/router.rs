//! Gatekeeper Router

use std::any::Any;

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use kernel::error::app_error::AppError;
use platform::rate_limit::RateLimitStore;
use tower_http::catch_panic::CatchPanicLayer;

use crate::domain::provider::AuthProvider;
use crate::infra::http_provider::HttpAuthProvider;
use crate::infra::redis::RedisRateLimitStore;
use crate::presentation::handlers;
use crate::presentation::middleware::gatekeeper;
use crate::presentation::state::GatekeeperState;

/// Create the auth router for the hosted auth service and Redis store
pub fn auth_router(state: GatekeeperState<HttpAuthProvider, RedisRateLimitStore>) -> Router {
    auth_router_generic(state)
}

/// Create a generic auth router for any provider and store implementation
pub fn auth_router_generic<A, S>(state: GatekeeperState<A, S>) -> Router
where
    A: AuthProvider + Send + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
{
    Router::new()
        .route("/csrf", get(handlers::issue_csrf_token::<A, S>))
        .route("/sign-in", post(handlers::sign_in::<A, S>))
        .route("/sign-up", post(handlers::sign_up::<A, S>))
        .route("/sign-out", post(handlers::sign_out::<A, S>))
        .route("/session", get(handlers::session_status))
        .with_state(state)
}

/// Put a router behind the gatekeeper
///
/// Panics inside the router become 500 responses before reaching the
/// gatekeeper, so security headers are applied to them too.
pub fn protect<A, S>(router: Router, state: GatekeeperState<A, S>) -> Router
where
    A: AuthProvider + Send + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(axum::middleware::from_fn_with_state(state, gatekeeper::<A, S>))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");
    AppError::internal("Internal server error").into_response()
}
