//! Request Gatekeeper
//!
//! Clean Architecture structure:
//! - `domain/` - Route policy, gate decision, session vocabulary, auth provider trait
//! - `application/` - Session bridge, CSRF guard, rate limiter, security headers, use cases
//! - `infra/` - HTTP auth provider client, Redis counting store
//! - `presentation/` - Gatekeeper middleware, handlers, DTOs, router
//!
//! ## Request Pipeline
//! Every request passes the session bridge, then the route classifier, then
//! ends as allowed, redirected to sign-in, or blocked with 404. Security
//! headers are applied to every outcome, including error responses.
//!
//! ## Security Model
//! - Session absence fails closed: protected routes redirect when the auth
//!   provider cannot be reached
//! - Counting store absence fails open: rate limiting allows requests when
//!   the store is unconfigured, unreachable or slow
//! - Mutating actions check a double-submit CSRF token before the rate
//!   limiter, and the rate limiter before any credential check

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::GatekeeperConfig;
pub use error::{GatekeeperError, GatekeeperResult};
pub use infra::http_provider::{HttpAuthProvider, HttpAuthProviderConfig};
pub use infra::redis::RedisRateLimitStore;
pub use presentation::router::{auth_router, protect};
pub use presentation::state::GatekeeperState;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::decision::*;
    pub use crate::domain::route_policy::*;
    pub use crate::domain::session::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::redis::RedisRateLimitStore;
    pub use platform::rate_limit::{MemoryRateLimitStore, RateLimitStore};
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
