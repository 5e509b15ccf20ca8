//! Domain Layer
//!
//! Route policy, the per-request gate decision, session vocabulary and the
//! auth provider interface.

pub mod decision;
pub mod provider;
pub mod route_policy;
pub mod session;

// Re-exports
pub use decision::{Decision, SignInRedirect, decide};
pub use provider::{AuthProvider, ProviderError};
pub use route_policy::{RoutePolicy, RouteTable, sanitize_return_target};
pub use session::{
    Credentials, CurrentSession, Registration, SessionGrant, SessionLookup, UserId, normalize_email,
};
