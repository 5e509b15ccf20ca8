//! Auth Provider Interface
//!
//! The external service that owns accounts and sessions. The gatekeeper
//! consumes it through this trait; `infra::http_provider` talks to a hosted
//! instance and tests use an in-memory fake.

use platform::cookie::{RequestCookies, SetCookie};
use thiserror::Error;

use crate::domain::session::{Credentials, Registration, SessionGrant, SessionLookup};

/// Auth provider failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Network failure, timeout or server error
    #[error("Auth provider unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account already registered")]
    AlreadyRegistered,

    /// Request refused for a reason the gatekeeper does not model
    #[error("Auth provider rejected the request: {0}")]
    Rejected(String),
}

/// Auth provider trait
#[trait_variant::make(AuthProvider: Send)]
pub trait LocalAuthProvider {
    /// Current user for these cookies, plus any cookie refresh or rotation
    async fn current_session(&self, cookies: &RequestCookies)
    -> Result<SessionLookup, ProviderError>;

    /// Check email and password, creating a session on success
    async fn verify_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<SessionGrant, ProviderError>;

    /// Create an account
    async fn register(&self, credentials: &Credentials) -> Result<Registration, ProviderError>;

    /// End the session held in these cookies; returns the cookie writes that
    /// remove it from the browser
    async fn revoke(&self, cookies: &RequestCookies) -> Result<Vec<SetCookie>, ProviderError>;

    /// Cookie writes that remove this provider's session cookies, without
    /// contacting the provider
    fn clear_session_cookies(&self) -> Vec<SetCookie>;
}
