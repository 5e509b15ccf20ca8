//! Sign Out Use Case

use std::sync::Arc;

use platform::cookie::{RequestCookies, SetCookie};

use crate::application::config::GatekeeperConfig;
use crate::application::csrf::CsrfGuard;
use crate::application::provider_call::bounded;
use crate::domain::provider::AuthProvider;
use crate::error::GatekeeperResult;

/// Sign out use case
pub struct SignOutUseCase<A>
where
    A: AuthProvider,
{
    provider: Arc<A>,
    csrf: Arc<CsrfGuard>,
    config: Arc<GatekeeperConfig>,
}

impl<A> SignOutUseCase<A>
where
    A: AuthProvider,
{
    pub fn new(provider: Arc<A>, csrf: Arc<CsrfGuard>, config: Arc<GatekeeperConfig>) -> Self {
        Self {
            provider,
            csrf,
            config,
        }
    }

    /// Revoke the session and return the cookie writes that clear it
    ///
    /// Revocation is best effort: if the provider cannot be reached the
    /// browser cookies are still cleared.
    pub async fn execute(
        &self,
        csrf_token: Option<&str>,
        cookies: &RequestCookies,
    ) -> GatekeeperResult<Vec<SetCookie>> {
        self.csrf.require(cookies, csrf_token)?;

        match bounded(self.config.auth_timeout, self.provider.revoke(cookies)).await {
            Ok(mutations) => Ok(mutations),
            Err(e) => {
                tracing::warn!(error = %e, "Session revocation failed; clearing cookies locally");
                Ok(self.provider.clear_session_cookies())
            }
        }
    }
}
