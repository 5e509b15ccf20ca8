//! Session Cookie Bridge
//!
//! Asks the auth provider who the request belongs to and collects the
//! cookie writes it wants relayed. Never decides access itself.

use std::sync::Arc;
use std::time::Duration;

use platform::cookie::RequestCookies;

use crate::domain::provider::AuthProvider;
use crate::domain::session::SessionLookup;

/// Session bridge
pub struct SessionBridge<A>
where
    A: AuthProvider,
{
    provider: Arc<A>,
    timeout: Duration,
}

impl<A> SessionBridge<A>
where
    A: AuthProvider,
{
    pub fn new(provider: Arc<A>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Refresh the session for these cookies
    ///
    /// An unreachable or slow provider yields an anonymous lookup with no
    /// cookie writes, so protected routes fail closed.
    pub async fn refresh(&self, cookies: &RequestCookies) -> SessionLookup {
        match tokio::time::timeout(self.timeout, self.provider.current_session(cookies)).await {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Session refresh failed; treating request as anonymous");
                SessionLookup::anonymous()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Session refresh timed out; treating request as anonymous"
                );
                SessionLookup::anonymous()
            }
        }
    }
}
