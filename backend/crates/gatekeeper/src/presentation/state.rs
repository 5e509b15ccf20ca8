//! Shared gatekeeper state

use std::sync::Arc;

use platform::rate_limit::RateLimitStore;

use crate::application::config::{ConfigError, GatekeeperConfig};
use crate::application::{CsrfGuard, RateLimiter, SecurityHeaders, SessionBridge};
use crate::domain::decision::SignInRedirect;
use crate::domain::provider::AuthProvider;
use crate::domain::route_policy::RouteTable;

/// State shared by the middleware and the auth handlers
pub struct GatekeeperState<A, S>
where
    A: AuthProvider + Send + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
{
    pub provider: Arc<A>,
    pub limiter: Arc<RateLimiter<S>>,
    pub csrf: Arc<CsrfGuard>,
    pub security_headers: Arc<SecurityHeaders>,
    pub routes: Arc<RouteTable>,
    pub sign_in: Arc<SignInRedirect>,
    pub config: Arc<GatekeeperConfig>,
}

impl<A, S> Clone for GatekeeperState<A, S>
where
    A: AuthProvider + Send + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            limiter: self.limiter.clone(),
            csrf: self.csrf.clone(),
            security_headers: self.security_headers.clone(),
            routes: self.routes.clone(),
            sign_in: self.sign_in.clone(),
            config: self.config.clone(),
        }
    }
}

impl<A, S> GatekeeperState<A, S>
where
    A: AuthProvider + Send + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
{
    /// Build the state; `store: None` leaves rate limiting unconfigured
    pub fn new(provider: A, store: Option<S>, config: GatekeeperConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let security_headers = SecurityHeaders::from_config(&config)?;
        let limiter = RateLimiter::new(store.map(Arc::new), &config);

        Ok(Self {
            provider: Arc::new(provider),
            limiter: Arc::new(limiter),
            csrf: Arc::new(CsrfGuard::new(&config)),
            security_headers: Arc::new(security_headers),
            routes: Arc::new(config.route_table()),
            sign_in: Arc::new(config.sign_in_redirect()),
            config: Arc::new(config),
        })
    }

    pub fn session_bridge(&self) -> SessionBridge<A> {
        SessionBridge::new(self.provider.clone(), self.config.auth_timeout)
    }
}
