//! Sign In Use Case
//!
//! CSRF check, then rate limit, then credential verification. The first two
//! run before the auth provider is contacted at all.

use std::sync::Arc;

use platform::cookie::{RequestCookies, SetCookie};
use platform::password::ClearTextPassword;
use platform::rate_limit::RateLimitStore;

use crate::application::config::GatekeeperConfig;
use crate::application::csrf::CsrfGuard;
use crate::application::provider_call::bounded;
use crate::application::rate_limiter::{ActionClass, RateLimiter};
use crate::domain::provider::AuthProvider;
use crate::domain::route_policy::sanitize_return_target;
use crate::domain::session::{Credentials, UserId, normalize_email};
use crate::error::{GatekeeperError, GatekeeperResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
    /// Echoed CSRF token
    pub csrf_token: Option<String>,
    /// Where the client wants to land afterwards
    pub return_to: Option<String>,
    /// Rate limit identifier
    pub client: String,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub user: UserId,
    /// Session cookies to relay
    pub cookie_mutations: Vec<SetCookie>,
    /// Sanitized local destination
    pub redirect_to: String,
}

/// Sign in use case
pub struct SignInUseCase<A, S>
where
    A: AuthProvider,
    S: RateLimitStore + Sync,
{
    provider: Arc<A>,
    limiter: Arc<RateLimiter<S>>,
    csrf: Arc<CsrfGuard>,
    config: Arc<GatekeeperConfig>,
}

impl<A, S> SignInUseCase<A, S>
where
    A: AuthProvider,
    S: RateLimitStore + Sync,
{
    pub fn new(
        provider: Arc<A>,
        limiter: Arc<RateLimiter<S>>,
        csrf: Arc<CsrfGuard>,
        config: Arc<GatekeeperConfig>,
    ) -> Self {
        Self {
            provider,
            limiter,
            csrf,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        cookies: &RequestCookies,
    ) -> GatekeeperResult<SignInOutput> {
        self.csrf.require(cookies, input.csrf_token.as_deref())?;

        let quota = self
            .limiter
            .check_and_consume(&input.client, ActionClass::Auth)
            .await;
        if !quota.allowed {
            return Err(GatekeeperError::RateLimited {
                limit: self.limiter.policy(ActionClass::Auth).max_requests,
                reset_at_ms: quota.reset_at_ms,
            });
        }

        if input.password.is_empty() {
            return Err(GatekeeperError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        // A malformed email cannot match an account
        let email = normalize_email(&input.email).ok_or(GatekeeperError::InvalidCredentials)?;

        // Existing passwords predate any policy change; only sign-up enforces it
        let credentials = Credentials::new(email, ClearTextPassword::unchecked(input.password));

        let grant = bounded(
            self.config.auth_timeout,
            self.provider.verify_credentials(&credentials),
        )
        .await?;

        tracing::info!(user_id = %grant.user, "User signed in");

        Ok(SignInOutput {
            user: grant.user,
            cookie_mutations: grant.cookie_mutations,
            redirect_to: sanitize_return_target(input.return_to.as_deref()),
        })
    }
}
