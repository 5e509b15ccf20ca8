//! Sign Up Use Case
//!
//! Shares the `auth` quota with sign-in. Local validation runs after the
//! rate limit so malformed submissions still count as attempts.

use std::sync::Arc;

use platform::cookie::{RequestCookies, SetCookie};
use platform::password::ClearTextPassword;
use platform::rate_limit::RateLimitStore;

use crate::application::config::GatekeeperConfig;
use crate::application::csrf::CsrfGuard;
use crate::application::provider_call::bounded;
use crate::application::rate_limiter::{ActionClass, RateLimiter};
use crate::domain::provider::AuthProvider;
use crate::domain::session::{Credentials, UserId, normalize_email};
use crate::error::{GatekeeperError, GatekeeperResult};

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub csrf_token: Option<String>,
    pub client: String,
}

/// Sign up output
#[derive(Debug)]
pub struct SignUpOutput {
    pub user: UserId,
    pub confirmation_required: bool,
    pub cookie_mutations: Vec<SetCookie>,
}

/// Sign up use case
pub struct SignUpUseCase<A, S>
where
    A: AuthProvider,
    S: RateLimitStore + Sync,
{
    provider: Arc<A>,
    limiter: Arc<RateLimiter<S>>,
    csrf: Arc<CsrfGuard>,
    config: Arc<GatekeeperConfig>,
}

impl<A, S> SignUpUseCase<A, S>
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
        input: SignUpInput,
        cookies: &RequestCookies,
    ) -> GatekeeperResult<SignUpOutput> {
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

        let email = normalize_email(&input.email)
            .ok_or_else(|| GatekeeperError::Validation("Invalid email address".to_string()))?;
        let password = ClearTextPassword::new(input.password)?;
        let credentials = Credentials::new(email, password);

        let registration =
            bounded(self.config.auth_timeout, self.provider.register(&credentials)).await?;

        tracing::info!(
            user_id = %registration.user,
            confirmation_required = registration.confirmation_required,
            "User registered"
        );

        Ok(SignUpOutput {
            user: registration.user,
            confirmation_required: registration.confirmation_required,
            cookie_mutations: registration.cookie_mutations,
        })
    }
}
