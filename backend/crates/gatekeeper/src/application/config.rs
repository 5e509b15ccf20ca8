//! Application Configuration
//!
//! Configuration for the gatekeeper application layer.

use std::time::Duration;

use axum::http::header::InvalidHeaderValue;
use platform::config::{Environment, normalize_path};
use platform::cookie::{CookieConfig, SameSite};
use platform::rate_limit::RateLimitConfig;
use thiserror::Error;
use url::Url;

use crate::domain::decision::SignInRedirect;
use crate::domain::route_policy::RouteTable;

/// Configuration that cannot be turned into a working gatekeeper
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("Invalid auth service URL: {0}")]
    InvalidAuthUrl(String),

    #[error("CSRF tokens need at least 32 random bytes (got {0})")]
    WeakCsrfToken(usize),
}

/// Gatekeeper application configuration
#[derive(Debug, Clone)]
pub struct GatekeeperConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Path prefixes that require a session
    pub protected_prefixes: Vec<String>,
    /// Maintenance endpoints hidden in production
    pub debug_paths: Vec<String>,
    /// Sign-in page unauthenticated requests are sent to
    pub sign_in_path: String,
    /// Query parameter carrying the original destination
    pub return_to_param: String,
    /// CSRF cookie name
    pub csrf_cookie_name: String,
    /// CSRF cookie lifetime (24 hours)
    pub csrf_ttl: Duration,
    /// Random bytes per CSRF token (32 = 256 bits)
    pub csrf_token_bytes: usize,
    /// Sign-in/sign-up attempts per identifier (5 per 15 minutes)
    pub auth_rate_limit: RateLimitConfig,
    /// Bound on each auth provider call
    pub auth_timeout: Duration,
    /// Bound on each counting store call
    pub store_timeout: Duration,
    /// Origin of the auth service, allowed by the content security policy
    pub auth_origin: String,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            protected_prefixes: vec![
                "/account".to_string(),
                "/api/admin".to_string(),
                "/api/internal".to_string(),
            ],
            debug_paths: vec![
                "/api/debug".to_string(),
                "/api/test-connection".to_string(),
                "/api/seed".to_string(),
            ],
            sign_in_path: "/sign-in".to_string(),
            return_to_param: "redirectTo".to_string(),
            csrf_cookie_name: "csrf_token".to_string(),
            csrf_ttl: Duration::from_secs(24 * 3600), // 24 hours
            csrf_token_bytes: 32,
            auth_rate_limit: RateLimitConfig::new(5, 15 * 60), // 5 per 15 minutes
            auth_timeout: Duration::from_secs(5),
            store_timeout: Duration::from_secs(2),
            auth_origin: "http://localhost:54321".to_string(),
        }
    }
}

impl GatekeeperConfig {
    /// Create config for development (debug endpoints reachable, insecure cookies)
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            ..Default::default()
        }
    }

    /// Create config for production (HSTS, secure cookies, debug endpoints hidden)
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            ..Default::default()
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }

    /// Set the auth service origin from its base URL
    pub fn with_auth_url(mut self, auth_url: &str) -> Result<Self, ConfigError> {
        self.auth_origin = origin_of(auth_url)?;
        Ok(self)
    }

    pub fn route_table(&self) -> RouteTable {
        RouteTable::new(&self.protected_prefixes, &self.debug_paths)
    }

    pub fn sign_in_redirect(&self) -> SignInRedirect {
        SignInRedirect::new(normalize_path(&self.sign_in_path), &self.return_to_param)
    }

    /// Cookie attributes for the CSRF token
    pub fn csrf_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.csrf_cookie_name.clone(),
            secure: self.is_production(),
            http_only: true,
            same_site: SameSite::Strict,
            path: "/".to_string(),
            max_age_secs: Some(self.csrf_ttl.as_secs() as i64),
        }
    }

    /// Reject settings that would silently weaken a guarantee
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.csrf_token_bytes < 32 {
            return Err(ConfigError::WeakCsrfToken(self.csrf_token_bytes));
        }
        Ok(())
    }
}

/// `scheme://host[:port]` of a URL
pub fn origin_of(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidAuthUrl(e.to_string()))?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(ConfigError::InvalidAuthUrl(raw.to_string()));
    }
    Ok(origin.ascii_serialization())
}
