//! HTTP Auth Provider
//!
//! Client for a hosted auth service with a GoTrue-style REST surface. The
//! session lives in two cookies, `<prefix>-access-token` and
//! `<prefix>-refresh-token`; an expired access token is renewed with the
//! refresh token and the new pair is reported as cookie mutations.

use std::time::Duration;

use platform::cookie::{CookieConfig, RequestCookies, SameSite, SetCookie};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::domain::provider::{AuthProvider, ProviderError};
use crate::domain::session::{Credentials, Registration, SessionGrant, SessionLookup, UserId};

/// HTTP auth provider configuration
#[derive(Debug, Clone)]
pub struct HttpAuthProviderConfig {
    /// Service base URL, e.g. `http://localhost:54321`
    pub base_url: String,
    /// Public API key sent as the `apikey` header
    pub api_key: String,
    /// Session cookie name prefix
    pub cookie_prefix: String,
    /// Whether session cookies carry `Secure`
    pub secure_cookies: bool,
    /// Refresh cookie lifetime
    pub refresh_cookie_ttl: Duration,
    /// Per-request timeout of the underlying client
    pub request_timeout: Duration,
}

impl Default for HttpAuthProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            cookie_prefix: "sb".to_string(),
            secure_cookies: true,
            refresh_cookie_ttl: Duration::from_secs(30 * 24 * 3600), // 30 days
            request_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SessionPayload {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: UserPayload,
}

/// Sign-up answers with a session, or with the bare user when the email
/// must be confirmed first
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpPayload {
    Session(SessionPayload),
    User(UserPayload),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorPayload {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn text(&self) -> String {
        [
            &self.error_description,
            &self.msg,
            &self.message,
            &self.error,
        ]
        .into_iter()
        .find_map(|s| s.clone())
        .unwrap_or_else(|| "unknown error".to_string())
    }

    fn is_already_registered(&self) -> bool {
        self.error_code.as_deref() == Some("user_already_exists")
            || self.text().to_lowercase().contains("already registered")
    }
}

/// HTTP auth provider
#[derive(Debug, Clone)]
pub struct HttpAuthProvider {
    client: Client,
    config: HttpAuthProviderConfig,
}

impl HttpAuthProvider {
    pub fn new(config: HttpAuthProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn access_cookie_name(&self) -> String {
        format!("{}-access-token", self.config.cookie_prefix)
    }

    pub fn refresh_cookie_name(&self) -> String {
        format!("{}-refresh-token", self.config.cookie_prefix)
    }

    fn cookie(&self, name: String, max_age_secs: i64) -> CookieConfig {
        CookieConfig {
            name,
            secure: self.config.secure_cookies,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: Some(max_age_secs),
        }
    }

    fn session_cookies(&self, session: &SessionPayload) -> Vec<SetCookie> {
        let refresh_ttl = self.config.refresh_cookie_ttl.as_secs() as i64;
        vec![
            SetCookie::new(
                self.cookie(self.access_cookie_name(), session.expires_in.max(0)),
                session.access_token.clone(),
            ),
            SetCookie::new(
                self.cookie(self.refresh_cookie_name(), refresh_ttl),
                session.refresh_token.clone(),
            ),
        ]
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// User behind an access token; `None` when the token is rejected
    async fn fetch_user(&self, access_token: &str) -> Result<Option<UserPayload>, ProviderError> {
        let response = self
            .client
            .get(self.url("/auth/v1/user"))
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        let body = response.text().await.map_err(unavailable)?;

        match status {
            s if s.is_success() => decode(&body).map(Some),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            s => Err(upstream_error(s, &body)),
        }
    }

    /// New session from a refresh token; `None` when the token is spent
    async fn refresh(&self, refresh_token: &str) -> Result<Option<SessionPayload>, ProviderError> {
        let response = self
            .client
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.config.api_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        let body = response.text().await.map_err(unavailable)?;

        match status {
            s if s.is_success() => decode(&body).map(Some),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            s => Err(upstream_error(s, &body)),
        }
    }
}

impl AuthProvider for HttpAuthProvider {
    async fn current_session(
        &self,
        cookies: &RequestCookies,
    ) -> Result<SessionLookup, ProviderError> {
        let access_name = self.access_cookie_name();
        let refresh_name = self.refresh_cookie_name();
        let access = cookies.get(&access_name).filter(|v| !v.is_empty());
        let refresh = cookies.get(&refresh_name).filter(|v| !v.is_empty());

        if access.is_none() && refresh.is_none() {
            return Ok(SessionLookup::anonymous());
        }

        if let Some(access) = access {
            if let Some(user) = self.fetch_user(access).await? {
                return Ok(SessionLookup::authenticated(UserId::new(user.id)));
            }
        }

        let Some(refresh) = refresh else {
            return Ok(SessionLookup::anonymous().with_mutations(self.clear_session_cookies()));
        };

        match self.refresh(refresh).await? {
            Some(session) => {
                tracing::debug!(user_id = %session.user.id, "Session refreshed");
                let mutations = self.session_cookies(&session);
                Ok(SessionLookup::authenticated(UserId::new(session.user.id)).with_mutations(mutations))
            }
            None => Ok(SessionLookup::anonymous().with_mutations(self.clear_session_cookies())),
        }
    }

    async fn verify_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<SessionGrant, ProviderError> {
        let response = self
            .client
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.api_key)
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password.expose(),
            }))
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        let body = response.text().await.map_err(unavailable)?;

        match status {
            s if s.is_success() => {
                let session: SessionPayload = decode(&body)?;
                Ok(SessionGrant {
                    cookie_mutations: self.session_cookies(&session),
                    user: UserId::new(session.user.id),
                })
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                let error = ErrorPayload::parse(&body);
                if error.error_code.as_deref() == Some("email_not_confirmed") {
                    Err(ProviderError::Rejected(error.text()))
                } else {
                    Err(ProviderError::InvalidCredentials)
                }
            }
            s => Err(upstream_error(s, &body)),
        }
    }

    async fn register(&self, credentials: &Credentials) -> Result<Registration, ProviderError> {
        let response = self
            .client
            .post(self.url("/auth/v1/signup"))
            .header("apikey", &self.config.api_key)
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password.expose(),
            }))
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        let body = response.text().await.map_err(unavailable)?;

        if status.is_success() {
            return match decode::<SignUpPayload>(&body)? {
                SignUpPayload::Session(session) => Ok(Registration {
                    cookie_mutations: self.session_cookies(&session),
                    user: UserId::new(session.user.id),
                    confirmation_required: false,
                }),
                SignUpPayload::User(user) => Ok(Registration {
                    user: UserId::new(user.id),
                    confirmation_required: true,
                    cookie_mutations: Vec::new(),
                }),
            };
        }

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(upstream_error(status, &body));
        }

        let error = ErrorPayload::parse(&body);
        if error.is_already_registered() {
            Err(ProviderError::AlreadyRegistered)
        } else {
            Err(ProviderError::Rejected(error.text()))
        }
    }

    async fn revoke(&self, cookies: &RequestCookies) -> Result<Vec<SetCookie>, ProviderError> {
        let access_name = self.access_cookie_name();
        if let Some(access) = cookies.get(&access_name).filter(|v| !v.is_empty()) {
            let response = self
                .client
                .post(self.url("/auth/v1/logout"))
                .header("apikey", &self.config.api_key)
                .bearer_auth(access)
                .send()
                .await
                .map_err(unavailable)?;

            let status = response.status();
            // An already expired token has nothing left to revoke
            if !status.is_success() && status != StatusCode::UNAUTHORIZED {
                let body = response.text().await.unwrap_or_default();
                return Err(upstream_error(status, &body));
            }
        }

        Ok(self.clear_session_cookies())
    }

    fn clear_session_cookies(&self) -> Vec<SetCookie> {
        vec![
            SetCookie::removal(self.cookie(self.access_cookie_name(), 0)),
            SetCookie::removal(self.cookie(self.refresh_cookie_name(), 0)),
        ]
    }
}

fn unavailable(err: reqwest::Error) -> ProviderError {
    ProviderError::Unavailable(err.to_string())
}

fn upstream_error(status: StatusCode, body: &str) -> ProviderError {
    let message = format!("{}: {}", status, ErrorPayload::parse(body).text());
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::Unavailable(message)
    } else {
        ProviderError::Rejected(message)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body)
        .map_err(|e| ProviderError::Unavailable(format!("unexpected response body: {}", e)))
}
