//! Gatekeeper Error Types
//!
//! Gatekeeper-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::PasswordPolicyError;
use thiserror::Error;

use crate::domain::provider::ProviderError;

/// Gatekeeper-specific result type alias
pub type GatekeeperResult<T> = Result<T, GatekeeperError>;

pub const RATE_LIMIT_LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING_HEADER: HeaderName =
    HeaderName::from_static("x-ratelimit-remaining");
pub const RATE_LIMIT_RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Gatekeeper-specific error variants
#[derive(Debug, Error)]
pub enum GatekeeperError {
    /// CSRF token missing or not matching the cookie
    #[error("Invalid security token")]
    InvalidCsrfToken,

    /// Too many attempts for this identifier and action class
    #[error("Too many attempts")]
    RateLimited { limit: u32, reset_at_ms: i64 },

    /// Credentials rejected by the auth provider
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// An account already exists for this email
    #[error("An account with this email already exists")]
    AlreadyRegistered,

    /// Request payload failed local validation
    #[error("{0}")]
    Validation(String),

    /// Auth provider unreachable or timed out
    #[error("Authentication service unavailable: {0}")]
    ProviderUnavailable(String),

    /// Auth provider refused the request for another reason
    #[error("Authentication service rejected the request: {0}")]
    ProviderRejected(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatekeeperError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatekeeperError::InvalidCsrfToken => StatusCode::FORBIDDEN,
            GatekeeperError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatekeeperError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            GatekeeperError::AlreadyRegistered => StatusCode::CONFLICT,
            GatekeeperError::Validation(_) => StatusCode::BAD_REQUEST,
            GatekeeperError::ProviderRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatekeeperError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatekeeperError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatekeeperError::InvalidCsrfToken => ErrorKind::Forbidden,
            GatekeeperError::RateLimited { .. } => ErrorKind::TooManyRequests,
            GatekeeperError::InvalidCredentials => ErrorKind::Unauthorized,
            GatekeeperError::AlreadyRegistered => ErrorKind::Conflict,
            GatekeeperError::Validation(_) => ErrorKind::BadRequest,
            GatekeeperError::ProviderRejected(_) => ErrorKind::UnprocessableEntity,
            GatekeeperError::ProviderUnavailable(_) => ErrorKind::ServiceUnavailable,
            GatekeeperError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Upstream and internal details stay in the logs; the client only sees
    /// a generic message for those.
    pub fn to_app_error(&self) -> AppError {
        match self {
            GatekeeperError::InvalidCsrfToken => AppError::new(self.kind(), self.to_string())
                .with_action("Refresh the page and try again"),
            GatekeeperError::RateLimited { reset_at_ms, .. } => {
                AppError::new(self.kind(), self.to_string())
                    .with_action("Please try again later")
                    .with_retry_at_ms(*reset_at_ms)
            }
            GatekeeperError::ProviderUnavailable(_) => {
                AppError::new(self.kind(), "Authentication service unavailable")
                    .with_action("Please try again later")
            }
            GatekeeperError::ProviderRejected(_) => {
                AppError::new(self.kind(), "The request could not be completed")
            }
            GatekeeperError::Internal(_) => AppError::new(self.kind(), "Internal server error"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            GatekeeperError::Internal(msg) => {
                tracing::error!(message = %msg, "Gatekeeper internal error");
            }
            GatekeeperError::ProviderUnavailable(msg) => {
                tracing::error!(message = %msg, "Auth provider unavailable");
            }
            GatekeeperError::InvalidCsrfToken => {
                tracing::warn!("Rejected request with invalid CSRF token");
            }
            GatekeeperError::RateLimited { limit, reset_at_ms } => {
                tracing::warn!(limit, reset_at_ms, "Rate limit exceeded");
            }
            GatekeeperError::InvalidCredentials => {
                tracing::warn!("Invalid sign-in attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Gatekeeper error");
            }
        }
    }
}

/// Seconds until `reset_at_ms`, rounded up and never negative
pub fn retry_after_secs(reset_at_ms: i64, now_ms: i64) -> i64 {
    let remaining_ms = (reset_at_ms - now_ms).max(0);
    (remaining_ms + 999) / 1000
}

impl IntoResponse for GatekeeperError {
    fn into_response(self) -> Response {
        self.log();
        let mut response = self.to_app_error().into_response();

        if let GatekeeperError::RateLimited { limit, reset_at_ms } = self {
            let now_ms = chrono::Utc::now().timestamp_millis();
            let headers = response.headers_mut();
            headers.insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after_secs(reset_at_ms, now_ms)),
            );
            headers.insert(RATE_LIMIT_LIMIT_HEADER, HeaderValue::from(limit));
            headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from(0u32));
            headers.insert(RATE_LIMIT_RESET_HEADER, HeaderValue::from(reset_at_ms / 1000));
        }

        response
    }
}

impl From<ProviderError> for GatekeeperError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidCredentials => GatekeeperError::InvalidCredentials,
            ProviderError::AlreadyRegistered => GatekeeperError::AlreadyRegistered,
            ProviderError::Unavailable(msg) => GatekeeperError::ProviderUnavailable(msg),
            ProviderError::Rejected(msg) => GatekeeperError::ProviderRejected(msg),
        }
    }
}

impl From<PasswordPolicyError> for GatekeeperError {
    fn from(err: PasswordPolicyError) -> Self {
        GatekeeperError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_secs(10_001, 9_000), 2);
        assert_eq!(retry_after_secs(10_000, 9_000), 1);
        assert_eq!(retry_after_secs(5_000, 9_000), 0);
    }

    #[test]
    fn test_csrf_error_is_generic() {
        let err = GatekeeperError::InvalidCsrfToken.to_app_error();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.message(), "Invalid security token");
        assert_eq!(err.action(), Some("Refresh the page and try again"));
    }

    #[test]
    fn test_rate_limited_carries_reset_time() {
        let err = GatekeeperError::RateLimited {
            limit: 5,
            reset_at_ms: 1_700_000_000_000,
        };
        let app = err.to_app_error();
        assert_eq!(app.status_code(), 429);
        assert_eq!(app.retry_at_ms(), Some(1_700_000_000_000));
        assert_eq!(app.action(), Some("Please try again later"));
    }

    #[test]
    fn test_rate_limited_response_headers() {
        let response = GatekeeperError::RateLimited {
            limit: 5,
            reset_at_ms: 0,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let headers = response.headers();
        assert_eq!(headers.get(header::RETRY_AFTER).unwrap(), "0");
        assert_eq!(headers.get(RATE_LIMIT_LIMIT_HEADER).unwrap(), "5");
        assert_eq!(headers.get(RATE_LIMIT_REMAINING_HEADER).unwrap(), "0");
    }

    #[test]
    fn test_upstream_details_hidden() {
        let err = GatekeeperError::ProviderUnavailable("connect refused 10.0.0.3".into());
        assert!(!err.to_app_error().message().contains("10.0.0.3"));
        let err = GatekeeperError::Internal("secret detail".into());
        assert!(!err.to_app_error().message().contains("secret"));
    }

    #[test]
    fn test_provider_error_mapping() {
        assert!(matches!(
            GatekeeperError::from(ProviderError::InvalidCredentials),
            GatekeeperError::InvalidCredentials
        ));
        assert!(matches!(
            GatekeeperError::from(ProviderError::Unavailable("x".into())),
            GatekeeperError::ProviderUnavailable(_)
        ));
    }
}
