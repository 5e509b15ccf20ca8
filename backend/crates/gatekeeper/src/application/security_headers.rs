//! Security Headers
//!
//! Fixed protective header set applied to every response. HSTS is only
//! sent in production.

use axum::http::header::{self, HeaderName, InvalidHeaderValue};
use axum::http::{HeaderMap, HeaderValue};
use platform::config::Environment;

use crate::application::config::GatekeeperConfig;

/// Legacy XSS filter header, not in the `http` constants
pub const X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");

pub const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Content security policy allowing this origin plus the auth service
pub fn content_security_policy(auth_origin: &str) -> String {
    format!(
        "default-src 'self'; \
         script-src 'self' 'unsafe-inline' {auth_origin}; \
         style-src 'self' 'unsafe-inline' {auth_origin}; \
         img-src 'self' data: blob: {auth_origin}; \
         connect-src 'self' {auth_origin}; \
         font-src 'self' data:; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Prebuilt header set
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    pub fn new(environment: Environment, auth_origin: &str) -> Result<Self, InvalidHeaderValue> {
        let mut headers = vec![
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
            (X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (
                header::REFERRER_POLICY,
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ),
            (
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_str(&content_security_policy(auth_origin))?,
            ),
        ];

        if environment.is_production() {
            headers.push((
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static(HSTS_VALUE),
            ));
        }

        Ok(Self { headers })
    }

    pub fn from_config(config: &GatekeeperConfig) -> Result<Self, InvalidHeaderValue> {
        Self::new(config.environment, &config.auth_origin)
    }

    /// Write the set onto a response, replacing any value a handler chose
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://auth.example.com";

    #[test]
    fn test_fixed_headers() {
        let set = SecurityHeaders::new(Environment::Development, ORIGIN).unwrap();
        let mut headers = HeaderMap::new();
        set.apply(&mut headers);

        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(headers.get(X_XSS_PROTECTION).unwrap(), "1; mode=block");
        assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(
            headers.get(header::REFERRER_POLICY).unwrap(),
            "strict-origin-when-cross-origin"
        );
        assert!(headers.get(header::STRICT_TRANSPORT_SECURITY).is_none());
    }

    #[test]
    fn test_hsts_in_production() {
        let set = SecurityHeaders::new(Environment::Production, ORIGIN).unwrap();
        let mut headers = HeaderMap::new();
        set.apply(&mut headers);
        assert_eq!(headers.get(header::STRICT_TRANSPORT_SECURITY).unwrap(), HSTS_VALUE);
    }

    #[test]
    fn test_csp_allows_self_and_auth_origin() {
        let csp = content_security_policy(ORIGIN);
        for directive in ["script-src", "style-src", "img-src", "connect-src"] {
            let part = csp
                .split(';')
                .map(str::trim)
                .find(|d| d.starts_with(directive))
                .unwrap();
            assert!(part.contains("'self'"), "{directive}");
            assert!(part.contains(ORIGIN), "{directive}");
        }
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_apply_overwrites_handler_values() {
        let set = SecurityHeaders::new(Environment::Production, ORIGIN).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("ALLOWALL"));
        headers.append(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
        set.apply(&mut headers);
        let values: Vec<_> = headers.get_all(header::X_FRAME_OPTIONS).iter().collect();
        assert_eq!(values, vec!["DENY"]);
    }

    #[test]
    fn test_invalid_origin_rejected() {
        assert!(SecurityHeaders::new(Environment::Production, "bad\norigin").is_err());
    }
}
