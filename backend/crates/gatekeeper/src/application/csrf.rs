//! CSRF Guard
//!
//! Double-submit tokens: the token lives in an HttpOnly, SameSite=Strict
//! cookie and the client echoes it in the request payload. There is no
//! server-side registry; validity is equality with the requester's own
//! cookie.

use platform::cookie::{CookieConfig, RequestCookies, SetCookie};
use platform::crypto::{constant_time_eq, from_base64url, random_token};

use crate::application::config::GatekeeperConfig;
use crate::error::{GatekeeperError, GatekeeperResult};

/// Token handed to the client together with the cookie that stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCsrfToken {
    pub token: String,
    pub cookie: SetCookie,
    /// Whether an existing cookie value was reused
    pub reused: bool,
}

/// CSRF guard
#[derive(Debug, Clone)]
pub struct CsrfGuard {
    cookie: CookieConfig,
    token_bytes: usize,
}

impl CsrfGuard {
    pub fn new(config: &GatekeeperConfig) -> Self {
        Self {
            cookie: config.csrf_cookie(),
            token_bytes: config.csrf_token_bytes,
        }
    }

    /// Return the jar's token, minting one if absent or malformed
    ///
    /// The cookie is rewritten either way so its lifetime restarts.
    pub fn issue_or_refresh(&self, cookies: &RequestCookies) -> IssuedCsrfToken {
        let existing = cookies
            .get(&self.cookie.name)
            .filter(|token| self.is_well_formed(token));

        let (token, reused) = match existing {
            Some(token) => (token.to_string(), true),
            None => (random_token(self.token_bytes), false),
        };

        IssuedCsrfToken {
            cookie: SetCookie::new(self.cookie.clone(), token.clone()),
            token,
            reused,
        }
    }

    /// True iff `supplied` is non-empty and equals the cookie value
    pub fn validate(&self, cookies: &RequestCookies, supplied: Option<&str>) -> bool {
        let Some(supplied) = supplied.filter(|s| !s.is_empty()) else {
            return false;
        };
        let Some(stored) = cookies.get(&self.cookie.name).filter(|s| !s.is_empty()) else {
            return false;
        };
        constant_time_eq(stored.as_bytes(), supplied.as_bytes())
    }

    /// [`validate`](Self::validate), as an error for mutating actions
    pub fn require(&self, cookies: &RequestCookies, supplied: Option<&str>) -> GatekeeperResult<()> {
        if self.validate(cookies, supplied) {
            Ok(())
        } else {
            Err(GatekeeperError::InvalidCsrfToken)
        }
    }

    fn is_well_formed(&self, token: &str) -> bool {
        from_base64url(token).is_ok_and(|bytes| bytes.len() == self.token_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header};

    fn guard() -> CsrfGuard {
        CsrfGuard::new(&GatekeeperConfig::production())
    }

    fn jar(cookie: &str) -> RequestCookies {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        RequestCookies::from_headers(&headers)
    }

    fn jar_with(issued: &IssuedCsrfToken) -> RequestCookies {
        jar(&format!("{}={}", issued.cookie.name(), issued.token))
    }

    #[test]
    fn test_issue_new_token() {
        let issued = guard().issue_or_refresh(&RequestCookies::default());
        assert!(!issued.reused);
        // 32 bytes base64url without padding
        assert_eq!(issued.token.len(), 43);
        assert_eq!(issued.cookie.value, issued.token);

        let header = issued.cookie.to_header_value().unwrap();
        let header = header.to_str().unwrap();
        assert!(header.starts_with("csrf_token="));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Strict"));
        assert!(header.contains("Secure"));
        assert!(header.contains("Max-Age=86400"));
    }

    #[test]
    fn test_tokens_are_unique() {
        let g = guard();
        let a = g.issue_or_refresh(&RequestCookies::default());
        let b = g.issue_or_refresh(&RequestCookies::default());
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_existing_token_reused_and_cookie_refreshed() {
        let g = guard();
        let first = g.issue_or_refresh(&RequestCookies::default());
        let second = g.issue_or_refresh(&jar_with(&first));
        assert!(second.reused);
        assert_eq!(second.token, first.token);
        assert_eq!(second.cookie.config.max_age_secs, Some(86_400));
    }

    #[test]
    fn test_malformed_cookie_replaced() {
        let g = guard();
        let issued = g.issue_or_refresh(&jar("csrf_token=short"));
        assert!(!issued.reused);
        assert_ne!(issued.token, "short");
    }

    #[test]
    fn test_validate_after_issue() {
        let g = guard();
        let issued = g.issue_or_refresh(&RequestCookies::default());
        assert!(g.validate(&jar_with(&issued), Some(&issued.token)));
        assert!(g.require(&jar_with(&issued), Some(&issued.token)).is_ok());
    }

    #[test]
    fn test_validate_without_cookie() {
        let g = guard();
        let issued = g.issue_or_refresh(&RequestCookies::default());
        assert!(!g.validate(&RequestCookies::default(), Some(&issued.token)));
        assert!(!g.validate(&RequestCookies::default(), Some("anything")));
        assert!(!g.validate(&RequestCookies::default(), None));
    }

    #[test]
    fn test_validate_rejects_empty() {
        let g = guard();
        assert!(!g.validate(&jar("csrf_token="), Some("")));
        assert!(!g.validate(&jar("csrf_token=abc"), Some("")));
        assert!(!g.validate(&jar("csrf_token=abc"), None));
    }

    #[test]
    fn test_validate_rejects_every_single_character_tamper() {
        let g = guard();
        let issued = g.issue_or_refresh(&RequestCookies::default());
        let cookies = jar_with(&issued);

        for i in 0..issued.token.len() {
            let mut bytes = issued.token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(!g.validate(&cookies, Some(&tampered)), "position {i}");
        }

        let mut truncated = issued.token.clone();
        truncated.pop();
        assert!(!g.validate(&cookies, Some(&truncated)));
        assert!(!g.validate(&cookies, Some(&format!("{}A", issued.token))));
    }

    #[test]
    fn test_require_maps_to_error() {
        let result = guard().require(&RequestCookies::default(), Some("x"));
        assert!(matches!(result, Err(GatekeeperError::InvalidCsrfToken)));
    }
}
