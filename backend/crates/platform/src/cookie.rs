//! Cookie Management Infrastructure
//!
//! Parsing of the incoming `Cookie` header into an immutable snapshot, and
//! construction of `Set-Cookie` values for outgoing responses.

use std::collections::BTreeMap;

use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderValue, header};

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie configuration
///
/// Attributes shared by every value written under one cookie name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age_secs: Option<i64>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: None,
        }
    }
}

impl CookieConfig {
    /// Build Set-Cookie header value
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={}", self.name, value);

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie.push_str(&format!("; Path={}", self.path));

        if let Some(max_age) = self.max_age_secs {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }

        cookie
    }
}

/// A single cookie write requested for the outgoing response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub config: CookieConfig,
    pub value: String,
}

impl SetCookie {
    pub fn new(config: CookieConfig, value: impl Into<String>) -> Self {
        Self {
            config,
            value: value.into(),
        }
    }

    /// A write that removes the cookie from the browser
    pub fn removal(config: CookieConfig) -> Self {
        Self {
            config: CookieConfig {
                max_age_secs: Some(0),
                ..config
            },
            value: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn is_removal(&self) -> bool {
        self.config.max_age_secs == Some(0)
    }

    /// Render as a `Set-Cookie` header value
    pub fn to_header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.config.build_set_cookie(&self.value))
    }
}

/// Cookies sent by the client, as they were when the request arrived
///
/// Responses never mutate this snapshot; cookie writes are staged as
/// [`SetCookie`] values instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies {
    values: BTreeMap<String, String>,
}

impl RequestCookies {
    /// Parse every `Cookie` header on the request
    ///
    /// When a name repeats, the first occurrence wins.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut values = BTreeMap::new();

        for raw in headers.get_all(header::COOKIE) {
            let Ok(raw) = raw.to_str() else {
                continue;
            };
            for pair in raw.split(';') {
                if let Some((key, value)) = pair.trim().split_once('=') {
                    let key = key.trim();
                    if key.is_empty() {
                        continue;
                    }
                    values
                        .entry(key.to_string())
                        .or_insert_with(|| value.trim().to_string());
                }
            }
        }

        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
