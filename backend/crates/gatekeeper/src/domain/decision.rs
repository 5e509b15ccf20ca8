//! Gate Decision
//!
//! The per-request state machine reduced to a pure function. A request is
//! refreshed, classified, then ends in exactly one of three outcomes; the
//! middleware applies security headers to all of them.

use platform::config::Environment;
use url::form_urlencoded;

use crate::domain::route_policy::RoutePolicy;

/// Terminal outcome for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Hand the request to its handler
    Allow,
    /// Send the client to sign-in
    Redirect { location: String },
    /// Answer 404
    Block,
}

impl Decision {
    /// State name used in logs
    pub fn state(&self) -> &'static str {
        match self {
            Decision::Allow => "allowed",
            Decision::Redirect { .. } => "redirected",
            Decision::Block => "blocked",
        }
    }
}

/// Where unauthenticated requests to protected routes are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInRedirect {
    pub sign_in_path: String,
    pub return_to_param: String,
}

impl SignInRedirect {
    pub fn new(sign_in_path: impl Into<String>, return_to_param: impl Into<String>) -> Self {
        Self {
            sign_in_path: sign_in_path.into(),
            return_to_param: return_to_param.into(),
        }
    }

    /// Sign-in URL carrying the original path and query, percent-encoded
    pub fn location(&self, path_and_query: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.return_to_param, path_and_query)
            .finish();
        format!("{}?{}", self.sign_in_path, query)
    }
}

/// Decide the outcome for a classified request
pub fn decide(
    policy: RoutePolicy,
    has_session: bool,
    environment: Environment,
    sign_in: &SignInRedirect,
    path_and_query: &str,
) -> Decision {
    match policy {
        RoutePolicy::Debug if environment.is_production() => Decision::Block,
        RoutePolicy::Protected if !has_session => Decision::Redirect {
            location: sign_in.location(path_and_query),
        },
        _ => Decision::Allow,
    }
}
