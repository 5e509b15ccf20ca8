//! Gatekeeper Middleware
//!
//! Runs the per-request pipeline: session refresh, classification, one of
//! allow/redirect/block, then cookie relay and security headers on whatever
//! response came out.

use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::cookie::{RequestCookies, SetCookie};
use platform::rate_limit::RateLimitStore;

use crate::domain::decision::{Decision, decide};
use crate::domain::provider::AuthProvider;
use crate::domain::route_policy::RoutePolicy;
use crate::domain::session::CurrentSession;
use crate::presentation::state::GatekeeperState;

/// Gatekeeper middleware
pub async fn gatekeeper<A, S>(
    State(state): State<GatekeeperState<A, S>>,
    mut req: Request,
    next: Next,
) -> Response
where
    A: AuthProvider + Send + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
{
    let cookies = RequestCookies::from_headers(req.headers());
    let lookup = state.session_bridge().refresh(&cookies).await;

    let path = req.uri().path().to_string();
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    let policy = state.routes.classify(&path);

    // Browsers send CORS preflights without cookies
    let decision = if req.method() == Method::OPTIONS && policy == RoutePolicy::Protected {
        Decision::Allow
    } else {
        decide(
            policy,
            lookup.user.is_some(),
            state.config.environment,
            &state.sign_in,
            &path_and_query,
        )
    };

    tracing::debug!(
        path = %path,
        policy = policy.as_str(),
        state = decision.state(),
        "Gatekeeper decision"
    );

    let mut response = match decision {
        Decision::Allow => {
            req.extensions_mut()
                .insert(CurrentSession::new(lookup.user.clone()));
            next.run(req).await
        }
        Decision::Redirect { location } => {
            tracing::info!(path = %path, "Redirecting unauthenticated request to sign-in");
            redirect(&location, &state.sign_in.sign_in_path)
        }
        Decision::Block => {
            tracing::info!(path = %path, "Blocked debug endpoint");
            AppError::new(ErrorKind::NotFound, "Not found").into_response()
        }
    };

    relay_cookie_mutations(&mut response, &lookup.cookie_mutations);
    state.security_headers.apply(response.headers_mut());

    response
}

fn redirect(location: &str, fallback: &str) -> Response {
    let value = HeaderValue::from_str(location)
        .or_else(|_| HeaderValue::from_str(fallback))
        .unwrap_or_else(|_| HeaderValue::from_static("/"));
    (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, value)]).into_response()
}

/// Put the bridge's cookie writes ahead of any the handler emitted
///
/// Browsers apply `Set-Cookie` headers in order, so a handler that clears
/// the session overrides a refresh from the same request.
pub fn relay_cookie_mutations(response: &mut Response, mutations: &[SetCookie]) {
    if mutations.is_empty() {
        return;
    }

    let headers = response.headers_mut();
    let downstream: Vec<HeaderValue> = headers.get_all(header::SET_COOKIE).iter().cloned().collect();
    headers.remove(header::SET_COOKIE);

    for mutation in mutations {
        match mutation.to_header_value() {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => {
                tracing::warn!(cookie = mutation.name(), error = %e, "Dropped unrenderable session cookie");
            }
        }
    }

    for value in downstream {
        headers.append(header::SET_COOKIE, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::cookie::CookieConfig;

    fn cookie(name: &str, value: &str) -> SetCookie {
        SetCookie::new(
            CookieConfig {
                name: name.to_string(),
                ..CookieConfig::default()
            },
            value,
        )
    }

    #[test]
    fn test_relay_orders_bridge_first() {
        let mut response = StatusCode::OK.into_response();
        response
            .headers_mut()
            .append(header::SET_COOKIE, HeaderValue::from_static("handler=1"));

        relay_cookie_mutations(&mut response, &[cookie("bridge", "a"), cookie("bridge2", "b")]);

        let values: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(values.len(), 3);
        assert!(values[0].starts_with("bridge=a"));
        assert!(values[1].starts_with("bridge2=b"));
        assert_eq!(values[2], "handler=1");
    }

    #[test]
    fn test_relay_skips_invalid_values() {
        let mut response = StatusCode::OK.into_response();
        relay_cookie_mutations(&mut response, &[cookie("bad", "x\ny"), cookie("good", "v")]);
        let values: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_redirect_falls_back_on_invalid_location() {
        let response = redirect("/sign-in?x=\n", "/sign-in");
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/sign-in");
    }
}
