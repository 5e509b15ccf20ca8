//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use platform::cookie::{RequestCookies, SetCookie};
use platform::rate_limit::RateLimitStore;

use crate::application::{
    SignInInput, SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase,
};
use crate::domain::provider::AuthProvider;
use crate::domain::session::CurrentSession;
use crate::error::{GatekeeperError, GatekeeperResult};
use crate::presentation::dto::{
    CsrfTokenResponse, SessionStatusResponse, SignInRequest, SignInResponse, SignOutRequest,
    SignUpRequest, SignUpResponse,
};
use crate::presentation::extract::ClientIdentifier;
use crate::presentation::state::GatekeeperState;

/// Header accepted in place of the `_csrf` body field
pub const CSRF_HEADER: &str = "x-csrf-token";

// ============================================================================
// CSRF
// ============================================================================

/// GET /api/auth/csrf
pub async fn issue_csrf_token<A, S>(
    State(state): State<GatekeeperState<A, S>>,
    headers: HeaderMap,
) -> GatekeeperResult<Response>
where
    A: AuthProvider + Send + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
{
    let cookies = RequestCookies::from_headers(&headers);
    let issued = state.csrf.issue_or_refresh(&cookies);

    let mut response = Json(CsrfTokenResponse {
        csrf_token: issued.token,
    })
    .into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    append_set_cookies(response, &[issued.cookie])
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/sign-in
pub async fn sign_in<A, S>(
    State(state): State<GatekeeperState<A, S>>,
    ClientIdentifier(client): ClientIdentifier,
    headers: HeaderMap,
    Json(req): Json<SignInRequest>,
) -> GatekeeperResult<Response>
where
    A: AuthProvider + Send + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
{
    let cookies = RequestCookies::from_headers(&headers);
    let use_case = SignInUseCase::new(
        state.provider.clone(),
        state.limiter.clone(),
        state.csrf.clone(),
        state.config.clone(),
    );

    let input = SignInInput {
        email: req.email,
        password: req.password,
        csrf_token: supplied_csrf(req.csrf, &headers),
        return_to: req.redirect_to,
        client,
    };

    let output = use_case.execute(input, &cookies).await?;

    let response = Json(SignInResponse {
        user_id: output.user.to_string(),
        redirect_to: output.redirect_to,
    })
    .into_response();

    append_set_cookies(response, &output.cookie_mutations)
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/sign-up
pub async fn sign_up<A, S>(
    State(state): State<GatekeeperState<A, S>>,
    ClientIdentifier(client): ClientIdentifier,
    headers: HeaderMap,
    Json(req): Json<SignUpRequest>,
) -> GatekeeperResult<Response>
where
    A: AuthProvider + Send + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
{
    let cookies = RequestCookies::from_headers(&headers);
    let use_case = SignUpUseCase::new(
        state.provider.clone(),
        state.limiter.clone(),
        state.csrf.clone(),
        state.config.clone(),
    );

    let input = SignUpInput {
        email: req.email,
        password: req.password,
        csrf_token: supplied_csrf(req.csrf, &headers),
        client,
    };

    let output = use_case.execute(input, &cookies).await?;

    let response = (
        StatusCode::CREATED,
        Json(SignUpResponse {
            user_id: output.user.to_string(),
            confirmation_required: output.confirmation_required,
        }),
    )
        .into_response();

    append_set_cookies(response, &output.cookie_mutations)
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/auth/sign-out
pub async fn sign_out<A, S>(
    State(state): State<GatekeeperState<A, S>>,
    headers: HeaderMap,
    Json(req): Json<SignOutRequest>,
) -> GatekeeperResult<Response>
where
    A: AuthProvider + Send + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
{
    let cookies = RequestCookies::from_headers(&headers);
    let use_case = SignOutUseCase::new(
        state.provider.clone(),
        state.csrf.clone(),
        state.config.clone(),
    );

    let csrf = supplied_csrf(req.csrf, &headers);
    let cleared = use_case.execute(csrf.as_deref(), &cookies).await?;

    append_set_cookies(StatusCode::NO_CONTENT.into_response(), &cleared)
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/auth/session
pub async fn session_status(session: CurrentSession) -> Json<SessionStatusResponse> {
    Json(SessionStatusResponse {
        authenticated: session.is_authenticated(),
        user_id: session.user().map(|u| u.to_string()),
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Body field first, then the `x-csrf-token` header
fn supplied_csrf(body: Option<String>, headers: &HeaderMap) -> Option<String> {
    body.filter(|t| !t.is_empty()).or_else(|| {
        headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}

fn append_set_cookies(mut response: Response, cookies: &[SetCookie]) -> GatekeeperResult<Response> {
    for cookie in cookies {
        let value = cookie.to_header_value().map_err(|e| {
            GatekeeperError::Internal(format!("invalid Set-Cookie for {}: {}", cookie.name(), e))
        })?;
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    Ok(response)
}
