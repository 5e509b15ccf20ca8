//! Request extractors

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use platform::client::client_identifier;

use crate::domain::session::CurrentSession;

/// Rate limiting identifier of the caller
///
/// Forwarded-for address, then real-ip, then the socket address, then
/// `"anonymous"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentifier(pub String);

impl<S> FromRequestParts<S> for ClientIdentifier
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        Ok(Self(client_identifier(&parts.headers, direct_ip)))
    }
}

/// Session established by the gatekeeper middleware; anonymous when the
/// route is not behind it
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or_default())
    }
}
