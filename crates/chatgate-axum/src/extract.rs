//! Custom extractors.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use chatgate_core::UNKNOWN_CLIENT;

/// Peer address of the connection, or `"unknown"`.
///
/// Reads the [`ConnectInfo`] installed by
/// `into_make_service_with_connect_info`. Routers driven without it (for
/// example through `oneshot` in tests) still extract successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(|| UNKNOWN_CLIENT.to_string(), |ConnectInfo(addr)| addr.ip().to_string());
        Ok(Self(addr))
    }
}
