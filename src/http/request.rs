//! Caller address resolution.
//!
//! Behind an edge proxy the TCP peer is the proxy itself, so the configured
//! client-IP header wins when present. Direct connections fall back to the
//! peer address recorded by `into_make_service_with_connect_info`.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap, HeaderName};

/// Resolve the caller's address, if it can be determined.
pub fn client_addr(
    headers: &HeaderMap,
    extensions: &Extensions,
    client_ip_header: Option<&HeaderName>,
) -> Option<String> {
    client_ip_header
        .and_then(|name| headers.get(name))
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}
