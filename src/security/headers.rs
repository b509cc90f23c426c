//! Security and CORS response headers.
//!
//! Every response leaving the gatekeeper carries the same fixed set, whether
//! it was produced locally (preflight, rejections, 404) or relayed from the
//! backend. Values set here override anything the backend sent.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::config::CorsConfig;

const SECURITY_HEADERS: [(&str, &str); 7] = [
    ("content-security-policy", "default-src 'none'; frame-ancestors 'none';"),
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=63072000; includeSubDomains; preload"),
    ("x-xss-protection", "1; mode=block"),
    ("cache-control", "no-store"),
];

const ALLOW_METHODS: &str = "POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

/// The precomputed header set applied to every response.
#[derive(Debug, Clone)]
pub struct ResponseHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl ResponseHeaders {
    /// Build the header set for the configured origin. The origin is checked
    /// by config validation; an unusable value is dropped with an error log.
    pub fn new(cors: &CorsConfig) -> Self {
        let mut headers: Vec<(HeaderName, HeaderValue)> = SECURITY_HEADERS
            .iter()
            .map(|&(name, value)| (HeaderName::from_static(name), HeaderValue::from_static(value)))
            .collect();

        match HeaderValue::from_str(&cors.allowed_origin) {
            Ok(origin) => headers.push((
                axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN,
                origin,
            )),
            Err(e) => tracing::error!(
                origin = %cors.allowed_origin,
                error = %e,
                "Invalid CORS origin, header omitted"
            ),
        }
        headers.push((
            axum::http::header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ));
        headers.push((
            axum::http::header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ));

        Self { headers }
    }

    /// Overwrite the security and CORS headers in `target`.
    pub fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in &self.headers {
            target.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter().map(|(name, value)| (name, value))
    }
}

/// Middleware decorating every response with [`ResponseHeaders`].
pub async fn response_headers_middleware(
    State(headers): State<Arc<ResponseHeaders>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    headers.apply(response.headers_mut());
    response
}
