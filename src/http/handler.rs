//! Signup request orchestration.
//!
//! ```text
//! OPTIONS → 204 (headers only)
//! other non-POST → 405
//! POST → body limit → rate limit → challenge → validate/sanitize → forward
//! ```
//!
//! Each stage short-circuits with a [`GatewayError`]; security and CORS
//! headers are added by the outer middleware, not here.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::GatewayError;
use crate::http::request::client_addr;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::challenge::extract_token;
use crate::security::limits::read_body;
use crate::security::{Decision, Identifier};
use crate::signup::SignupSubmission;

/// Single entry point for the signup route.
pub async fn signup_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();

    match process(&state, request).await {
        Ok((response, outcome)) => {
            metrics::record_request(outcome, start);
            response
        }
        Err(e) => {
            metrics::record_request(e.outcome(), start);
            e.into_response()
        }
    }
}

async fn process(
    state: &AppState,
    request: Request<Body>,
) -> Result<(Response, &'static str), GatewayError> {
    match *request.method() {
        Method::OPTIONS => return Ok((StatusCode::NO_CONTENT.into_response(), "preflight")),
        Method::POST => {}
        _ => return Err(GatewayError::MethodNotAllowed),
    }

    let (parts, body) = request.into_parts();
    let client = client_addr(&parts.headers, &parts.extensions, state.client_ip_header.as_ref());
    let body = read_body(body, state.max_body_size).await?;

    if let Some(limiter) = &state.limiter {
        let identifier = Identifier::from_request(&body, client.as_deref());
        if limiter.check(&identifier) == Decision::Limited {
            return Err(GatewayError::RateLimited);
        }
    }

    if let Some(verifier) = &state.verifier {
        let token = extract_token(&body);
        if !verifier.verify(token.as_deref(), client.as_deref()).await {
            return Err(GatewayError::ChallengeFailed);
        }
    }

    let submission = SignupSubmission::from_body(&body)?;
    let response = state.forwarder.forward(&submission).await?;
    Ok((response, "forwarded"))
}
