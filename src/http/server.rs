//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared state (rate limiter, challenge verifier, backend forwarder)
//! - Create the Axum router with the signup route
//! - Wire up middleware (response headers, request ID, tracing)
//!
//! Time limits live on the outbound client only, so a slow backend surfaces
//! as a 502 from the forwarder.
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::HeaderName, middleware, routing::any, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::forward::BackendForwarder;
use crate::http::handler::signup_handler;
use crate::security::headers::{response_headers_middleware, ResponseHeaders};
use crate::security::{ChallengeVerifier, RateLimiter};

/// Errors raised while constructing or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid client IP header '{0}'")]
    ClientIpHeader(String),
}

/// Application state injected into handlers.
///
/// Disabled stages are `None`; with both off the gatekeeper degrades to a
/// validating pass-through.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Option<Arc<RateLimiter>>,
    pub verifier: Option<Arc<ChallengeVerifier>>,
    pub forwarder: Arc<BackendForwarder>,
    pub client_ip_header: Option<HeaderName>,
    pub max_body_size: usize,
}

/// HTTP server for the gatekeeper.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        // One pooled client for both outbound calls.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .build()?;

        let client_ip_header = config
            .listener
            .client_ip_header
            .as_deref()
            .map(|name| {
                HeaderName::try_from(name).map_err(|_| ServerError::ClientIpHeader(name.to_string()))
            })
            .transpose()?;

        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::from_config(&config.rate_limit)));
        let verifier = config
            .challenge
            .enabled
            .then(|| Arc::new(ChallengeVerifier::new(client.clone(), &config.challenge)));
        let forwarder = Arc::new(BackendForwarder::new(client, config.backend.url.clone()));

        if !forwarder.is_configured() {
            tracing::warn!("Backend URL is not configured; signups will be rejected with 500");
        }
        if limiter.is_none() {
            tracing::warn!("Rate limiting disabled");
        }
        if verifier.is_none() {
            tracing::warn!("Challenge verification disabled");
        }

        let state = AppState {
            limiter,
            verifier,
            forwarder,
            client_ip_header,
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            state,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Response headers sit outermost so that every response, including
    /// unmatched paths, is decorated.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let headers = Arc::new(ResponseHeaders::new(&config.cors));

        Router::new()
            .route(&config.listener.path, any(signup_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn_with_state(headers, response_headers_middleware))
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http()),
            )
    }

    /// The router, for serving or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.listener.path,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
