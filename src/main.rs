//! Signup gatekeeper.
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!   Client               │                 GATEKEEPER                   │
//!   ─── POST /signup ───▶│ body limit → rate limit → challenge → valid. │──▶ Backend
//!   ◀── status/body ─────│ ◀──────── security + CORS headers ◀───────── │◀──
//!                        └──────────────────────────────────────────────┘
//!                                   │                │
//!                            in-process store   verification
//!                            (email/IP keys)      service
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use signup_gatekeeper::config::load_effective;
use signup_gatekeeper::lifecycle::{signals, Shutdown};
use signup_gatekeeper::observability::{init_logging, metrics};
use signup_gatekeeper::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "signup-gatekeeper")]
#[command(about = "Rate limiting, challenge-verifying gatekeeper for a signup backend")]
struct Args {
    /// Path to a TOML config file. Defaults and environment apply without one.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_effective(args.config.as_deref())?;

    init_logging(&config.observability);
    tracing::info!("signup-gatekeeper v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend_configured = config.backend.url.is_some(),
        rate_limit = config.rate_limit.enabled,
        challenge = config.challenge.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
