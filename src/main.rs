//! Environment-Banner Forwarding Proxy
//!
//! A transparent proxy built with Tokio and Axum that forwards every request
//! to a single upstream and splices an environment banner into every HTML
//! response.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                BANNER PROXY                   │
//!                    │                                               │
//!   Client Request   │  ┌─────────┐    ┌───────────────┐            │
//!   ─────────────────┼─▶│  http   │───▶│    request    │────────────┼──▶ Upstream
//!                    │  │ server  │    │   rewriter    │            │
//!                    │  └─────────┘    └───────────────┘            │
//!                    │                                               │
//!   Client Response  │  ┌─────────┐    ┌───────────────┐            │
//!   ◀────────────────┼──│response │◀───│ banner splice │◀───────────┼─── Upstream
//!                    │  │intercept│    │ (rewrite::*)  │            │
//!                    │  └─────────┘    └───────────────┘            │
//!                    │                                               │
//!                    │  config (flags) · tracing · graceful shutdown │
//!                    └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use banner_proxy::config::Cli;
use banner_proxy::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banner_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("banner-proxy v0.1.0 starting");

    let config = Cli::parse().into_config();

    tracing::info!(
        upstream = %config.upstream.url,
        bind_address = %config.listener.bind_address,
        message = %config.banner.message,
        color = %config.banner.color,
        "Configuration loaded"
    );

    let bind_address = config.listener.bind_address.clone();

    // An unusable upstream URL aborts before the listener ever binds.
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
