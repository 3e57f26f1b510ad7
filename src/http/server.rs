//! HTTP server setup and the forwarding loop.
//!
//! # Responsibilities
//! - Build the Axum router with the catch-all proxy handler
//! - Hold the shared upstream client, target, and banner
//! - Serve the listener with graceful shutdown
//! - Map upstream and rewrite failures to 502 responses
//!
//! # Design Decisions
//! - One tokio task per request, scheduling supplied entirely by the engine
//! - No upstream timeout: a stalled upstream holds its own task only —
//!   known gap, documented rather than papered over
//! - No retries; a failed response is never reattempted

use std::net::SocketAddr;

use axum::http::uri::{Authority, Scheme};
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::{validate_upstream, ConfigError, ProxyConfig};
use crate::http::{request, response};
use crate::rewrite::Banner;

/// Application state injected into handlers. Everything here is immutable
/// after startup and cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub scheme: Scheme,
    pub authority: Authority,
    pub banner: Banner,
}

/// HTTP server for the forwarding proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new server with the given configuration.
    ///
    /// Fails fast on an unusable upstream URL, before any socket is bound.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let target = validate_upstream(&config.upstream)?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let banner = Banner::build(&config.banner.message, &config.banner.color);

        tracing::debug!(
            authority = %target.authority,
            banner_bytes = banner.len(),
            "Proxy state initialized"
        );

        let state = AppState {
            client,
            scheme: target.scheme,
            authority: target.authority,
            banner,
        };

        Ok(Self {
            router: Self::build_router(state),
        })
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler: rewrite the request, forward it, intercept the
/// response.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    mut req: Request<Body>,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    request::rewrite_for_upstream(&mut req, &state.scheme, &state.authority, client_addr);

    tracing::debug!(
        method = %method,
        path = %path,
        client = %client_addr,
        "Proxying request"
    );

    let upstream_response = match state.client.request(req).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(method = %method, path = %path, error = %e, "Upstream request failed");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    match response::intercept(upstream_response, &state.banner) {
        Ok(r) => r.into_response(),
        Err(e) => {
            // The unmodified upstream body is never passed through on a
            // rewrite failure.
            tracing::error!(method = %method, path = %path, error = %e, "Response rewrite failed");
            (StatusCode::BAD_GATEWAY, "Failed to process upstream response").into_response()
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
