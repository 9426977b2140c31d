//! Axum server setup.
//!
//! Server skeleton with:
//! - Tracing middleware
//! - Per-request timeout (the deadline the core deliberately lacks)
//! - Graceful shutdown on SIGTERM/Ctrl+C, closing every registered
//!   connection on the way out

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use sqlgate_core::Gateway;

use super::routes;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8800)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,

    /// Per-request deadline in seconds (default: 30). A hung query blocks
    /// its handling task until this fires; the core itself never cancels.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8800)),
            cors_permissive: false,
            timeout_secs: 30,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// Build the application router with all routes.
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let cors = if config.cors_permissive {
        tracing::warn!("CORS: permissive mode enabled, all origins allowed");
        CorsLayer::permissive()
    } else {
        CorsLayer::new().allow_methods(Any).allow_headers(Any)
    };

    Router::new()
        .merge(routes::health::router())
        .merge(routes::connections::router())
        .merge(routes::queries::router())
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server.
///
/// Serves until Ctrl+C or SIGTERM, then closes every connection the gateway
/// still holds. That shutdown pass is the only point at which registered
/// connections die.
pub async fn run_server(gateway: Arc<Gateway>, config: ServerConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", config.bind_addr);

    serve_with_shutdown(gateway, &config, listener, shutdown_signal()).await
}

/// Serve until `signal` resolves, then close every registered connection.
///
/// The cleanup pass runs whether serve exits cleanly or with an error.
async fn serve_with_shutdown(
    gateway: Arc<Gateway>,
    config: &ServerConfig,
    listener: TcpListener,
    signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let state = Arc::new(AppState {
        gateway: Arc::clone(&gateway),
    });
    let app = build_router(state, config);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await;

    gateway.shutdown().await;
    result?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
