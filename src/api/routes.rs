//! Router, shared state and server lifecycle.

use std::sync::Arc;

use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::runs;
use super::types::HealthResponse;
use crate::agent::AgentRegistry;
use crate::config::{Config, Credentials};
use crate::framework::{FrameworkRef, RuntimeClient};

/// Shared application state.
pub struct AppState {
    /// Credentials every API run uses.
    pub credentials: Credentials,
    pub registry: AgentRegistry,
}

impl AppState {
    pub fn new(config: Arc<Config>, credentials: Credentials, framework: FrameworkRef) -> Self {
        Self {
            registry: AgentRegistry::new(framework, config),
            credentials,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/agents/:agent_id/runs", post(runs::create_run))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let credentials = config.credentials.require()?;
    let framework: FrameworkRef = Arc::new(RuntimeClient::new(config.runtime_url.clone()));
    tracing::info!("Using agent runtime at {}", config.runtime_url);

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(Arc::new(config), credentials, framework));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Resolve on SIGTERM or Ctrl+C.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
