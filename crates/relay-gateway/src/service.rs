//! Gateway service: router construction and the HTTP server.

use crate::domain::{CorsConfig, GatewayConfig, GatewayError};
use crate::handlers::{health_check, player_score, record_hit, status, top_scores};
use crate::middleware::create_cors_layer;
use axum::routing::{get, post};
use axum::Router;
use relay_core::{Address, RelayQueue, Scoreboard};
use std::future::Future;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub queue: RelayQueue,
    pub scoreboard: Arc<Scoreboard>,
    /// Address of the primary (deployer) identity.
    pub deployer: Address,
}

/// Build the HTTP router.
pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer(cors));

    Router::new()
        .route("/recordHit", post(record_hit))
        .route("/status", get(status))
        .route("/topScores", get(top_scores))
        .route("/playerScore/:address", get(player_score))
        .route("/health", get(health_check))
        .layer(middleware)
        .with_state(state)
}

pub struct GatewayService {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayService {
    pub fn new(config: GatewayConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config.cors)
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.socket_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;
        info!(addr = %addr, "Relay gateway listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::Server(e.to_string()))?;

        info!("Relay gateway stopped");
        Ok(())
    }
}
