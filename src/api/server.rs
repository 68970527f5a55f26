//! API Server
//!
//! Router assembly, middleware stack, graceful shutdown, and the eviction
//! sweeper's lifecycle.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::{config::CommonpoolConfig, registry::GameRegistry};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// Game API server
pub struct ApiServer {
    config: CommonpoolConfig,
    registry: Arc<GameRegistry>,
}

impl ApiServer {
    pub fn new(config: CommonpoolConfig, registry: Arc<GameRegistry>) -> Self {
        Self { config, registry }
    }

    /// Start the API server. Blocks until a shutdown signal arrives.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "commonpool=info,tower_http=info".into()),
            )
            .init();

        let sweeper = Arc::clone(&self.registry).spawn_sweeper();
        let app = self.create_app();
        let addr = self.socket_addr()?;

        info!("Starting commonpool game server");
        info!("   Listen: http://{}", addr);
        self.log_server_info();

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        sweeper.abort();
        info!("Server stopped gracefully");
        Ok(())
    }

    /// Create the application with the full middleware stack. Public so
    /// integration tests can drive the exact router the binary serves.
    pub fn create_app(&self) -> axum::Router {
        let state = Arc::new(AppState {
            registry: self.registry.clone(),
        });

        create_router(state)
            // Request ID middleware (first for tracing)
            .layer(axum::middleware::from_fn(request_id_middleware))
            // CORS layer (before timeout to handle preflight)
            .layer(create_cors_layer(self.config.api.cors_origins.clone()))
            // Timeout layer
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.api.request_timeout_secs,
            )))
            // Tracing layer (last for complete request tracing)
            .layer(TraceLayer::new_for_http())
    }

    fn socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.config.api.host.parse::<std::net::IpAddr>()?,
            self.config.api.port,
        )))
    }

    fn log_server_info(&self) {
        info!("Server configuration:");
        info!("   Version: {}", env!("CARGO_PKG_VERSION"));
        info!("   CORS: {:?}", self.config.api.cors_origins);
        info!("   Request timeout: {}s", self.config.api.request_timeout_secs);
        info!(
            "   Eviction: games older than {}s, swept every {}s",
            self.config.registry.max_age_secs, self.config.registry.sweep_interval_secs
        );

        info!("Available endpoints:");
        info!("   GET  /health            - Health check");
        info!("   POST /api/game/create   - Create a lobby");
        info!("   POST /api/game/join     - Join a lobby by code");
        info!("   GET  /api/game/status   - Poll game state");
        info!("   POST /api/game/submit   - Submit an investment split");
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
