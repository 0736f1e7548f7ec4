//! Control-plane HTTP API
//!
//! A small axum router: health, the history view, clearing the history and
//! queueing a manual run. Runs themselves are executed by the scheduler.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::WebConfig;
use crate::ingestor::scheduler::RunTriggerSender;
use crate::ingestor::Pipeline;

pub mod handlers;
pub mod responses;

pub use responses::{handle_error, handle_result, ApiResponse};

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &WebConfig, state: AppState) -> Result<Self> {
        let app = Self::create_router(state);
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
        Ok(Self { app, addr })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health_check))
            .nest("/api/v1", Self::api_v1_routes())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    fn api_v1_routes() -> Router<AppState> {
        Router::new()
            .route(
                "/history",
                get(handlers::list_history).delete(handlers::clear_history),
            )
            .route("/run", post(handlers::trigger_run))
    }

    /// Serve until `shutdown` is cancelled.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!("Web server listening on http://{}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub trigger_tx: RunTriggerSender,
}
