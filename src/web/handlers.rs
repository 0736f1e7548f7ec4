//! Request handlers for the control-plane API

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tokio::sync::mpsc::error::TrySendError;
use tracing::info;

use super::responses::{accepted, conflict, handle_result, service_unavailable};
use super::AppState;
use crate::ingestor::ProcessingTrigger;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Processed items, newest first.
pub async fn list_history(State(state): State<AppState>) -> Response {
    handle_result(state.pipeline.history_snapshot().await)
}

pub async fn clear_history(State(state): State<AppState>) -> Response {
    info!("History clear requested over the API");
    handle_result(
        state
            .pipeline
            .clear_history()
            .await
            .map(|_| json!({ "cleared": true })),
    )
}

/// Queue a manual run. The run itself happens on the scheduler task.
pub async fn trigger_run(State(state): State<AppState>) -> Response {
    match state.trigger_tx.try_send(ProcessingTrigger::Manual) {
        Ok(()) => {
            info!("Manual run requested over the API");
            accepted(json!({ "queued": true })).into_response()
        }
        Err(TrySendError::Full(_)) => {
            conflict("A run request is already queued").into_response()
        }
        Err(TrySendError::Closed(_)) => {
            service_unavailable("Scheduler is not running").into_response()
        }
    }
}
