//! HTTP response types
//!
//! Every API endpoint answers with an [`ApiResponse`] envelope; errors are
//! mapped to status codes in [`handle_error`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Convert AppResult to HTTP response
pub fn handle_result<T>(result: AppResult<T>) -> Response
where
    T: Serialize,
{
    match result {
        Ok(data) => ok(data).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Convert AppError to the matching HTTP status
pub fn handle_error(error: AppError) -> Response {
    let (status, message) = match &error {
        AppError::OperationInProgress { .. } => (StatusCode::CONFLICT, error.to_string()),
        AppError::Configuration { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Configuration error: {message}"),
        ),
        AppError::ExternalService { service, message } => (
            StatusCode::BAD_GATEWAY,
            format!("External service error ({service}): {message}"),
        ),
        AppError::Http(_) => (
            StatusCode::BAD_GATEWAY,
            "External service communication failed".to_string(),
        ),
        AppError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Data access failed".to_string(),
        ),
        AppError::Source(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Source operation failed".to_string(),
        ),
    };

    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

pub fn accepted<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::ACCEPTED, Json(ApiResponse::success(data)))
}

pub fn conflict(message: &str) -> impl IntoResponse {
    (
        StatusCode::CONFLICT,
        Json(ApiResponse::<()>::error(message.to_string())),
    )
}

pub fn service_unavailable(message: &str) -> impl IntoResponse {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::<()>::error(message.to_string())),
    )
}
