// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Cabinet not found: {0}")]
    CabinetNotFound(String),

    #[error("Not allowed on the current screen: {0}")]
    Conflict(String),

    #[error("Store read failed: {0}")]
    StoreRead(String),

    #[error("Store write failed: {0}")]
    StoreWrite(String),

    #[error("Remote operation timed out: {0}")]
    Timeout(String),

    #[error("Photo upload failed: {0}")]
    Upload(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the error came from the remote document store.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            AppError::StoreRead(_) | AppError::StoreWrite(_) | AppError::Timeout(_)
        )
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::AuthFailed(msg) => {
                (StatusCode::UNAUTHORIZED, "auth_failed", Some(msg.clone()))
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_failed", Some(msg.clone()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::CabinetNotFound(code) => (
                StatusCode::NOT_FOUND,
                "cabinet_not_found",
                Some(code.clone()),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::StoreRead(msg) => {
                tracing::error!(error = %msg, "Store read failed");
                (StatusCode::BAD_GATEWAY, "store_read_failed", None)
            }
            AppError::StoreWrite(msg) => {
                tracing::error!(error = %msg, "Store write failed");
                (StatusCode::BAD_GATEWAY, "store_write_failed", None)
            }
            AppError::Timeout(op) => {
                tracing::error!(operation = %op, "Remote operation timed out");
                (StatusCode::GATEWAY_TIMEOUT, "timeout", Some(op.clone()))
            }
            AppError::Upload(msg) => {
                (StatusCode::BAD_GATEWAY, "upload_failed", Some(msg.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
