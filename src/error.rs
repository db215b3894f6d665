// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types: store failures, sweep failures and HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure talking to the document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Store rejected credentials: {0}")]
    Unauthorized(String),

    #[error("Store request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Store transport error: {0}")]
    Transport(String),

    #[error("Store API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode store response: {0}")]
    Decode(String),

    #[error("Database not connected (offline mode)")]
    Offline,
}

impl StoreError {
    /// A delete that hits a missing document has already achieved its goal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Failure that aborts a whole sweep invocation.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("Failed to list {collection}: {source}")]
    Listing {
        collection: &'static str,
        #[source]
        source: StoreError,
    },
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Forbidden")]
    Forbidden,

    #[error(transparent)]
    Sweep(#[from] SweepError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
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
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", None),
            AppError::Sweep(err) => {
                tracing::error!(error = %err, "Sweep aborted");
                (StatusCode::BAD_GATEWAY, "store_unavailable", Some(err.to_string()))
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
