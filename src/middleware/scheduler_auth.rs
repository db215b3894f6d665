// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduler authentication middleware for `/tasks/*` routes.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Require `Authorization: Bearer <SCHEDULER_TOKEN>`.
///
/// With no token configured every task request is refused.
pub async fn require_scheduler_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.scheduler_token.as_deref() else {
        tracing::warn!("Blocked tasks request: SCHEDULER_TOKEN not configured");
        return Err(AppError::Forbidden);
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let is_valid = presented
        .map(|token| bool::from(token.as_bytes().ct_eq(expected.as_bytes())))
        .unwrap_or(false);

    if !is_valid {
        tracing::warn!(
            has_header = presented.is_some(),
            path = %request.uri().path(),
            "Blocked tasks request with invalid scheduler token"
        );
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}
