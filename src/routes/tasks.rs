// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Task handler routes for scheduler callbacks.
//!
//! These endpoints are called by an external scheduler (Cloud Scheduler,
//! cron + curl), not by users. Each call runs one sweep and returns its
//! report; a fatal listing failure becomes a 502.

use crate::error::Result;
use crate::middleware::require_scheduler_auth;
use crate::sweep::{IncompleteUserSweep, SweepReport, TypingIndicatorSweep, TypingSweepReport};
use crate::AppState;
use axum::{
    extract::{Json, State},
    middleware,
    routing::post,
    Router,
};
use std::sync::Arc;

/// Task handler routes, guarded by the scheduler token.
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks/sweep-incomplete-users", post(sweep_incomplete_users))
        .route("/tasks/sweep-typing-indicators", post(sweep_typing_indicators))
        .route_layer(middleware::from_fn_with_state(state, require_scheduler_auth))
}

/// Remove incomplete registrations past the grace period.
async fn sweep_incomplete_users(State(state): State<Arc<AppState>>) -> Result<Json<SweepReport>> {
    tracing::info!(backend = state.store.backend_name(), "Incomplete user sweep requested");

    let sweep = IncompleteUserSweep::new(state.store.clone(), state.config.sweep.clone());
    let report = sweep.sweep().await?;
    Ok(Json(report))
}

/// Remove stale typing indicators.
async fn sweep_typing_indicators(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TypingSweepReport>> {
    tracing::info!(backend = state.store.backend_name(), "Typing indicator sweep requested");

    let sweep = TypingIndicatorSweep::new(
        state.store.clone(),
        state.config.sweep.clone(),
        state.config.typing.clone(),
    );
    let report = sweep.sweep().await?;
    Ok(Json(report))
}
