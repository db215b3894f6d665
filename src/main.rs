// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! UC ERA maintenance server
//!
//! Exposes the record-hygiene sweeps as task endpoints for an external
//! scheduler.

use std::sync::Arc;
use ucera_maintenance::{config::Config, db::Store, logging::init_logging, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.store_backend,
        "Starting UC ERA maintenance server"
    );
    if config.scheduler_token.is_none() {
        tracing::warn!("SCHEDULER_TOKEN not set; all /tasks requests will be refused");
    }

    let store = Store::connect(&config).await?;

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
    });

    let app = ucera_maintenance::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
