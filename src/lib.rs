// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! UC ERA maintenance: record-hygiene sweeps for the UC ERA document store.
//!
//! This crate removes abandoned registrations and stale chat typing
//! indicators, either on demand (the `ucera-sweep` binary) or when an
//! external scheduler calls the task endpoints of the server.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod sweep;

use config::Config;
use db::Store;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Store,
}
