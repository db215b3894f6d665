// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-shot sweep runner.
//!
//! Runs the incomplete-user sweep (and optionally the typing-indicator
//! sweep) once, prints the reports as JSON on stdout and exits. Exit status
//! is 0 whenever the sweeps complete, however many records were deleted or
//! failed; it is 1 only when configuration, connecting or listing fails.
//!
//! Cron example: `*/5 * * * * ucera-sweep >> /var/log/ucera-sweep.json`

use anyhow::Context;
use std::process::ExitCode;
use ucera_maintenance::config::Config;
use ucera_maintenance::db::Store;
use ucera_maintenance::logging::init_logging_stderr;
use ucera_maintenance::sweep::{IncompleteUserSweep, TypingIndicatorSweep};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging_stderr();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Sweep aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let store = Store::connect(&config)
        .await
        .context("Failed to connect to document store")?;

    let report = IncompleteUserSweep::new(store.clone(), config.sweep.clone())
        .sweep()
        .await?;
    println!("{}", serde_json::to_string(&report)?);

    if config.sweep_typing_indicators {
        let report = TypingIndicatorSweep::new(store, config.sweep.clone(), config.typing.clone())
            .sweep()
            .await?;
        println!("{}", serde_json::to_string(&report)?);
    }

    Ok(())
}
