// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Incomplete-account retention sweep.
//!
//! Registrations that never gained a public photo and a member card are
//! removed once they are older than the grace period. The listing and the
//! deletes are not transactional: a user who finishes their profile between
//! the two can still be deleted unless `recheck_before_delete` is set, which
//! costs one extra read per candidate.

use crate::config::SweepConfig;
use crate::db::DocumentStore;
use crate::error::SweepError;
use crate::models::UserRecord;
use crate::sweep::policy::{self, MissingField};
use crate::sweep::{collect_pages, delete_one, with_timeout, DeleteOutcome, FailedDeletion};
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Diagnostic entry for a record the sweep removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeletedRecord {
    /// Full name, or `NO NAME`
    pub display_name: String,
    pub id: String,
    pub age_minutes: f64,
    pub missing: Vec<MissingField>,
}

/// Outcome of one sweep run.
///
/// `scanned == kept + deleted + already_gone + failed` always holds.
/// Documents that could not be decoded are not scanned; they are counted in
/// `skipped_malformed` and never deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SweepReport {
    pub swept_at: DateTime<Utc>,
    pub grace_period_minutes: f64,
    pub dry_run: bool,
    pub scanned: usize,
    /// Complete, too young, or spared by the recheck
    pub kept: usize,
    /// Removed by this run (would-be removals in a dry run)
    pub deleted: usize,
    /// Candidates some other actor removed first
    pub already_gone: usize,
    pub failed: usize,
    pub pages_fetched: u32,
    /// Listing stopped at the page limit with records left unseen
    pub truncated: bool,
    pub skipped_malformed: usize,
    pub deleted_records: Vec<DeletedRecord>,
    pub failures: Vec<FailedDeletion>,
}

/// Sweep over the users collection.
pub struct IncompleteUserSweep<S> {
    store: S,
    config: SweepConfig,
}

impl<S: DocumentStore> IncompleteUserSweep<S> {
    pub fn new(store: S, config: SweepConfig) -> Self {
        Self { store, config }
    }

    /// Run one pass against the current time.
    pub async fn sweep(&self) -> Result<SweepReport, SweepError> {
        self.sweep_at(Utc::now()).await
    }

    /// Run one pass, computing ages against `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport, SweepError> {
        let grace_period = self.config.grace_period;
        tracing::info!(
            grace_period_secs = grace_period.as_secs(),
            page_size = self.config.page_size,
            max_pages = self.config.max_pages,
            dry_run = self.config.dry_run,
            "Starting incomplete user sweep"
        );

        let store = &self.store;
        let listing = collect_pages(
            "users",
            self.config.page_size,
            self.config.max_pages,
            self.config.request_timeout,
            |request| store.list_users(request),
        )
        .await?;

        let mut report = SweepReport {
            swept_at: now,
            grace_period_minutes: grace_period.as_secs_f64() / 60.0,
            dry_run: self.config.dry_run,
            scanned: listing.items.len(),
            pages_fetched: listing.pages_fetched,
            truncated: listing.truncated,
            skipped_malformed: listing.skipped_malformed,
            ..Default::default()
        };

        let (candidates, keep): (Vec<UserRecord>, Vec<UserRecord>) = listing
            .items
            .into_iter()
            .partition(|user| policy::is_delete_candidate(user, now, grace_period));
        report.kept = keep.len();

        tracing::info!(
            scanned = report.scanned,
            keep = keep.len(),
            candidates = candidates.len(),
            "Classified users"
        );

        let outcomes: Vec<(UserRecord, Removal)> = stream::iter(candidates)
            .map(|user| async move {
                let outcome = self.remove(&user, now).await;
                (user, outcome)
            })
            .buffered(self.config.delete_concurrency.max(1))
            .collect()
            .await;

        for (user, outcome) in outcomes {
            record_outcome(&mut report, &user, now, outcome);
        }

        tracing::info!(
            scanned = report.scanned,
            kept = report.kept,
            deleted = report.deleted,
            already_gone = report.already_gone,
            failed = report.failed,
            truncated = report.truncated,
            skipped_malformed = report.skipped_malformed,
            dry_run = report.dry_run,
            "Incomplete user sweep complete"
        );

        Ok(report)
    }

    /// Delete one candidate. Never returns an error; failures are outcomes.
    async fn remove(&self, user: &UserRecord, now: DateTime<Utc>) -> Removal {
        let timeout = self.config.request_timeout;

        if self.config.recheck_before_delete {
            match with_timeout(timeout, self.store.get_user(&user.id)).await {
                Ok(None) => return Removal::Attempted(DeleteOutcome::AlreadyGone),
                Ok(Some(current))
                    if !policy::is_delete_candidate(&current, now, self.config.grace_period) =>
                {
                    return Removal::Spared
                }
                Ok(Some(_)) => {}
                Err(e) => return Removal::Attempted(DeleteOutcome::Failed(e)),
            }
        }

        Removal::Attempted(
            delete_one(self.config.dry_run, timeout, self.store.delete_user(&user.id)).await,
        )
    }
}

/// What happened to one candidate.
enum Removal {
    /// Recheck showed the record no longer qualifies
    Spared,
    Attempted(DeleteOutcome),
}

fn record_outcome(
    report: &mut SweepReport,
    user: &UserRecord,
    now: DateTime<Utc>,
    outcome: Removal,
) {
    let age_minutes = policy::age_minutes(user, now);

    let outcome = match outcome {
        Removal::Spared => {
            tracing::info!(user_id = %user.id, "User completed profile since listing; kept");
            report.kept += 1;
            return;
        }
        Removal::Attempted(outcome) => outcome,
    };

    match outcome {
        DeleteOutcome::Deleted | DeleteOutcome::WouldDelete => {
            let missing = policy::missing_fields(user);
            tracing::info!(
                user_id = %user.id,
                name = user.display_name(),
                age_minutes,
                missing = ?missing,
                dry_run = report.dry_run,
                "Deleted incomplete user"
            );
            report.deleted += 1;
            report.deleted_records.push(DeletedRecord {
                display_name: user.display_name().to_string(),
                id: user.id.clone(),
                age_minutes,
                missing,
            });
        }
        DeleteOutcome::AlreadyGone => {
            tracing::debug!(user_id = %user.id, "User already deleted");
            report.already_gone += 1;
        }
        DeleteOutcome::Failed(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to delete incomplete user");
            report.failed += 1;
            report.failures.push(FailedDeletion {
                id: user.id.clone(),
                error: e.to_string(),
            });
        }
    }
}
