//! Typing-indicator sweep.
//!
//! Chat clients write `message_type = "typing"` documents into the messages
//! collection and do not always clean them up. Leftovers clutter message
//! history, so this pass removes indicators older than `max_age`.

use crate::config::{SweepConfig, TypingSweepConfig};
use crate::db::DocumentStore;
use crate::error::SweepError;
use crate::models::MessageRecord;
use crate::sweep::policy::elapsed_since;
use crate::sweep::{collect_pages, delete_one, DeleteOutcome, FailedDeletion};
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Outcome of one typing-indicator sweep.
///
/// `scanned == deleted + skipped_fresh + already_gone + failed`. Documents
/// that could not be decoded are not scanned; they are counted in
/// `skipped_malformed` and never deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TypingSweepReport {
    pub swept_at: DateTime<Utc>,
    pub dry_run: bool,
    pub scanned: usize,
    pub deleted: usize,
    /// Indicators younger than `max_age`
    pub skipped_fresh: usize,
    pub already_gone: usize,
    pub failed: usize,
    pub pages_fetched: u32,
    pub truncated: bool,
    pub skipped_malformed: usize,
    pub failures: Vec<FailedDeletion>,
}

/// Sweep over typing indicators in the messages collection.
pub struct TypingIndicatorSweep<S> {
    store: S,
    sweep: SweepConfig,
    typing: TypingSweepConfig,
}

impl<S: DocumentStore> TypingIndicatorSweep<S> {
    /// Shares concurrency, timeout, page limit and dry-run settings with the
    /// user sweep.
    pub fn new(store: S, sweep: SweepConfig, typing: TypingSweepConfig) -> Self {
        Self {
            store,
            sweep,
            typing,
        }
    }

    pub async fn sweep(&self) -> Result<TypingSweepReport, SweepError> {
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<TypingSweepReport, SweepError> {
        tracing::info!(
            max_age_secs = self.typing.max_age.as_secs(),
            dry_run = self.sweep.dry_run,
            "Starting typing indicator sweep"
        );

        let store = &self.store;
        let listing = collect_pages(
            "messages",
            self.typing.page_size,
            self.sweep.max_pages,
            self.sweep.request_timeout,
            |request| store.list_typing_indicators(request),
        )
        .await?;

        let mut report = TypingSweepReport {
            swept_at: now,
            dry_run: self.sweep.dry_run,
            scanned: listing.items.len(),
            pages_fetched: listing.pages_fetched,
            truncated: listing.truncated,
            skipped_malformed: listing.skipped_malformed,
            ..Default::default()
        };

        // The store filter is trusted, but a non-typing message must never be
        // deleted here.
        let (stale, fresh): (Vec<MessageRecord>, Vec<MessageRecord>) =
            listing.items.into_iter().partition(|message| {
                message.is_typing_indicator()
                    && elapsed_since(message.created_at, now) >= self.typing.max_age
            });
        report.skipped_fresh = fresh.len();

        let outcomes: Vec<(MessageRecord, DeleteOutcome)> = stream::iter(stale)
            .map(|message| async move {
                let outcome = delete_one(
                    self.sweep.dry_run,
                    self.sweep.request_timeout,
                    self.store.delete_message(&message.id),
                )
                .await;
                (message, outcome)
            })
            .buffered(self.sweep.delete_concurrency.max(1))
            .collect()
            .await;

        for (message, outcome) in outcomes {
            match outcome {
                DeleteOutcome::Deleted | DeleteOutcome::WouldDelete => report.deleted += 1,
                DeleteOutcome::AlreadyGone => report.already_gone += 1,
                DeleteOutcome::Failed(e) => {
                    tracing::warn!(
                        message_id = %message.id,
                        error = %e,
                        "Failed to delete typing indicator"
                    );
                    report.failed += 1;
                    report.failures.push(FailedDeletion {
                        id: message.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            scanned = report.scanned,
            deleted = report.deleted,
            skipped_fresh = report.skipped_fresh,
            already_gone = report.already_gone,
            failed = report.failed,
            skipped_malformed = report.skipped_malformed,
            dry_run = report.dry_run,
            "Typing indicator sweep complete"
        );

        Ok(report)
    }
}
