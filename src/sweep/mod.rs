// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Record-hygiene sweeps.
//!
//! Each sweep is a single stateless pass: list, classify, delete. Listing
//! failures abort the pass; individual delete failures are recorded and the
//! pass carries on.

pub mod incomplete_users;
pub mod policy;
pub mod typing_indicators;

pub use incomplete_users::{DeletedRecord, IncompleteUserSweep, SweepReport};
pub use policy::{classify, is_delete_candidate, missing_fields, Completeness, MissingField};
pub use typing_indicators::{TypingIndicatorSweep, TypingSweepReport};

use crate::db::{Page, PageRequest};
use crate::error::{StoreError, SweepError};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A delete that failed for a reason other than the document being gone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FailedDeletion {
    pub id: String,
    pub error: String,
}

/// Result of trying to remove one document.
#[derive(Debug)]
pub(crate) enum DeleteOutcome {
    Deleted,
    /// Dry run: would have been deleted
    WouldDelete,
    /// Store reported NotFound (or a recheck found nothing)
    AlreadyGone,
    Failed(StoreError),
}

/// Issue one delete, or skip it in a dry run.
pub(crate) async fn delete_one<F>(dry_run: bool, timeout: Duration, call: F) -> DeleteOutcome
where
    F: Future<Output = Result<(), StoreError>>,
{
    if dry_run {
        return DeleteOutcome::WouldDelete;
    }
    match with_timeout(timeout, call).await {
        Ok(()) => DeleteOutcome::Deleted,
        Err(e) if e.is_not_found() => DeleteOutcome::AlreadyGone,
        Err(e) => DeleteOutcome::Failed(e),
    }
}

/// Everything a listing pass returned.
pub(crate) struct Listing<T> {
    pub items: Vec<T>,
    pub pages_fetched: u32,
    /// More pages existed beyond `max_pages`
    pub truncated: bool,
    /// Undecodable documents the store left out
    pub skipped_malformed: usize,
}

/// Run one store call under `timeout`.
pub(crate) async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}

/// Fetch pages until the store runs out or `max_pages` is reached.
pub(crate) async fn collect_pages<T, F, Fut>(
    collection: &'static str,
    page_size: u32,
    max_pages: u32,
    timeout: Duration,
    mut fetch: F,
) -> Result<Listing<T>, SweepError>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>, StoreError>>,
{
    let mut items = Vec::new();
    let mut request = PageRequest::first(page_size);
    let mut pages_fetched = 0;
    let mut skipped_malformed = 0;

    loop {
        let page = with_timeout(timeout, fetch(request.clone()))
            .await
            .map_err(|source| SweepError::Listing { collection, source })?;
        pages_fetched += 1;
        skipped_malformed += page.skipped_malformed;
        items.extend(page.items);

        match page.next_cursor {
            None => {
                return Ok(Listing {
                    items,
                    pages_fetched,
                    truncated: false,
                    skipped_malformed,
                })
            }
            Some(_) if pages_fetched >= max_pages => {
                tracing::warn!(
                    collection,
                    pages_fetched,
                    max_pages,
                    "Listing stopped at page limit; remaining records wait for the next run"
                );
                return Ok(Listing {
                    items,
                    pages_fetched,
                    truncated: true,
                    skipped_malformed,
                });
            }
            Some(cursor) => request.cursor = Some(cursor),
        }
    }
}
