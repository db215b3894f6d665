//! In-process document store.
//!
//! Backs tests and local dry runs. Supports injecting delete failures and
//! stale listing snapshots so the sweep's failure isolation and the
//! list-then-delete race can be exercised without a real backend.

use crate::db::{DocumentStore, Page, PageRequest};
use crate::error::StoreError;
use crate::models::{MessageRecord, UserRecord};
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    users: DashMap<String, UserRecord>,
    messages: DashMap<String, MessageRecord>,
    /// What listings report for a user instead of its live state
    listing_snapshots: DashMap<String, UserRecord>,
    message_snapshots: DashMap<String, MessageRecord>,
    failing_deletes: DashSet<String>,
    fail_listing: AtomicBool,
    /// Undecodable documents reported on each user listing page
    malformed_users: AtomicUsize,
    delete_attempts: AtomicUsize,
    list_calls: AtomicUsize,
}

/// Thread-safe in-memory store; clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: UserRecord) {
        self.inner.users.insert(user.id.clone(), user);
    }

    pub fn insert_message(&self, message: MessageRecord) {
        self.inner.messages.insert(message.id.clone(), message);
    }

    pub fn contains_user(&self, id: &str) -> bool {
        self.inner.users.contains_key(id)
    }

    pub fn contains_message(&self, id: &str) -> bool {
        self.inner.messages.contains_key(id)
    }

    pub fn user_count(&self) -> usize {
        self.inner.users.len()
    }

    /// Make listings return `snapshot` for its id, whatever the live state is.
    ///
    /// A snapshot with no live counterpart models a record deleted by a
    /// concurrent run after the listing was taken.
    pub fn set_listing_snapshot(&self, snapshot: UserRecord) {
        self.inner
            .listing_snapshots
            .insert(snapshot.id.clone(), snapshot);
    }

    /// Message counterpart of [`MemoryStore::set_listing_snapshot`].
    pub fn set_message_listing_snapshot(&self, snapshot: MessageRecord) {
        self.inner
            .message_snapshots
            .insert(snapshot.id.clone(), snapshot);
    }

    /// Make every delete of `id` fail with a transport error.
    pub fn fail_deletes_for(&self, id: &str) {
        self.inner.failing_deletes.insert(id.to_string());
    }

    /// Make every listing call fail.
    pub fn set_fail_listing(&self, fail: bool) {
        self.inner.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Report `count` undecodable documents on every user listing page.
    pub fn set_malformed_users(&self, count: usize) {
        self.inner.malformed_users.store(count, Ordering::SeqCst);
    }

    /// Number of delete calls received, successful or not.
    pub fn delete_attempts(&self) -> usize {
        self.inner.delete_attempts.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.inner.list_calls.load(Ordering::SeqCst)
    }

    fn begin_listing(&self) -> Result<(), StoreError> {
        self.inner.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_listing.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("injected listing failure".to_string()));
        }
        Ok(())
    }

    fn begin_delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete_attempts.fetch_add(1, Ordering::SeqCst);
        if self.inner.failing_deletes.contains(id) {
            return Err(StoreError::Transport(format!(
                "injected delete failure for {}",
                id
            )));
        }
        Ok(())
    }
}

/// Slice a listing sorted by id; the cursor is the last id handed out.
fn paginate<T>(mut items: Vec<(String, T)>, page: &PageRequest) -> Page<T> {
    items.sort_by(|a, b| a.0.cmp(&b.0));

    let start = match &page.cursor {
        Some(cursor) => items.partition_point(|(id, _)| id.as_str() <= cursor.as_str()),
        None => 0,
    };
    let limit = page.limit as usize;
    let has_more = items.len() > start + limit;

    let page_items: Vec<(String, T)> = items.into_iter().skip(start).take(limit).collect();
    let next_cursor = if has_more {
        page_items.last().map(|(id, _)| id.clone())
    } else {
        None
    };

    Page::new(
        page_items.into_iter().map(|(_, item)| item).collect(),
        next_cursor,
    )
}

impl DocumentStore for MemoryStore {
    async fn list_users(&self, page: PageRequest) -> Result<Page<UserRecord>, StoreError> {
        self.begin_listing()?;

        let mut listed: Vec<(String, UserRecord)> = self
            .inner
            .users
            .iter()
            .filter(|entry| !self.inner.listing_snapshots.contains_key(entry.key()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        listed.extend(
            self.inner
                .listing_snapshots
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone())),
        );

        let mut page = paginate(listed, &page);
        page.skipped_malformed = self.inner.malformed_users.load(Ordering::SeqCst);
        Ok(page)
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.inner.users.get(id).map(|entry| entry.value().clone()))
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        self.begin_delete(id)?;
        self.inner.listing_snapshots.remove(id);
        match self.inner.users.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn list_typing_indicators(
        &self,
        page: PageRequest,
    ) -> Result<Page<MessageRecord>, StoreError> {
        self.begin_listing()?;

        let mut listed: Vec<(String, MessageRecord)> = self
            .inner
            .messages
            .iter()
            .filter(|entry| !self.inner.message_snapshots.contains_key(entry.key()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        listed.extend(
            self.inner
                .message_snapshots
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone())),
        );
        listed.retain(|(_, message)| message.is_typing_indicator());

        Ok(paginate(listed, &page))
    }

    async fn delete_message(&self, id: &str) -> Result<(), StoreError> {
        self.begin_delete(id)?;
        self.inner.message_snapshots.remove(id);
        match self.inner.messages.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }
}
