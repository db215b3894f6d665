// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: the document store seam and its backends.

pub mod appwrite;
pub mod firestore;
pub mod memory;

pub use self::appwrite::AppwriteDb;
pub use self::firestore::FirestoreDb;
pub use self::memory::MemoryStore;

use crate::config::{Config, StoreBackend};
use crate::error::StoreError;
use crate::models::{MessageRecord, UserRecord};
use std::future::Future;

/// One listing request. The cursor is whatever the previous page handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub cursor: Option<String>,
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        Self {
            limit,
            cursor: None,
        }
    }
}

/// One page of listing results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Opaque cursor for the next page; `None` once the listing is exhausted.
    pub next_cursor: Option<String>,
    /// Documents on this page that could not be decoded and were left out
    pub skipped_malformed: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self {
            items,
            next_cursor,
            skipped_malformed: 0,
        }
    }
}

/// Operations the sweeps need from a document store.
///
/// Deleting a document that does not exist must fail with
/// [`StoreError::NotFound`], so callers can tell their own deletes apart from
/// ones another actor already made.
pub trait DocumentStore: Send + Sync {
    fn list_users(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<UserRecord>, StoreError>> + Send;

    fn get_user(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    fn delete_user(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// List only messages whose `message_type` is `typing`.
    fn list_typing_indicators(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<MessageRecord>, StoreError>> + Send;

    fn delete_message(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Backend chosen at startup from [`Config::store_backend`].
#[derive(Clone)]
pub enum Store {
    Appwrite(AppwriteDb),
    Firestore(FirestoreDb),
    Memory(MemoryStore),
}

impl Store {
    /// Connect to the configured backend.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        match config.store_backend {
            StoreBackend::Appwrite => {
                let appwrite = config.appwrite.as_ref().ok_or_else(|| {
                    StoreError::Unauthorized("Appwrite credentials not configured".to_string())
                })?;
                Ok(Store::Appwrite(AppwriteDb::new(
                    appwrite,
                    &config.collections,
                    config.sweep.request_timeout,
                )?))
            }
            StoreBackend::Firestore => Ok(Store::Firestore(
                FirestoreDb::new(&config.gcp_project_id, &config.collections).await?,
            )),
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; nothing will be persisted");
                Ok(Store::Memory(MemoryStore::new()))
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Appwrite(_) => "appwrite",
            Store::Firestore(_) => "firestore",
            Store::Memory(_) => "memory",
        }
    }
}

impl DocumentStore for Store {
    async fn list_users(&self, page: PageRequest) -> Result<Page<UserRecord>, StoreError> {
        match self {
            Store::Appwrite(db) => db.list_users(page).await,
            Store::Firestore(db) => db.list_users(page).await,
            Store::Memory(db) => db.list_users(page).await,
        }
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        match self {
            Store::Appwrite(db) => db.get_user(id).await,
            Store::Firestore(db) => db.get_user(id).await,
            Store::Memory(db) => db.get_user(id).await,
        }
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        match self {
            Store::Appwrite(db) => db.delete_user(id).await,
            Store::Firestore(db) => db.delete_user(id).await,
            Store::Memory(db) => db.delete_user(id).await,
        }
    }

    async fn list_typing_indicators(
        &self,
        page: PageRequest,
    ) -> Result<Page<MessageRecord>, StoreError> {
        match self {
            Store::Appwrite(db) => db.list_typing_indicators(page).await,
            Store::Firestore(db) => db.list_typing_indicators(page).await,
            Store::Memory(db) => db.list_typing_indicators(page).await,
        }
    }

    async fn delete_message(&self, id: &str) -> Result<(), StoreError> {
        match self {
            Store::Appwrite(db) => db.delete_message(id).await,
            Store::Firestore(db) => db.delete_message(id).await,
            Store::Memory(db) => db.delete_message(id).await,
        }
    }
}
