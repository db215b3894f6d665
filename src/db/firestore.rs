// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore backend for the users and messages collections.
//!
//! Document IDs and create times come from Firestore metadata
//! (`_firestore_id` / `_firestore_created`), never from stored fields.
//! Listing cursors are plain offsets.

use crate::config::CollectionIds;
use crate::db::{DocumentStore, Page, PageRequest};
use crate::error::StoreError;
use crate::models::message::TYPING_MESSAGE_TYPE;
use crate::models::{MessageRecord, UserProfile, UserRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored shape of a user document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserDocument {
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    id: Option<String>,
    #[serde(alias = "_firestore_created", default, skip_serializing)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    date_of_birth: Option<String>,
    #[serde(default)]
    public_photo: Option<String>,
    #[serde(default)]
    has_member_card: Option<bool>,
}

impl UserDocument {
    fn from_profile(profile: &UserProfile) -> Self {
        Self {
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
            phone_number: profile.phone_number.clone(),
            date_of_birth: profile.date_of_birth.clone(),
            public_photo: profile.public_photo.clone(),
            has_member_card: profile.has_member_card,
            ..Default::default()
        }
    }

    fn into_record(self) -> Option<UserRecord> {
        Some(UserRecord {
            id: self.id?,
            created_at: self.created_at?,
            profile: UserProfile {
                full_name: self.full_name,
                email: self.email,
                phone_number: self.phone_number,
                date_of_birth: self.date_of_birth,
                public_photo: self.public_photo,
                has_member_card: self.has_member_card,
            },
        })
    }
}

/// Stored shape of a message document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MessageDocument {
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    id: Option<String>,
    #[serde(alias = "_firestore_created", default, skip_serializing)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    message_type: Option<String>,
    #[serde(default)]
    sender_id: Option<String>,
    #[serde(default)]
    chat_id: Option<String>,
}

impl MessageDocument {
    fn into_record(self) -> Option<MessageRecord> {
        Some(MessageRecord {
            id: self.id?,
            created_at: self.created_at?,
            message_type: self.message_type,
            sender_id: self.sender_id,
            chat_id: self.chat_id,
        })
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    collections: CollectionIds,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str, collections: &CollectionIds) -> Result<Self, StoreError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id, collections).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            StoreError::Transport(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            collections: collections.clone(),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(
        project_id: &str,
        collections: &CollectionIds,
    ) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Transport(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            collections: collections.clone(),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            collections: CollectionIds::default(),
        }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client.as_ref().ok_or(StoreError::Offline)
    }

    // ─── Seeding (tests and tooling) ─────────────────────────────

    /// Create or overwrite a user document.
    pub async fn upsert_user(&self, id: &str, profile: &UserProfile) -> Result<(), StoreError> {
        let doc = UserDocument::from_profile(profile);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(&self.collections.users)
            .document_id(id)
            .object(&doc)
            .execute()
            .await
            .map_err(map_firestore_error)?;
        Ok(())
    }

    /// Create or overwrite a message document.
    pub async fn upsert_message(
        &self,
        id: &str,
        message_type: &str,
        chat_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let doc = MessageDocument {
            message_type: Some(message_type.to_string()),
            chat_id: chat_id.map(str::to_string),
            ..Default::default()
        };
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(&self.collections.messages)
            .document_id(id)
            .object(&doc)
            .execute()
            .await
            .map_err(map_firestore_error)?;
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        // Without the precondition Firestore reports success for missing
        // documents; with it the server answers NOT_FOUND.
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .precondition(firestore::FirestoreWritePrecondition::Exists(true))
            .execute()
            .await
            .map_err(map_firestore_error)?;
        Ok(())
    }
}

impl DocumentStore for FirestoreDb {
    async fn list_users(&self, page: PageRequest) -> Result<Page<UserRecord>, StoreError> {
        let offset = parse_offset(page.cursor.as_deref())?;

        let docs: Vec<UserDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(self.collections.users.as_str())
            .limit(page.limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(map_firestore_error)?;

        let next_cursor = next_offset(docs.len(), page.limit, offset);
        let returned = docs.len();
        let items: Vec<UserRecord> = docs
            .into_iter()
            .filter_map(UserDocument::into_record)
            .collect();
        Ok(Page {
            skipped_malformed: returned - items.len(),
            items,
            next_cursor,
        })
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let doc: Option<UserDocument> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(self.collections.users.as_str())
            .obj()
            .one(id)
            .await
            .map_err(map_firestore_error)?;
        Ok(doc.and_then(UserDocument::into_record))
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        self.delete_document(&self.collections.users, id).await
    }

    async fn list_typing_indicators(
        &self,
        page: PageRequest,
    ) -> Result<Page<MessageRecord>, StoreError> {
        let offset = parse_offset(page.cursor.as_deref())?;

        let docs: Vec<MessageDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(self.collections.messages.as_str())
            .filter(|q| q.for_all([q.field("message_type").eq(TYPING_MESSAGE_TYPE)]))
            .limit(page.limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(map_firestore_error)?;

        let next_cursor = next_offset(docs.len(), page.limit, offset);
        let returned = docs.len();
        let items: Vec<MessageRecord> = docs
            .into_iter()
            .filter_map(MessageDocument::into_record)
            .collect();
        Ok(Page {
            skipped_malformed: returned - items.len(),
            items,
            next_cursor,
        })
    }

    async fn delete_message(&self, id: &str) -> Result<(), StoreError> {
        self.delete_document(&self.collections.messages, id).await
    }
}

fn map_firestore_error(err: firestore::errors::FirestoreError) -> StoreError {
    match err {
        err @ firestore::errors::FirestoreError::DataNotFoundError(_) => {
            StoreError::NotFound(err.to_string())
        }
        other => StoreError::Transport(other.to_string()),
    }
}

fn parse_offset(cursor: Option<&str>) -> Result<u32, StoreError> {
    match cursor {
        Some(raw) => raw
            .parse()
            .map_err(|_| StoreError::Decode(format!("invalid Firestore cursor: {}", raw))),
        None => Ok(0),
    }
}

fn next_offset(returned: usize, limit: u32, offset: u32) -> Option<String> {
    if returned < limit as usize {
        None
    } else {
        Some(offset.saturating_add(limit).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_cursor() {
        assert_eq!(parse_offset(None).unwrap(), 0);
        assert_eq!(parse_offset(Some("200")).unwrap(), 200);
        assert!(parse_offset(Some("abc")).is_err());

        assert_eq!(next_offset(100, 100, 0).as_deref(), Some("100"));
        assert_eq!(next_offset(99, 100, 0), None);
    }

    #[tokio::test]
    async fn test_mock_client_is_offline() {
        let db = FirestoreDb::new_mock();
        let err = db.list_users(PageRequest::first(10)).await.unwrap_err();
        assert!(matches!(err, StoreError::Offline));
    }

    #[test]
    fn test_document_without_metadata_is_dropped() {
        let doc = UserDocument {
            full_name: Some("No Id".to_string()),
            ..Default::default()
        };
        assert!(doc.into_record().is_none());
    }
}
