// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Appwrite Databases REST client.
//!
//! Handles:
//! - Cursor-paginated document listing (`orderAsc($id)` + `limit` +
//!   `cursorAfter` queries)
//! - Single document fetch and delete
//! - Mapping HTTP failures onto [`StoreError`] (404 stays distinguishable)

use crate::config::{AppwriteConfig, CollectionIds};
use crate::db::{DocumentStore, Page, PageRequest};
use crate::error::StoreError;
use crate::models::message::TYPING_MESSAGE_TYPE;
use crate::models::{MessageRecord, UserRecord};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Appwrite REST client for one database.
#[derive(Clone)]
pub struct AppwriteDb {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
    collections: CollectionIds,
    timeout: Duration,
}

/// `GET .../documents` response body.
#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<Map<String, Value>>,
}

/// Appwrite error body, e.g. `{"message": "...", "code": 404, "type": "document_not_found"}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl AppwriteDb {
    /// Create a client; `timeout` bounds every request.
    pub fn new(
        config: &AppwriteConfig,
        collections: &CollectionIds,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            endpoint = %config.endpoint,
            project = %config.project_id,
            database = %collections.database_id,
            "Appwrite client initialized"
        );

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            collections: collections.clone(),
            timeout,
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint,
            urlencoding::encode(&self.collections.database_id),
            urlencoding::encode(collection)
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.documents_url(collection),
            urlencoding::encode(id)
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", &self.api_key)
    }

    fn transport_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else {
            StoreError::Transport(err.to_string())
        }
    }

    /// List one page of a collection, with extra filter queries.
    async fn list_documents<T: DeserializeOwned>(
        &self,
        collection: &str,
        page: &PageRequest,
        filters: Vec<Value>,
    ) -> Result<Page<T>, StoreError> {
        let queries = build_queries(page, filters);
        let params: Vec<(&str, String)> = queries.into_iter().map(|q| ("queries[]", q)).collect();

        let response = self
            .request(reqwest::Method::GET, &self.documents_url(collection))
            .query(&params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let list: DocumentList = check_response_json(response).await?;
        let next_cursor = next_cursor(&list.documents, page.limit);
        // Malformed documents are skipped, never deleted.
        let returned = list.documents.len();
        let items: Vec<T> = list
            .documents
            .into_iter()
            .filter_map(|doc| match decode_document(doc) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(collection, error = %e, "Skipping undecodable document");
                    None
                }
            })
            .collect();

        Ok(Page {
            skipped_malformed: returned - items.len(),
            items,
            next_cursor,
        })
    }

    async fn get_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &self.document_url(collection, id))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        match check_response_json::<Map<String, Value>>(response).await {
            Ok(doc) => decode_document(doc).map(Some),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::DELETE, &self.document_url(collection, id))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        check_response(response).await
    }
}

impl DocumentStore for AppwriteDb {
    async fn list_users(&self, page: PageRequest) -> Result<Page<UserRecord>, StoreError> {
        self.list_documents(&self.collections.users, &page, Vec::new())
            .await
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        self.get_document(&self.collections.users, id).await
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        self.delete_document(&self.collections.users, id).await
    }

    async fn list_typing_indicators(
        &self,
        page: PageRequest,
    ) -> Result<Page<MessageRecord>, StoreError> {
        let typing = json!({
            "method": "equal",
            "attribute": "message_type",
            "values": [TYPING_MESSAGE_TYPE],
        });
        self.list_documents(&self.collections.messages, &page, vec![typing])
            .await
    }

    async fn delete_message(&self, id: &str) -> Result<(), StoreError> {
        self.delete_document(&self.collections.messages, id).await
    }
}

/// Build the JSON query strings for one page request.
fn build_queries(page: &PageRequest, filters: Vec<Value>) -> Vec<String> {
    let mut queries = filters;
    queries.push(json!({ "method": "orderAsc", "attribute": "$id" }));
    queries.push(json!({ "method": "limit", "values": [page.limit] }));
    if let Some(cursor) = &page.cursor {
        queries.push(json!({ "method": "cursorAfter", "values": [cursor] }));
    }
    queries.into_iter().map(|q| q.to_string()).collect()
}

/// A full page means there may be more; the last id on it becomes the cursor.
fn next_cursor(documents: &[Map<String, Value>], limit: u32) -> Option<String> {
    if documents.len() < limit as usize {
        return None;
    }
    documents
        .iter()
        .rev()
        .find_map(|doc| doc.get("$id").and_then(Value::as_str))
        .map(str::to_string)
}

/// Rename Appwrite's `$id` / `$createdAt` metadata and decode the record.
fn decode_document<T: DeserializeOwned>(mut doc: Map<String, Value>) -> Result<T, StoreError> {
    let id = doc
        .remove("$id")
        .ok_or_else(|| StoreError::Decode("document without $id".to_string()))?;
    let created_at = doc
        .remove("$createdAt")
        .ok_or_else(|| StoreError::Decode(format!("document {} without $createdAt", id)))?;
    doc.insert("id".to_string(), id);
    doc.insert("created_at".to_string(), created_at);

    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Map a non-success response onto a [`StoreError`].
async fn error_from_response(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let (message, kind) = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => (parsed.message, parsed.kind),
        Err(_) => (body, None),
    };

    match status {
        404 => StoreError::NotFound(kind.unwrap_or(message)),
        401 | 403 => StoreError::Unauthorized(message),
        _ => StoreError::Api { status, message },
    }
}

async fn check_response(response: reqwest::Response) -> Result<(), StoreError> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(error_from_response(response).await)
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StoreError> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }

    response
        .json()
        .await
        .map_err(|e| StoreError::Decode(format!("JSON parse error: {}", e)))
}
