// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, Utc};
use std::sync::Arc;
use ucera_maintenance::config::Config;
use ucera_maintenance::db::{MemoryStore, Store};
use ucera_maintenance::models::{MessageRecord, UserProfile, UserRecord};
use ucera_maintenance::routes::create_router;
use ucera_maintenance::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Build a user record created at `created_at`.
#[allow(dead_code)]
pub fn user(
    id: &str,
    photo: Option<&str>,
    card: Option<bool>,
    created_at: DateTime<Utc>,
) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        created_at,
        profile: UserProfile {
            full_name: Some(format!("User {}", id)),
            public_photo: photo.map(str::to_string),
            has_member_card: card,
            ..Default::default()
        },
    }
}

/// Build a message record of the given type.
#[allow(dead_code)]
pub fn message(id: &str, message_type: &str, created_at: DateTime<Utc>) -> MessageRecord {
    MessageRecord {
        id: id.to_string(),
        created_at,
        message_type: Some(message_type.to_string()),
        sender_id: Some("sender".to_string()),
        chat_id: Some("chat".to_string()),
    }
}

/// Create a test app backed by an in-memory store.
/// Returns the router, the shared state and a handle on the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryStore) {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (axum::Router, Arc<AppState>, MemoryStore) {
    let memory = MemoryStore::new();
    let state = Arc::new(AppState {
        config,
        store: Store::Memory(memory.clone()),
    });

    (create_router(state.clone()), state, memory)
}
