//! Chat message documents (only what the typing-indicator sweep needs).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `message_type` value used for ephemeral typing indicators.
pub const TYPING_MESSAGE_TYPE: &str = "typing";

/// A document in the `messages` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
}

impl MessageRecord {
    pub fn is_typing_indicator(&self) -> bool {
        self.message_type.as_deref() == Some(TYPING_MESSAGE_TYPE)
    }
}
