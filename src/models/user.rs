//! User record as stored in the `users` collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile fields written by the registration flow.
///
/// Only `public_photo` and `has_member_card` decide completeness; the rest
/// is carried for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Date of birth as entered (YYYY-MM-DD)
    #[serde(default)]
    pub date_of_birth: Option<String>,
    /// Public photo URL, storage file reference or inline data URI
    #[serde(default)]
    pub public_photo: Option<String>,
    #[serde(default)]
    pub has_member_card: Option<bool>,
}

impl UserProfile {
    /// A photo counts only when it is non-blank.
    pub fn has_public_photo(&self) -> bool {
        self.public_photo
            .as_deref()
            .is_some_and(|photo| !photo.trim().is_empty())
    }

    /// The member-card flag counts only when explicitly set to true.
    pub fn has_member_card(&self) -> bool {
        self.has_member_card == Some(true)
    }
}

/// A user document together with its store-assigned metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Opaque document ID assigned by the store
    pub id: String,
    /// Creation timestamp assigned by the store
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub profile: UserProfile,
}

impl UserRecord {
    /// Name used in reports; registrations often never get this far.
    pub fn display_name(&self) -> &str {
        self.profile
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("NO NAME")
    }
}
