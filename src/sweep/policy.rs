//! Retention policy for user records.
//!
//! Pure functions only: no store access, no clock reads.

use crate::models::UserRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Whether a registration was ever finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    Complete,
    Incomplete,
}

/// A profile field whose absence makes a record incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum MissingField {
    PublicPhoto,
    MemberCard,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::PublicPhoto => f.write_str("public_photo"),
            MissingField::MemberCard => f.write_str("member_card"),
        }
    }
}

/// Required fields the record lacks, in a fixed order.
pub fn missing_fields(record: &UserRecord) -> Vec<MissingField> {
    let mut missing = Vec::with_capacity(2);
    if !record.profile.has_public_photo() {
        missing.push(MissingField::PublicPhoto);
    }
    if !record.profile.has_member_card() {
        missing.push(MissingField::MemberCard);
    }
    missing
}

/// Incomplete when the public photo or the member-card flag is missing.
/// Name and date of birth are not consulted.
pub fn classify(record: &UserRecord) -> Completeness {
    if record.profile.has_public_photo() && record.profile.has_member_card() {
        Completeness::Complete
    } else {
        Completeness::Incomplete
    }
}

/// Time since the store created the record. Future timestamps count as zero.
pub fn age(record: &UserRecord, now: DateTime<Utc>) -> Duration {
    elapsed_since(record.created_at, now)
}

pub(crate) fn elapsed_since(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - created_at).to_std().unwrap_or(Duration::ZERO)
}

/// Age in fractional minutes, as shown in reports.
pub fn age_minutes(record: &UserRecord, now: DateTime<Utc>) -> f64 {
    age(record, now).as_secs_f64() / 60.0
}

/// The single selection rule: incomplete and at least `grace_period` old.
pub fn is_delete_candidate(
    record: &UserRecord,
    now: DateTime<Utc>,
    grace_period: Duration,
) -> bool {
    classify(record) == Completeness::Incomplete && age(record, now) >= grace_period
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;
    use chrono::Duration as TimeDelta;

    const GRACE: Duration = Duration::from_secs(180);

    fn record(photo: Option<&str>, card: Option<bool>, created_at: DateTime<Utc>) -> UserRecord {
        UserRecord {
            id: "u".to_string(),
            created_at,
            profile: UserProfile {
                public_photo: photo.map(str::to_string),
                has_member_card: card,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_complete_requires_photo_and_card() {
        let now = Utc::now();
        assert_eq!(classify(&record(Some("x"), Some(true), now)), Completeness::Complete);
        assert_eq!(classify(&record(None, Some(true), now)), Completeness::Incomplete);
        assert_eq!(classify(&record(Some("x"), Some(false), now)), Completeness::Incomplete);
        assert_eq!(classify(&record(Some("x"), None, now)), Completeness::Incomplete);
        assert_eq!(classify(&record(Some(""), Some(true), now)), Completeness::Incomplete);
        assert_eq!(classify(&record(None, None, now)), Completeness::Incomplete);
    }

    #[test]
    fn test_name_and_dob_do_not_matter() {
        let now = Utc::now();
        let mut complete = record(Some("x"), Some(true), now);
        complete.profile.full_name = None;
        complete.profile.date_of_birth = None;
        assert_eq!(classify(&complete), Completeness::Complete);

        let mut incomplete = record(None, Some(true), now);
        incomplete.profile.full_name = Some("Has Name".to_string());
        incomplete.profile.date_of_birth = Some("2000-01-01".to_string());
        assert_eq!(classify(&incomplete), Completeness::Incomplete);
    }

    #[test]
    fn test_missing_fields_lists_both() {
        let now = Utc::now();
        assert_eq!(
            missing_fields(&record(None, Some(false), now)),
            vec![MissingField::PublicPhoto, MissingField::MemberCard]
        );
        assert_eq!(
            missing_fields(&record(Some("x"), None, now)),
            vec![MissingField::MemberCard]
        );
        assert!(missing_fields(&record(Some("x"), Some(true), now)).is_empty());
    }

    #[test]
    fn test_age_is_monotonic_and_clamped() {
        let created = Utc::now();
        let r = record(None, None, created);

        let mut previous = Duration::ZERO;
        for minutes in [-5i64, 0, 1, 3, 10, 600] {
            let current = age(&r, created + TimeDelta::minutes(minutes));
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(age(&r, created - TimeDelta::minutes(5)), Duration::ZERO);
        assert!((age_minutes(&r, created + TimeDelta::seconds(90)) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_grace_period_boundary_is_inclusive() {
        let now = Utc::now();
        let exactly = record(None, Some(true), now - TimeDelta::minutes(3));
        let just_under = record(None, Some(true), now - TimeDelta::seconds(179));

        assert!(is_delete_candidate(&exactly, now, GRACE));
        assert!(!is_delete_candidate(&just_under, now, GRACE));
    }

    #[test]
    fn test_complete_records_never_selected() {
        let now = Utc::now();
        let ancient = record(Some("x"), Some(true), now - TimeDelta::days(365));
        assert!(!is_delete_candidate(&ancient, now, GRACE));
    }
}
