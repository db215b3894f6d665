// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typing-indicator sweep behavior against the in-memory store.

use chrono::{Duration, Utc};
use ucera_maintenance::config::{SweepConfig, TypingSweepConfig};
use ucera_maintenance::db::MemoryStore;
use ucera_maintenance::sweep::TypingIndicatorSweep;

mod common;
use common::message;

#[tokio::test]
async fn test_removes_all_typing_indicators_by_default() {
    let now = Utc::now();
    let store = MemoryStore::new();
    store.insert_message(message("t1", "typing", now));
    store.insert_message(message("t2", "typing", now - Duration::minutes(5)));
    store.insert_message(message("m1", "text", now - Duration::days(3)));

    let sweep = TypingIndicatorSweep::new(
        store.clone(),
        SweepConfig::default(),
        TypingSweepConfig::default(),
    );
    let report = sweep.sweep_at(now).await.unwrap();

    assert_eq!(report.scanned, 2);
    assert_eq!(report.deleted, 2);
    assert_eq!(report.failed, 0);
    assert!(!store.contains_message("t1"));
    assert!(!store.contains_message("t2"));
    assert!(store.contains_message("m1"));
}

#[tokio::test]
async fn test_fresh_indicators_survive_max_age() {
    let now = Utc::now();
    let store = MemoryStore::new();
    store.insert_message(message("fresh", "typing", now - Duration::seconds(5)));
    store.insert_message(message("stale", "typing", now - Duration::minutes(2)));

    let typing = TypingSweepConfig {
        max_age: std::time::Duration::from_secs(30),
        ..TypingSweepConfig::default()
    };
    let report = TypingIndicatorSweep::new(store.clone(), SweepConfig::default(), typing)
        .sweep_at(now)
        .await
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.skipped_fresh, 1);
    assert!(store.contains_message("fresh"));
    assert!(!store.contains_message("stale"));
}

#[tokio::test]
async fn test_failure_is_isolated() {
    let now = Utc::now();
    let store = MemoryStore::new();
    for i in 0..4 {
        store.insert_message(message(&format!("t{}", i), "typing", now));
    }
    store.fail_deletes_for("t1");

    let report = TypingIndicatorSweep::new(
        store.clone(),
        SweepConfig::default(),
        TypingSweepConfig::default(),
    )
    .sweep_at(now)
    .await
    .unwrap();

    assert_eq!(report.deleted, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].id, "t1");
    assert_eq!(
        report.scanned,
        report.deleted + report.skipped_fresh + report.already_gone + report.failed
    );
}

#[tokio::test]
async fn test_dry_run_keeps_indicators() {
    let now = Utc::now();
    let store = MemoryStore::new();
    store.insert_message(message("t1", "typing", now));

    let config = SweepConfig {
        dry_run: true,
        ..SweepConfig::default()
    };
    let report = TypingIndicatorSweep::new(store.clone(), config, TypingSweepConfig::default())
        .sweep_at(now)
        .await
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert!(store.contains_message("t1"));
}

#[tokio::test]
async fn test_vanished_indicator_is_already_gone_not_fresh() {
    let now = Utc::now();
    let store = MemoryStore::new();
    store.insert_message(message("t1", "typing", now - Duration::minutes(5)));
    // Listed, but removed by the client before the sweep got to it.
    store.set_message_listing_snapshot(message("t2", "typing", now - Duration::minutes(5)));

    let report = TypingIndicatorSweep::new(
        store.clone(),
        SweepConfig::default(),
        TypingSweepConfig::default(),
    )
    .sweep_at(now)
    .await
    .unwrap();

    assert_eq!(report.scanned, 2);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.already_gone, 1);
    assert_eq!(report.skipped_fresh, 0);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let store = MemoryStore::new();
    store.set_fail_listing(true);

    let result = TypingIndicatorSweep::new(
        store,
        SweepConfig::default(),
        TypingSweepConfig::default(),
    )
    .sweep()
    .await;

    assert!(result.is_err());
}
