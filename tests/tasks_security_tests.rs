// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduler task endpoints: authentication and responses.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;
use ucera_maintenance::config::Config;

mod common;

fn task_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_sweep_without_token_forbidden() {
    let (app, _, store) = common::create_test_app();
    store.insert_user(common::user("u1", None, None, Utc::now() - Duration::hours(1)));

    let response = app
        .oneshot(task_request("/tasks/sweep-incomplete-users", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(store.contains_user("u1"));
}

#[tokio::test]
async fn test_sweep_with_wrong_token_forbidden() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(task_request("/tasks/sweep-typing-indicators", Some("nope")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], "forbidden");
}

#[tokio::test]
async fn test_unconfigured_token_refuses_everything() {
    let config = Config {
        scheduler_token: None,
        ..Config::test_default()
    };
    let (app, _, _) = common::create_test_app_with(config);

    let response = app
        .oneshot(task_request("/tasks/sweep-incomplete-users", Some("")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_sweep_with_token_returns_report() {
    let (app, state, store) = common::create_test_app();
    let now = Utc::now();
    store.insert_user(common::user("u1", None, Some(true), now - Duration::minutes(10)));
    store.insert_user(common::user("u2", Some("x"), Some(true), now - Duration::minutes(10)));
    store.insert_user(common::user("u3", None, Some(false), now - Duration::minutes(1)));
    let token = state.config.scheduler_token.clone().unwrap();

    let response = app
        .oneshot(task_request("/tasks/sweep-incomplete-users", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["scanned"], 3);
    assert_eq!(body["kept"], 2);
    assert_eq!(body["deleted"], 1);
    assert_eq!(body["failed"], 0);
    assert_eq!(body["deleted_records"][0]["id"], "u1");
    assert_eq!(body["deleted_records"][0]["missing"][0], "public_photo");
    assert!(!store.contains_user("u1"));
}

#[tokio::test]
async fn test_listing_failure_returns_bad_gateway() {
    let (app, state, store) = common::create_test_app();
    store.set_fail_listing(true);
    let token = state.config.scheduler_token.clone().unwrap();

    let response = app
        .oneshot(task_request("/tasks/sweep-incomplete-users", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["error"], "store_unavailable");
}

#[tokio::test]
async fn test_typing_sweep_with_token() {
    let (app, state, store) = common::create_test_app();
    store.insert_message(common::message("t1", "typing", Utc::now()));
    let token = state.config.scheduler_token.clone().unwrap();

    let response = app
        .oneshot(task_request("/tasks/sweep-typing-indicators", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["deleted"], 1);
    assert!(!store.contains_message("t1"));
}
