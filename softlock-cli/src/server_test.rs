use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

use softlock_core::client::SoftLockClient;

use crate::server::{create_client, router, AppState};

fn state() -> AppState {
    Arc::new(Mutex::new(SoftLockClient::new()))
}

async fn call(state: &AppState, method: &str, uri: &str, body: Option<Value>, forwarded_for: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(addr) = forwarded_for {
        builder = builder.header("x-forwarded-for", addr);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn lock_request(holder_id: &str) -> Value {
    json!({ "holder_id": holder_id, "resource_type": "article", "resource_id": "4" })
}

#[tokio::test]
async fn acquire_renew_and_conflict_over_http() {
    let state = state();

    let (status, body) = call(&state, "POST", "/locks", Some(lock_request("1")), Some("203.0.113.7")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["renewed"], json!(false));
    assert_eq!(body["data"]["holder_address"], json!("203.0.113.7"));
    assert_eq!(body["data"]["resource"], json!("article:4"));

    let (status, body) = call(&state, "POST", "/locks", Some(lock_request("1")), Some("203.0.113.7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["renewed"], json!(true));

    let (status, body) = call(&state, "POST", "/locks", Some(lock_request("2")), Some("198.51.100.1")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflict"]["holder_id"], json!("1"));
    assert_eq!(body["conflict"]["holder_address"], json!("203.0.113.7"));
    assert_eq!(
        body["conflict"]["message"],
        json!("article:4 is being edited by 1 from 203.0.113.7")
    );
}

#[tokio::test]
async fn explicit_holder_address_wins_over_connection() {
    let state = state();
    let mut request = lock_request("1");
    request["holder_address"] = json!("10.1.1.1");

    let (status, body) = call(&state, "POST", "/locks", Some(request), Some("203.0.113.7")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["holder_address"], json!("10.1.1.1"));
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let state = state();
    let (status, body) = call(
        &state,
        "POST",
        "/locks",
        Some(json!({ "holder_id": "", "resource_type": "article", "resource_id": "4" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("holder_id is required"));

    let (status, _) = call(&state, "PUT", "/config", Some(json!({ "lease_duration_minutes": 0 })), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lookup_release_and_navigation() {
    let state = state();

    let (status, _) = call(&state, "GET", "/locks/article/4", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    call(&state, "POST", "/locks", Some(lock_request("1")), Some("203.0.113.7")).await;
    let (status, body) = call(&state, "GET", "/locks/article/4", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["holder_id"], json!("1"));

    // static asset: leases stay
    let (_, body) = call(
        &state,
        "POST",
        "/navigate",
        Some(json!({ "holder_id": "1", "path": "/static/app.js" })),
        Some("203.0.113.7"),
    )
    .await;
    assert_eq!(body["data"]["released"], json!(0));

    // left the edit view
    let (status, body) = call(
        &state,
        "POST",
        "/navigate",
        Some(json!({ "holder_id": "1", "path": "/admin/gna/article/" })),
        Some("203.0.113.7"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["verdict"], json!("RELEASE"));
    assert_eq!(body["data"]["released"], json!(1));

    let (_, body) = call(
        &state,
        "POST",
        "/release",
        Some(json!({ "holder_id": "1" })),
        Some("203.0.113.7"),
    )
    .await;
    assert_eq!(body["data"]["released"], json!(0));
}

#[tokio::test]
async fn health_and_config() {
    let state = state();

    let (status, body) = call(&state, "PUT", "/config", Some(json!({ "lease_duration_minutes": 15 })), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lease_duration_minutes"], json!(15));

    let (status, body) = call(&state, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lease_duration_minutes"], json!(15));
    assert_eq!(body["data"]["stored_leases"], json!(0));

    let (status, body) = call(&state, "POST", "/sweep", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["swept"], json!(0));
}

#[test]
fn storage_spec_selection() {
    assert!(create_client("memory", 5).is_ok());
    assert!(create_client("redis://nope", 5).is_err());
    assert!(create_client("memory", 0).is_err());
}
