//! Router-level tests: requests go through the full middleware stack via
//! `tower::ServiceExt::oneshot`, over an in-memory store and a manual clock.

#![allow(clippy::panic)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use pet_kingdom_board::api::build_app;
use pet_kingdom_board::app_state::AppState;
use pet_kingdom_board::config::AppConfig;
use pet_kingdom_board::domain::{Clock, ManualClock};
use pet_kingdom_board::storage::{KeyValueStore, MemoryStore};

struct TestApp {
    router: Router,
    state: AppState,
    clock: Arc<ManualClock>,
}

fn test_app_with(config: &AppConfig) -> TestApp {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let state = AppState::new(store, Arc::clone(&clock) as Arc<dyn Clock>, config);
    TestApp {
        router: build_app(state.clone(), config),
        state,
        clock,
    }
}

fn test_app() -> TestApp {
    test_app_with(&AppConfig::default())
}

async fn send_raw(
    app: &TestApp,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    };
    let Ok(request) = request else {
        panic!("request should build");
    };
    let Ok(response) = app.router.clone().oneshot(request).await else {
        panic!("router is infallible");
    };
    let status = response.status();
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body read failed");
    };
    (status, bytes.to_vec())
}

async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, method, uri, body).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn alpha() -> Value {
    json!({
        "kingdomName": "Alpha",
        "kingdomType": "casual",
        "faction": "stormforce",
        "discordRequired": true,
        "timeZone": "UTC",
        "otherInfo": ""
    })
}

fn drake(total_minutes: Value) -> Value {
    json!({
        "petName": "Drake",
        "playerName": "Amy",
        "timeZone": "UTC",
        "totalMinutes": total_minutes
    })
}

#[tokio::test]
async fn alpha_kingdom_is_listed_once() {
    let app = test_app();
    let (status, _) = send(&app, "POST", "/add-kingdom", Some(alpha())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/list-kingdoms", None).await;
    assert_eq!(status, StatusCode::OK);
    let Some(kingdoms) = body.as_array() else {
        panic!("expected array, got {body}");
    };
    let alphas: Vec<&Value> = kingdoms
        .iter()
        .filter(|k| k.get("kingdomName") == Some(&json!("Alpha")))
        .collect();
    assert_eq!(alphas.len(), 1);
    assert_eq!(alphas.first().and_then(|k| k.get("discordRequired")), Some(&json!(true)));
}

#[tokio::test]
async fn each_invalid_kingdom_field_has_its_own_message() {
    let app = test_app();
    let cases = [
        ("kingdomName", json!("   "), "Invalid kingdom name"),
        ("kingdomType", json!("chaotic"), "Invalid kingdom type"),
        ("faction", json!("pirates"), "Invalid faction"),
        ("discordRequired", json!("yes"), "Invalid value for Discord requirement"),
        ("timeZone", json!("z".repeat(51)), "Invalid time zone"),
        ("otherInfo", json!("i".repeat(256)), "Invalid other information"),
    ];

    for (field, value, message) in cases {
        let mut body = alpha();
        if let Some(map) = body.as_object_mut() {
            map.insert(field.to_string(), value);
        }
        let (status, json) = send(&app, "POST", "/add-kingdom", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(json.pointer("/error/message"), Some(&json!(message)), "{field}");
        assert_eq!(json.pointer("/error/details"), Some(&json!(field)), "{field}");
    }

    let (_, body) = send(&app, "GET", "/list-kingdoms", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn missing_or_null_kingdom_text_is_rejected() {
    let app = test_app();
    let cases = [
        ("timeZone", "Invalid time zone"),
        ("otherInfo", "Invalid other information"),
    ];

    for (field, message) in cases {
        let mut missing = alpha();
        if let Some(map) = missing.as_object_mut() {
            map.remove(field);
        }
        let (status, json) = send(&app, "POST", "/add-kingdom", Some(missing)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "missing {field}");
        assert_eq!(json.pointer("/error/message"), Some(&json!(message)), "missing {field}");

        let mut null = alpha();
        if let Some(map) = null.as_object_mut() {
            map.insert(field.to_string(), Value::Null);
        }
        let (status, json) = send(&app, "POST", "/add-kingdom", Some(null)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "null {field}");
        assert_eq!(json.pointer("/error/message"), Some(&json!(message)), "null {field}");
    }

    let (_, body) = send(&app, "GET", "/list-kingdoms", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn drake_counts_down_expires_and_is_swept() {
    let app = test_app();
    let (status, _) = send(&app, "POST", "/add-pet-post", Some(drake(json!(1)))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/list-pets", None).await;
    assert_eq!(body.pointer("/0/id"), Some(&json!("pet:Drake:Amy")));
    assert_eq!(body.pointer("/0/timeLeft"), Some(&json!(60_000)));
    assert_eq!(body.pointer("/0/totalMinutes"), Some(&json!(1)));

    app.clock.advance(Duration::seconds(61));
    let (status, body) = send(&app, "GET", "/get-time-left/Drake:Amy", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "timeLeft": 0 }));

    let Ok(report) = app.state.pet_registry.sweep_expired().await else {
        panic!("sweep failed");
    };
    assert_eq!(report.reclaimed, 1);

    let (_, body) = send(&app, "GET", "/list-pets", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn removing_absent_pet_is_404() {
    let app = test_app();
    let (status, body) = send(&app, "DELETE", "/remove-pet/Drake/Amy", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.pointer("/error/message"), Some(&json!("Pet not found")));
}

#[tokio::test]
async fn removing_with_unusable_names_is_404() {
    let app = test_app();
    for uri in ["/remove-pet/Dra:ke/Amy", "/remove-pet/%20%20/Amy"] {
        let (status, body) = send(&app, "DELETE", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body.pointer("/error/message"), Some(&json!("Pet not found")), "{uri}");
    }
}

#[tokio::test]
async fn removed_pet_disappears_from_listing() {
    let app = test_app();
    let _ = send(&app, "POST", "/add-pet-post", Some(drake(json!(5)))).await;

    let (status, _) = send(&app, "DELETE", "/remove-pet/Drake/Amy", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/list-pets", None).await;
    assert_eq!(body, json!([]));
    let (status, _) = send(&app, "GET", "/get-time-left/Drake:Amy", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_timer_restarts_countdown() {
    let app = test_app();
    let body = json!({ "petName": "Drake", "playerName": "Amy", "totalMinutes": 3 });
    let (status, _) = send(&app, "POST", "/update-timer", Some(body.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let _ = send(&app, "POST", "/add-pet-post", Some(drake(json!(1)))).await;
    app.clock.advance(Duration::minutes(10));
    let (status, _) = send(&app, "POST", "/update-timer", Some(body)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/get-time-left/Drake:Amy", None).await;
    assert_eq!(body, json!({ "timeLeft": 180_000 }));
}

#[tokio::test]
async fn bad_pet_input_is_rejected() {
    let app = test_app();

    let (status, body) = send(&app, "POST", "/add-pet-post", Some(drake(json!(-1)))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.pointer("/error/details"), Some(&json!("totalMinutes")));

    let mut blank = drake(json!(5));
    if let Some(map) = blank.as_object_mut() {
        map.insert("petName".to_string(), json!(" "));
    }
    let (status, body) = send(&app, "POST", "/add-pet-post", Some(blank)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.pointer("/error/details"), Some(&json!("petName")));

    let (status, body) = send_raw_text(&app, "/add-pet-post", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.pointer("/error/code"), Some(&json!(1002)));
}

async fn send_raw_text(app: &TestApp, uri: &str, text: &'static str) -> (StatusCode, Value) {
    let Ok(request) = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(text))
    else {
        panic!("request should build");
    };
    let Ok(response) = app.router.clone().oneshot(request).await else {
        panic!("router is infallible");
    };
    let status = response.status();
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body read failed");
    };
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_reports_backend() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("status"), Some(&json!("healthy")));
    assert_eq!(body.get("storage"), Some(&json!("memory")));
}

#[tokio::test]
async fn kingdom_options_follow_configuration() {
    let config = AppConfig {
        kingdom_factions: vec!["pirates".to_string()],
        ..AppConfig::default()
    };
    let app = test_app_with(&config);

    let (_, body) = send(&app, "GET", "/config/kingdom-options", None).await;
    assert_eq!(
        body,
        json!({ "kingdomTypes": ["casual", "hardcore", "in_between"], "factions": ["pirates"] })
    );

    let (status, _) = send(&app, "POST", "/add-kingdom", Some(alpha())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pages_are_served() {
    let app = test_app();
    for uri in ["/", "/kingdoms"] {
        let (status, bytes) = send_raw(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(String::from_utf8_lossy(&bytes).contains("<!DOCTYPE html>"), "{uri}");
    }
}

#[tokio::test]
async fn rate_limit_rejects_after_burst() {
    let config = AppConfig {
        rate_limit_burst: 2,
        ..AppConfig::default()
    };
    let app = test_app_with(&config);

    for _ in 0..2 {
        let (status, _) = send(&app, "GET", "/list-pets", None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(&app, "GET", "/list-pets", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body.pointer("/error/code"), Some(&json!(429)));
}
