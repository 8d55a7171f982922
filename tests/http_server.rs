//! End-to-end test over a real TCP listener with `reqwest`.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{Value, json};

use pet_kingdom_board::api::build_app;
use pet_kingdom_board::app_state::AppState;
use pet_kingdom_board::config::AppConfig;
use pet_kingdom_board::domain::SystemClock;
use pet_kingdom_board::storage::{KeyValueStore, MemoryStore};

async fn spawn_server() -> SocketAddr {
    let config = AppConfig::default();
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let app = build_app(AppState::new(store, Arc::new(SystemClock), &config), &config);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });
    addr
}

#[tokio::test]
async fn pet_and_kingdom_flow_over_http() {
    let addr = spawn_server().await;
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();

    let Ok(response) = client
        .post(format!("{base}/add-pet-post"))
        .json(&json!({
            "petName": "Drake",
            "playerName": "Amy",
            "timeZone": "UTC",
            "totalMinutes": 1
        }))
        .send()
        .await
    else {
        panic!("add-pet-post failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let Ok(response) = client.get(format!("{base}/list-pets")).send().await else {
        panic!("list-pets failed");
    };
    let Ok(pets) = response.json::<Vec<Value>>().await else {
        panic!("list-pets body is not a JSON array");
    };
    assert_eq!(pets.len(), 1);
    let time_left = pets
        .first()
        .and_then(|p| p.get("timeLeft"))
        .and_then(Value::as_u64)
        .unwrap_or_default();
    assert!(time_left > 55_000 && time_left <= 60_000, "timeLeft was {time_left}");

    let Ok(response) = client
        .delete(format!("{base}/remove-pet/Drake/Amy"))
        .send()
        .await
    else {
        panic!("remove-pet failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let Ok(response) = client
        .delete(format!("{base}/remove-pet/Drake/Amy"))
        .send()
        .await
    else {
        panic!("remove-pet failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let Ok(response) = client
        .post(format!("{base}/add-kingdom"))
        .json(&json!({
            "kingdomName": "Alpha",
            "kingdomType": "in_between",
            "faction": "knights_of_inferno",
            "discordRequired": false,
            "timeZone": "Europe/Madrid",
            "otherInfo": ""
        }))
        .send()
        .await
    else {
        panic!("add-kingdom failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let Ok(response) = client.get(format!("{base}/list-kingdoms")).send().await else {
        panic!("list-kingdoms failed");
    };
    let Ok(kingdoms) = response.json::<Value>().await else {
        panic!("list-kingdoms body is not JSON");
    };
    assert_eq!(kingdoms.pointer("/0/kingdomType"), Some(&json!("in_between")));
    assert_eq!(kingdoms.pointer("/0/discordRequired"), Some(&json!(false)));
}
