//! System endpoints: health check and kingdom signup options.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::KingdomOptionsResponse;
use crate::app_state::AppState;
use crate::domain::KingdomType;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    storage: String,
}

/// `GET /health` — Service health status.
///
/// Reports `degraded` with 503 when the store does not answer a ping.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp, and the storage backend.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Storage unreachable", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (status, label) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            tracing::warn!(error = %e, "health check: storage ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        }
    };
    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage: state.store.backend_name().to_string(),
        }),
    )
}

/// `GET /config/kingdom-options` — Accepted kingdom types and factions.
#[utoipa::path(
    get,
    path = "/config/kingdom-options",
    tag = "System",
    summary = "Kingdom signup options",
    description = "Returns the kingdom types and faction identifiers accepted by `POST /add-kingdom`.",
    responses(
        (status = 200, description = "Accepted values", body = KingdomOptionsResponse),
    )
)]
pub async fn kingdom_options_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(KingdomOptionsResponse {
            kingdom_types: KingdomType::ALL.to_vec(),
            factions: state.kingdom_registry.factions().as_slice().to_vec(),
        }),
    )
}

/// System routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/kingdom-options", get(kingdom_options_handler))
}
