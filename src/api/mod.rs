//! HTTP layer: route handlers, DTOs, rate limiting and router composition.
//!
//! JSON endpoints and browser pages are mounted at the root, as the pages
//! call them by absolute path.

pub mod docs;
pub mod dto;
pub mod handlers;
pub mod rate_limit;

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::config::AppConfig;
use crate::error::AppError;

/// Builds the router with every endpoint, without middleware or state.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes())
        .merge(docs::routes())
}

/// Builds the complete application: routes, middleware stack and state.
///
/// Outermost first: panic recovery, request tracing, request timeout,
/// CORS, per-IP rate limiting.
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    let limiter = Arc::clone(&state.rate_limiter);
    build_router()
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    config.request_timeout(),
                ))
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn_with_state(
                    limiter,
                    rate_limit::enforce,
                )),
        )
        .with_state(state)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| (*s).to_string()))
        .unwrap_or_else(|| "unknown panic payload".to_string());
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn panic_becomes_generic_500() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("Internal Server Error"));
        assert!(!text.contains("boom"));
    }
}
