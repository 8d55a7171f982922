//! Kingdom directory handlers: list and add.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{AddKingdomRequest, KingdomView, MessageResponse};
use crate::app_state::AppState;
use crate::error::{AppError, ErrorResponse};

/// `GET /list-kingdoms` — Every registered kingdom.
///
/// # Errors
///
/// Returns [`AppError::Storage`] if the store cannot be read.
#[utoipa::path(
    get,
    path = "/list-kingdoms",
    tag = "Kingdoms",
    summary = "List kingdoms",
    responses(
        (status = 200, description = "Kingdom list", body = Vec<KingdomView>),
        (status = 500, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn list_kingdoms(
    State(state): State<AppState>,
) -> Result<Json<Vec<KingdomView>>, AppError> {
    let kingdoms = state.kingdom_registry.list_kingdoms().await?;
    Ok(Json(kingdoms.into_iter().map(KingdomView::from).collect()))
}

/// `POST /add-kingdom` — Register or replace a kingdom.
///
/// # Errors
///
/// Returns [`AppError::Validation`] naming the offending field.
#[utoipa::path(
    post,
    path = "/add-kingdom",
    tag = "Kingdoms",
    summary = "Add a kingdom",
    description = "Validates the signup and stores it under its trimmed name, replacing any kingdom with the same name.",
    request_body = AddKingdomRequest,
    responses(
        (status = 200, description = "Kingdom added", body = MessageResponse),
        (status = 400, description = "Invalid field", body = ErrorResponse),
    )
)]
pub async fn add_kingdom(
    State(state): State<AppState>,
    body: Result<Json<AddKingdomRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = body?;
    let signup = req.into_signup()?;

    state.kingdom_registry.add_or_replace_kingdom(signup).await?;
    Ok(Json(MessageResponse::new("Kingdom added successfully!")))
}

/// Kingdom routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/list-kingdoms", get(list_kingdoms))
        .route("/add-kingdom", post(add_kingdom))
}
