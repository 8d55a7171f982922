//! Pet board handlers: list, add, update timer, remove, time left.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AddPetRequest, MessageResponse, PetView, TimeLeftResponse, UpdateTimerRequest,
    parse_total_minutes,
};
use crate::app_state::AppState;
use crate::domain::NewPet;
use crate::error::{AppError, ErrorResponse};

/// `GET /list-pets` — Every tracked pet with its remaining time.
///
/// # Errors
///
/// Returns [`AppError::Storage`] if the store cannot be read.
#[utoipa::path(
    get,
    path = "/list-pets",
    tag = "Pets",
    summary = "List pets",
    description = "Returns every tracked pet with the milliseconds left on its countdown. Entries that ran out but were not yet swept appear with `timeLeft` 0.",
    responses(
        (status = 200, description = "Pet list", body = Vec<PetView>),
        (status = 500, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn list_pets(State(state): State<AppState>) -> Result<Json<Vec<PetView>>, AppError> {
    let pets = state.pet_registry.list_pets().await?;
    Ok(Json(pets.into_iter().map(PetView::from).collect()))
}

/// `POST /add-pet-post` — Start (or restart) a pet countdown.
///
/// # Errors
///
/// Returns [`AppError::Validation`] on bad input or
/// [`AppError::Storage`] if the write fails.
#[utoipa::path(
    post,
    path = "/add-pet-post",
    tag = "Pets",
    summary = "Add a pet",
    description = "Stores the pet under `(petName, playerName)` and starts its countdown now. Re-posting the same pair restarts the countdown.",
    request_body = AddPetRequest,
    responses(
        (status = 200, description = "Pet added", body = MessageResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn add_pet(
    State(state): State<AppState>,
    body: Result<Json<AddPetRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = body?;
    let total_minutes = parse_total_minutes(&req.total_minutes)?;
    let pet = NewPet::new(&req.pet_name, &req.player_name, &req.time_zone, total_minutes)?;

    state.pet_registry.add_or_replace_pet(pet).await?;
    Ok(Json(MessageResponse::new("Pet post added successfully")))
}

/// `POST /update-timer` — Restart an existing pet's countdown.
///
/// # Errors
///
/// Returns [`AppError::PetNotFound`] if the pet does not exist.
#[utoipa::path(
    post,
    path = "/update-timer",
    tag = "Pets",
    summary = "Update a pet timer",
    description = "Resets the countdown of an existing pet to `totalMinutes` from now.",
    request_body = UpdateTimerRequest,
    responses(
        (status = 200, description = "Timer updated", body = MessageResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Pet not found", body = ErrorResponse),
    )
)]
pub async fn update_timer(
    State(state): State<AppState>,
    body: Result<Json<UpdateTimerRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = body?;
    let total_minutes = parse_total_minutes(&req.total_minutes)?;

    state
        .pet_registry
        .update_timer(&req.pet_name, &req.player_name, total_minutes)
        .await?;
    Ok(Json(MessageResponse::new("Timer updated successfully")))
}

/// `DELETE /remove-pet/{petName}/{playerName}` — Remove a pet.
///
/// # Errors
///
/// Returns [`AppError::PetNotFound`] if the pet does not exist.
#[utoipa::path(
    delete,
    path = "/remove-pet/{petName}/{playerName}",
    tag = "Pets",
    summary = "Remove a pet",
    params(
        ("petName" = String, Path, description = "Pet name"),
        ("playerName" = String, Path, description = "Player name"),
    ),
    responses(
        (status = 200, description = "Pet removed", body = MessageResponse),
        (status = 404, description = "Pet not found", body = ErrorResponse),
    )
)]
pub async fn remove_pet(
    State(state): State<AppState>,
    Path((pet_name, player_name)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    state.pet_registry.remove_pet(&pet_name, &player_name).await?;
    Ok(Json(MessageResponse::new("Pet removed successfully")))
}

/// `GET /get-time-left/{petId}` — Remaining time for one pet.
///
/// # Errors
///
/// Returns [`AppError::PetNotFound`] if the pet does not exist.
#[utoipa::path(
    get,
    path = "/get-time-left/{petId}",
    tag = "Pets",
    summary = "Get time left",
    params(
        ("petId" = String, Path, description = "`{petName}:{playerName}`"),
    ),
    responses(
        (status = 200, description = "Milliseconds left", body = TimeLeftResponse),
        (status = 404, description = "Pet not found", body = ErrorResponse),
    )
)]
pub async fn get_time_left(
    State(state): State<AppState>,
    Path(pet_id): Path<String>,
) -> Result<Json<TimeLeftResponse>, AppError> {
    let time_left = state.pet_registry.time_left(&pet_id).await?;
    Ok(Json(TimeLeftResponse { time_left }))
}

/// Pet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/list-pets", get(list_pets))
        .route("/add-pet-post", post(add_pet))
        .route("/update-timer", post(update_timer))
        .route("/remove-pet/{pet_name}/{player_name}", delete(remove_pet))
        .route("/get-time-left/{pet_id}", get(get_time_left))
}
