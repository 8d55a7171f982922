//! OpenAPI document and, with the `swagger-ui` feature, its browser UI.

use axum::Router;
use utoipa::OpenApi;

use crate::api::dto::{
    AddKingdomRequest, AddPetRequest, KingdomOptionsResponse, KingdomView, MessageResponse,
    PetView, TimeLeftResponse, UpdateTimerRequest,
};
use crate::api::handlers::{kingdom, pet, system};
use crate::app_state::AppState;
use crate::domain::KingdomType;
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI description of every JSON endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "pet-kingdom-board",
        description = "Pet countdown board and kingdom directory."
    ),
    paths(
        pet::list_pets,
        pet::add_pet,
        pet::update_timer,
        pet::remove_pet,
        pet::get_time_left,
        kingdom::list_kingdoms,
        kingdom::add_kingdom,
        system::health_handler,
        system::kingdom_options_handler,
    ),
    components(schemas(
        AddPetRequest,
        UpdateTimerRequest,
        PetView,
        TimeLeftResponse,
        AddKingdomRequest,
        KingdomView,
        KingdomType,
        KingdomOptionsResponse,
        MessageResponse,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Pets", description = "Timed pet entries"),
        (name = "Kingdoms", description = "Kingdom signups"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;

/// Swagger UI at `/swagger-ui`, document at `/api-docs/openapi.json`.
#[cfg(feature = "swagger-ui")]
pub fn routes() -> Router<AppState> {
    Router::new().merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
}

/// No documentation routes without the `swagger-ui` feature.
#[cfg(not(feature = "swagger-ui"))]
pub fn routes() -> Router<AppState> {
    Router::new()
}
