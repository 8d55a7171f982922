//! Endpoint handlers organized by resource.

pub mod kingdom;
pub mod pages;
pub mod pet;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes every resource route.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(pet::routes())
        .merge(kingdom::routes())
        .merge(pages::routes())
}
