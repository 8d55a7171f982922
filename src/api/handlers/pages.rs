//! Browser pages, compiled into the binary.

use axum::Router;
use axum::response::Html;
use axum::routing::get;

use crate::app_state::AppState;

const PET_BOARD: &str = include_str!("../../../static/index.html");
const KINGDOM_DIRECTORY: &str = include_str!("../../../static/kingdoms.html");

/// `GET /` — Pet board.
pub async fn pet_board() -> Html<&'static str> {
    Html(PET_BOARD)
}

/// `GET /kingdoms` — Kingdom directory.
pub async fn kingdom_directory() -> Html<&'static str> {
    Html(KINGDOM_DIRECTORY)
}

/// Page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pet_board))
        .route("/kingdoms", get(kingdom_directory))
}
