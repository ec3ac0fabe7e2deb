use axum::routing::{get, post};
use axum::Router;

use crate::handlers::annotation;
use crate::state::AppState;

/// ```text
/// POST   /          create_annotation
/// GET    /{id}      get_annotation (?format)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(annotation::create_annotation))
        .route("/{id}", get(annotation::get_annotation))
}
