use axum::routing::get;
use axum::Router;

use crate::handlers::label;
use crate::state::AppState;

/// ```text
/// POST   /          create_label
/// GET    /          list_labels (?annotation_id, ?format)
/// GET    /{id}      get_label (?format)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(label::list_labels).post(label::create_label))
        .route("/{id}", get(label::get_label))
}
