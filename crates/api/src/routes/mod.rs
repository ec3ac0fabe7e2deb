pub mod annotations;
pub mod health;
pub mod images;
pub mod labels;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /images                         create (multipart), list
/// /images/{file}                  get
/// /images/{file}/annotation       get annotation (?format)
///
/// /annotations                    create (nested labels)
/// /annotations/{id}               get (?format)
///
/// /labels                         create, list (?annotation_id, ?format)
/// /labels/{id}                    get (?format)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/images", images::router())
        .nest("/annotations", annotations::router())
        .nest("/labels", labels::router())
}
