use axum::routing::get;
use axum::Router;

use crate::handlers::image;
use crate::state::AppState;

/// ```text
/// POST   /                      create_image (multipart)
/// GET    /                      list_images
/// GET    /{file}                get_image
/// GET    /{file}/annotation     get_image_annotation (?format)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(image::list_images).post(image::create_image))
        .route("/{file}", get(image::get_image))
        .route("/{file}/annotation", get(image::get_image_annotation))
}
