//! Handlers for image upload and lookup.

use annotator_core::error::CoreError;
use annotator_db::repositories::{AnnotationRepo, ImageRepo, LabelRepo};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::mappers::{AnnotationMapper, ImageMapper, ImageView};
use crate::multipart::MultipartForm;
use crate::query::FormatParams;
use crate::state::AppState;

/// POST /api/v1/images
///
/// Multipart upload with a `file` part and an optional `annotation` JSON
/// part. The image, its annotation and labels are created atomically.
pub async fn create_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = MultipartForm::read(multipart).await?.normalize();
    let image = ImageMapper::create(&state.pool, &state.storage, form).await?;
    Ok((StatusCode::CREATED, Json(ImageMapper::render(&image))))
}

/// GET /api/v1/images
pub async fn list_images(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let images = ImageRepo::list(&state.pool).await?;
    let views: Vec<ImageView> = images.iter().map(ImageMapper::render).collect();
    Ok(Json(views))
}

/// GET /api/v1/images/{file}
pub async fn get_image(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> AppResult<impl IntoResponse> {
    let image = ImageRepo::find_by_file(&state.pool, &file)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Image", &file)))?;
    Ok(Json(ImageMapper::render(&image)))
}

/// GET /api/v1/images/{file}/annotation
///
/// The image representation never carries annotation data, so it is
/// fetched here. Supports `?format=export`.
pub async fn get_image_annotation(
    State(state): State<AppState>,
    Path(file): Path<String>,
    Query(params): Query<FormatParams>,
) -> AppResult<impl IntoResponse> {
    if ImageRepo::find_by_file(&state.pool, &file).await?.is_none() {
        return Err(AppError::Core(CoreError::not_found("Image", &file)));
    }
    let annotation = AnnotationRepo::find_by_image(&state.pool, &file)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Annotation", &file)))?;
    let labels = LabelRepo::list_by_annotation(&state.pool, annotation.id).await?;

    Ok(Json(AnnotationMapper::render(
        &annotation,
        &labels,
        params.render_mode(),
    )))
}
