//! Handlers for annotations and their nested labels.

use annotator_core::error::CoreError;
use annotator_core::types::DbId;
use annotator_db::repositories::{AnnotationRepo, LabelRepo};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::mappers::AnnotationMapper;
use crate::query::FormatParams;
use crate::state::AppState;

/// POST /api/v1/annotations
///
/// Create an annotation for an existing, not yet annotated image, together
/// with any labels nested under `labels`. All or nothing.
pub async fn create_annotation(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let (annotation, labels) = AnnotationMapper::create(&state.pool, &raw).await?;
    Ok((
        StatusCode::CREATED,
        Json(AnnotationMapper::render(&annotation, &labels, Default::default())),
    ))
}

/// GET /api/v1/annotations/{id}
pub async fn get_annotation(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<FormatParams>,
) -> AppResult<impl IntoResponse> {
    let annotation = AnnotationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Annotation", id)))?;
    let labels = LabelRepo::list_by_annotation(&state.pool, annotation.id).await?;

    Ok(Json(AnnotationMapper::render(
        &annotation,
        &labels,
        params.render_mode(),
    )))
}
