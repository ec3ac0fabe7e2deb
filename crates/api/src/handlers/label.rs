//! Handlers for labels.

use annotator_core::error::CoreError;
use annotator_core::types::LabelId;
use annotator_db::repositories::LabelRepo;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::mappers::{LabelMapper, LabelView};
use crate::query::{FormatParams, LabelListParams};
use crate::state::AppState;

/// POST /api/v1/labels
///
/// Create one label on an existing annotation (`annotation_id` required).
pub async fn create_label(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let label = LabelMapper::create(&state.pool, &raw).await?;
    Ok((
        StatusCode::CREATED,
        Json(LabelMapper::render(&label, Default::default())),
    ))
}

/// GET /api/v1/labels
///
/// List labels, optionally for one annotation. `?format=export` switches to
/// the export representation.
pub async fn list_labels(
    State(state): State<AppState>,
    Query(params): Query<LabelListParams>,
) -> AppResult<impl IntoResponse> {
    let mode = params.render_mode();
    let labels = LabelRepo::list(&state.pool, params.annotation_id).await?;
    let views: Vec<LabelView> = labels
        .iter()
        .map(|label| LabelMapper::render(label, mode))
        .collect();
    Ok(Json(views))
}

/// GET /api/v1/labels/{id}
pub async fn get_label(
    State(state): State<AppState>,
    Path(id): Path<LabelId>,
    Query(params): Query<FormatParams>,
) -> AppResult<impl IntoResponse> {
    let label = LabelRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Label", id)))?;
    Ok(Json(LabelMapper::render(&label, params.render_mode())))
}
