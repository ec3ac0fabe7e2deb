use annotator_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `annotations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Annotation {
    pub id: DbId,
    /// File identity of the owning image.
    pub image_id: String,
    pub created_at: Timestamp,
}

/// DTO for creating an annotation.
#[derive(Debug, Clone)]
pub struct CreateAnnotation {
    pub image_id: String,
}
