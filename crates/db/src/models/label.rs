//! Label entity model and DTO.

use annotator_core::types::{DbId, LabelId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `labels` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Label {
    pub id: LabelId,
    pub annotation_id: DbId,
    pub class_id: String,
    /// Ordered shape points.
    pub surface: Vec<String>,
    pub shape: Option<serde_json::Value>,
    pub meta: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for inserting a validated label.
///
/// `id` is always resolved by the time a label reaches the database:
/// either the client's value or a freshly generated one.
#[derive(Debug, Clone)]
pub struct CreateLabel {
    pub id: LabelId,
    pub annotation_id: DbId,
    pub class_id: String,
    pub surface: Vec<String>,
    pub shape: Option<serde_json::Value>,
    pub meta: serde_json::Value,
}
