//! Image entity model and DTO.

use annotator_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Image {
    pub id: DbId,
    /// Stored file identity: the normalized upload name.
    pub file: String,
    pub format: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub created_at: Timestamp,
}

/// DTO for inserting an image whose upload has passed validation.
#[derive(Debug, Clone)]
pub struct CreateImage {
    pub file: String,
    pub format: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
}
