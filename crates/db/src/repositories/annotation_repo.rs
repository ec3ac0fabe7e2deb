//! Repository for the `annotations` table.

use annotator_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::annotation::{Annotation, CreateAnnotation};

const COLUMNS: &str = "id, image_id, created_at";

/// Provides CRUD operations for annotations.
pub struct AnnotationRepo;

impl AnnotationRepo {
    /// Insert a new annotation, returning the created row.
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateAnnotation,
    ) -> Result<Annotation, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO annotations (image_id)
             VALUES ($1)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(&input.image_id)
            .fetch_one(executor)
            .await
    }

    /// Find an annotation by its ID.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Annotation>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM annotations WHERE id = $1");
        sqlx::query_as::<_, Annotation>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find the annotation attached to an image, if any.
    pub async fn find_by_image<'e, E>(
        executor: E,
        image_id: &str,
    ) -> Result<Option<Annotation>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM annotations WHERE image_id = $1");
        sqlx::query_as::<_, Annotation>(&query)
            .bind(image_id)
            .fetch_optional(executor)
            .await
    }
}
