//! Repository for the `labels` table.

use annotator_core::types::{DbId, LabelId};
use sqlx::{PgExecutor, PgPool};

use crate::models::label::{CreateLabel, Label};

const COLUMNS: &str = "id, annotation_id, class_id, surface, shape, meta, created_at";

/// Provides CRUD operations for labels.
pub struct LabelRepo;

impl LabelRepo {
    /// Insert a new label, returning the created row.
    pub async fn create<'e, E>(executor: E, input: &CreateLabel) -> Result<Label, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO labels (id, annotation_id, class_id, surface, shape, meta)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Label>(&query)
            .bind(input.id)
            .bind(input.annotation_id)
            .bind(&input.class_id)
            .bind(&input.surface)
            .bind(&input.shape)
            .bind(&input.meta)
            .fetch_one(executor)
            .await
    }

    /// Whether a label with this ID exists.
    pub async fn exists<'e, E>(executor: E, id: LabelId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM labels WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await?;
        Ok(row.0)
    }

    /// Find a label by its ID.
    pub async fn find_by_id(pool: &PgPool, id: LabelId) -> Result<Option<Label>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM labels WHERE id = $1");
        sqlx::query_as::<_, Label>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the labels of one annotation in insertion order.
    pub async fn list_by_annotation<'e, E>(
        executor: E,
        annotation_id: DbId,
    ) -> Result<Vec<Label>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM labels
             WHERE annotation_id = $1
             ORDER BY seq"
        );
        sqlx::query_as::<_, Label>(&query)
            .bind(annotation_id)
            .fetch_all(executor)
            .await
    }

    /// List every label, optionally restricted to one annotation.
    pub async fn list(pool: &PgPool, annotation_id: Option<DbId>) -> Result<Vec<Label>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM labels
             WHERE ($1::BIGINT IS NULL OR annotation_id = $1)
             ORDER BY annotation_id, seq"
        );
        sqlx::query_as::<_, Label>(&query)
            .bind(annotation_id)
            .fetch_all(pool)
            .await
    }
}
