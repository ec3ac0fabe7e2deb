//! Repository for the `images` table.

use sqlx::{PgExecutor, PgPool};

use crate::models::image::{CreateImage, Image};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, file, format, size_bytes, width, height, created_at";

/// Provides CRUD operations for images.
pub struct ImageRepo;

impl ImageRepo {
    /// Insert a new image, returning the created row.
    ///
    /// Fails with a unique violation on `uq_images_file` if another image
    /// already holds the same file identity.
    pub async fn create<'e, E>(executor: E, input: &CreateImage) -> Result<Image, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO images (file, format, size_bytes, width, height)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(&input.file)
            .bind(&input.format)
            .bind(input.size_bytes)
            .bind(input.width)
            .bind(input.height)
            .fetch_one(executor)
            .await
    }

    /// Whether an image with exactly this file identity exists.
    pub async fn exists_by_file<'e, E>(executor: E, file: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM images WHERE file = $1)")
            .bind(file)
            .fetch_one(executor)
            .await?;
        Ok(row.0)
    }

    /// Find an image by its file identity.
    pub async fn find_by_file(pool: &PgPool, file: &str) -> Result<Option<Image>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM images WHERE file = $1");
        sqlx::query_as::<_, Image>(&query)
            .bind(file)
            .fetch_optional(pool)
            .await
    }

    /// List all images, oldest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Image>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM images ORDER BY id");
        sqlx::query_as::<_, Image>(&query).fetch_all(pool).await
    }
}
