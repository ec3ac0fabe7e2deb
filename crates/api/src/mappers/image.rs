//! Image mapper: multipart upload validation and the atomic image +
//! annotation + labels creation.

use annotator_core::upload::{self, ImageInfo};
use annotator_core::validation::{FieldError, ValidationErrors};
use annotator_db::models::image::{CreateImage, Image};
use annotator_db::repositories::ImageRepo;
use axum::body::Bytes;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

use super::annotation::{AnnotationInput, AnnotationMapper};
use super::nest_errors;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::multipart::{FormValue, NormalizedForm};
use crate::storage::FileStorage;

pub const FILE_FIELD: &str = "file";
pub const ANNOTATION_FIELD: &str = "annotation";

const UQ_IMAGES_FILE: &str = "uq_images_file";

/// An uploaded file that has a usable name and a readable header.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    /// Normalized file name; becomes the image's stored identity.
    pub file_name: String,
    pub info: ImageInfo,
    pub bytes: Bytes,
}

/// A validated upload request.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub upload: StagedUpload,
    /// Nested annotation payload, without an `image_id` yet.
    pub annotation: Option<AnnotationInput>,
}

/// API representation of an image. Nothing but the file identity is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageView {
    pub id: String,
}

pub struct ImageMapper;

impl ImageMapper {
    /// Validate a normalized multipart form.
    ///
    /// Errors from the `file` part and from the nested `annotation` part are
    /// collected together.
    pub async fn validate(pool: &PgPool, mut form: NormalizedForm) -> AppResult<ImageInput> {
        let mut errors = ValidationErrors::new();

        let upload = match Self::read_file(form.take(FILE_FIELD)) {
            Ok(upload) => match Self::find_file_violation(pool, &upload).await? {
                None => Some(upload),
                Some(violation) => {
                    errors.add(FILE_FIELD, violation);
                    None
                }
            },
            Err(e) => {
                errors.add(FILE_FIELD, e);
                None
            }
        };

        let annotation = Self::read_annotation(form.take(ANNOTATION_FIELD)).unwrap_or_else(|e| {
            errors.extend(e);
            None
        });

        match upload {
            Some(upload) if errors.is_empty() => Ok(ImageInput { upload, annotation }),
            _ => Err(errors.into()),
        }
    }

    /// Validate and create an image, its stored file and an optional nested
    /// annotation in one transaction.
    pub async fn create(
        pool: &PgPool,
        storage: &FileStorage,
        form: NormalizedForm,
    ) -> AppResult<Image> {
        let input = Self::validate(pool, form).await?;
        let file_name = input.upload.file_name.clone();

        match Self::store(pool, storage, input).await {
            Ok(image) => {
                tracing::info!(
                    image_id = image.id,
                    file = %image.file,
                    format = %image.format,
                    size_bytes = image.size_bytes,
                    "Image created"
                );
                Ok(image)
            }
            Err(err) => {
                tracing::warn!(file = %file_name, error = %err, "Image creation rolled back");
                Err(err)
            }
        }
    }

    pub fn render(image: &Image) -> ImageView {
        ImageView {
            id: image.file.clone(),
        }
    }

    /// 1. Insert the image row, which claims the file name.
    /// 2. Write the bytes to storage.
    /// 3. Create the nested annotation against the new image's identity.
    /// 4. Commit, then keep the file.
    ///
    /// Until step 4 the file is owned by a [`StoredFile`](crate::storage::StoredFile) declared after the
    /// transaction, so it is deleted before the row is released even when
    /// this future is dropped part way.
    async fn store(pool: &PgPool, storage: &FileStorage, input: ImageInput) -> AppResult<Image> {
        let ImageInput { upload, annotation } = input;
        let mut tx = pool.begin().await?;

        let (width, height) = match upload.info.dimensions {
            Some((w, h)) => (i32::try_from(w).ok(), i32::try_from(h).ok()),
            None => (None, None),
        };
        let row = CreateImage {
            file: upload.file_name.clone(),
            format: upload.info.format.clone(),
            size_bytes: upload.info.size_bytes as i64,
            width,
            height,
        };
        let image = ImageRepo::create(&mut *tx, &row)
            .await
            .map_err(|e| -> AppError {
                if is_unique_violation(&e, UQ_IMAGES_FILE) {
                    ValidationErrors::single(
                        FILE_FIELD,
                        FieldError::DuplicateFile(upload.file_name.clone()),
                    )
                    .into()
                } else {
                    e.into()
                }
            })?;

        let stored = storage
            .save(&image.file, &upload.bytes)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to store upload: {e}")))?;

        if let Some(mut annotation) = annotation {
            annotation.image_id = Some(image.file.clone());
            if let Err(err) = AnnotationMapper::create_in_tx(&mut tx, annotation).await {
                // The file goes first: the rollback lets a waiting upload of
                // the same name proceed.
                drop(stored);
                if let Err(e) = tx.rollback().await {
                    tracing::warn!(file = %image.file, error = %e, "Rollback failed");
                }
                return Err(nest_errors(err, ANNOTATION_FIELD));
            }
        }

        if let Err(e) = tx.commit().await {
            drop(stored);
            return Err(e.into());
        }
        stored.keep();
        Ok(image)
    }

    /// Name and header checks that need no database access.
    fn read_file(value: Option<FormValue>) -> Result<StagedUpload, FieldError> {
        let file = match value {
            Some(FormValue::File(file)) => file,
            Some(FormValue::Text(_)) => {
                return Err(FieldError::Invalid(
                    "The submitted data was not a file. Check the encoding type on the form."
                        .to_string(),
                ))
            }
            None => return Err(FieldError::Required),
        };

        if file.bytes.is_empty() {
            return Err(FieldError::Invalid("The submitted file is empty.".to_string()));
        }

        let file_name = upload::valid_filename(&file.file_name)?;
        let info = upload::inspect_image(&file.bytes)?;
        Ok(StagedUpload {
            file_name,
            info,
            bytes: file.bytes,
        })
    }

    /// The first failing upload rule, in order: duplicate name, format, size.
    async fn find_file_violation(
        pool: &PgPool,
        upload: &StagedUpload,
    ) -> Result<Option<FieldError>, sqlx::Error> {
        if ImageRepo::exists_by_file(pool, &upload.file_name).await? {
            return Ok(Some(FieldError::DuplicateFile(upload.file_name.clone())));
        }
        if let Err(e) = upload::check_format(&upload.info) {
            return Ok(Some(e));
        }
        Ok(upload::check_file_size(upload.info.size_bytes).err())
    }

    /// Parse the optional `annotation` part. It is a JSON text part; an
    /// empty value counts as absent.
    fn read_annotation(
        value: Option<FormValue>,
    ) -> Result<Option<AnnotationInput>, ValidationErrors> {
        let text = match value {
            None => return Ok(None),
            Some(FormValue::Text(text)) if text.trim().is_empty() => return Ok(None),
            Some(FormValue::Text(text)) => text,
            Some(FormValue::File(_)) => {
                return Err(ValidationErrors::single(
                    ANNOTATION_FIELD,
                    FieldError::Invalid("Expected a JSON object, received a file.".to_string()),
                ))
            }
        };

        let raw: Value = serde_json::from_str(&text).map_err(|e| {
            ValidationErrors::single(ANNOTATION_FIELD, FieldError::Invalid(format!("Invalid JSON: {e}")))
        })?;

        AnnotationMapper::to_internal(&raw)
            .map(Some)
            .map_err(|e| e.nested(ANNOTATION_FIELD))
    }
}
