//! Annotation mapper: staged nested creation of an annotation and its labels.

use annotator_core::render::RenderMode;
use annotator_core::types::DbId;
use annotator_core::validation::{FieldError, PayloadReader, ValidationErrors};
use annotator_db::models::annotation::{Annotation, CreateAnnotation};
use annotator_db::models::label::Label;
use annotator_db::repositories::{AnnotationRepo, ImageRepo};
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};

use super::label::{LabelInput, LabelMapper, LabelView};
use crate::error::{is_unique_violation, AppError, AppResult};

const UQ_ANNOTATIONS_IMAGE_ID: &str = "uq_annotations_image_id";

/// An annotation payload after field-type checks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationInput {
    /// Write-only reference to the owning image's file identity.
    pub image_id: Option<String>,
    pub labels: Option<Vec<LabelInput>>,
}

/// API representation of an annotation. `image_id` is never emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationView {
    pub id: DbId,
    pub labels: Vec<LabelView>,
}

pub struct AnnotationMapper;

impl AnnotationMapper {
    /// Read a raw JSON annotation payload, including its nested labels.
    pub fn to_internal(raw: &Value) -> Result<AnnotationInput, ValidationErrors> {
        let mut reader = PayloadReader::new(raw)?;
        let image_id = reader.optional_string("image_id");

        let mut labels = None;
        if let Some(items) = reader.optional_array("labels") {
            let mut parsed = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match LabelMapper::to_internal(item) {
                    Ok(label) => parsed.push(label),
                    Err(e) => reader.extend_errors(e.nested(&format!("labels[{i}]"))),
                }
            }
            labels = Some(parsed);
        }
        reader.finish()?;

        Ok(AnnotationInput { image_id, labels })
    }

    /// Create an annotation and its labels in one transaction.
    pub async fn create(pool: &PgPool, raw: &Value) -> AppResult<(Annotation, Vec<Label>)> {
        let input = Self::to_internal(raw)?;
        let mut tx = pool.begin().await?;
        let created = Self::create_in_tx(&mut tx, input).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Create an annotation and its labels on a caller-owned transaction.
    ///
    /// 1. Take the nested labels out of the payload.
    /// 2. Insert the annotation row.
    /// 3. Point every label at the new annotation.
    /// 4. Validate the labels as one batch.
    /// 5. Insert the labels.
    ///
    /// Any error leaves the transaction to be rolled back by the caller, so
    /// the annotation row never outlives a rejected label.
    pub async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        mut input: AnnotationInput,
    ) -> AppResult<(Annotation, Vec<Label>)> {
        let image_id = Self::validate_image_id(tx, input.image_id.take()).await?;
        let mut labels = input.labels.take().unwrap_or_default();

        let annotation = AnnotationRepo::create(&mut **tx, &CreateAnnotation { image_id })
            .await
            .map_err(|e| -> AppError {
                if is_unique_violation(&e, UQ_ANNOTATIONS_IMAGE_ID) {
                    already_annotated().into()
                } else {
                    e.into()
                }
            })?;

        for label in &mut labels {
            label.annotation_id = Some(annotation.id);
        }

        let staged = match LabelMapper::validate_batch(&mut **tx, labels).await {
            Ok(staged) => staged,
            Err(err) => {
                tracing::warn!(
                    annotation_id = annotation.id,
                    error = %err,
                    "Label batch rejected, annotation will be rolled back"
                );
                return Err(err);
            }
        };
        let created = LabelMapper::persist_all(&mut **tx, &staged).await?;

        tracing::info!(
            annotation_id = annotation.id,
            image_id = %annotation.image_id,
            labels = created.len(),
            "Annotation created"
        );
        Ok((annotation, created))
    }

    pub fn render(annotation: &Annotation, labels: &[Label], mode: RenderMode) -> AnnotationView {
        AnnotationView {
            id: annotation.id,
            labels: labels
                .iter()
                .map(|label| LabelMapper::render(label, mode))
                .collect(),
        }
    }

    /// The image must exist and must not be annotated yet.
    async fn validate_image_id(
        tx: &mut Transaction<'_, Postgres>,
        image_id: Option<String>,
    ) -> AppResult<String> {
        let Some(image_id) = image_id else {
            return Err(ValidationErrors::single("image_id", FieldError::Required).into());
        };
        if !ImageRepo::exists_by_file(&mut **tx, &image_id).await? {
            return Err(ValidationErrors::single(
                "image_id",
                FieldError::Invalid(format!("Image does not exist: {image_id}")),
            )
            .into());
        }
        if AnnotationRepo::find_by_image(&mut **tx, &image_id)
            .await?
            .is_some()
        {
            return Err(already_annotated().into());
        }
        Ok(image_id)
    }
}

fn already_annotated() -> ValidationErrors {
    ValidationErrors::single(
        "image_id",
        FieldError::Invalid("Image already has an annotation.".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_internal_accepts_missing_labels() {
        let input = AnnotationMapper::to_internal(&json!({ "image_id": "a.png" })).unwrap();
        assert_eq!(input.image_id.as_deref(), Some("a.png"));
        assert_eq!(input.labels, None);
    }

    #[test]
    fn to_internal_keys_label_errors_by_index() {
        let errors = AnnotationMapper::to_internal(&json!({
            "labels": [
                { "class_id": "ok", "surface": [] },
                { "surface": ["A"] },
            ]
        }))
        .unwrap_err();
        assert_eq!(
            errors.get("labels[1].class_id"),
            Some(&[FieldError::Required][..])
        );
        assert!(errors.get("labels[0].class_id").is_none());
    }

    #[test]
    fn to_internal_rejects_non_list_labels() {
        let errors = AnnotationMapper::to_internal(&json!({ "labels": "nope" })).unwrap_err();
        assert!(errors.get("labels").is_some());
    }
}
