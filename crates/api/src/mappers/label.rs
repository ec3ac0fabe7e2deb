//! Label mapper: payload reading, duplicate-id validation, persistence and
//! full/export rendering.

use std::collections::HashSet;

use annotator_core::render::{flatten_surface, RenderMode};
use annotator_core::types::{DbId, LabelId};
use annotator_core::validation::{FieldError, PayloadReader, ValidationErrors};
use annotator_db::models::label::{CreateLabel, Label};
use annotator_db::repositories::{AnnotationRepo, LabelRepo};
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};

/// Primary key constraint of the `labels` table.
const LABELS_PKEY: &str = "labels_pkey";

/// A label payload after field-type checks, before business validation.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelInput {
    /// Write-only back-reference, injected by the annotation mapper for
    /// nested creation.
    pub annotation_id: Option<DbId>,
    pub id: Option<LabelId>,
    pub class_id: String,
    pub surface: Vec<String>,
    pub shape: Option<Value>,
    pub meta: Value,
}

/// API representation of a label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LabelView {
    Full {
        id: LabelId,
        class_id: String,
        surface: Vec<String>,
        shape: Option<Value>,
        meta: Value,
    },
    Export {
        id: LabelId,
        class_id: String,
        surface: String,
    },
}

pub struct LabelMapper;

impl LabelMapper {
    /// Read a raw JSON label payload.
    pub fn to_internal(raw: &Value) -> Result<LabelInput, ValidationErrors> {
        let mut reader = PayloadReader::new(raw)?;
        let annotation_id = reader.optional_db_id("annotation_id");
        let id = reader.optional_uuid("id");
        let class_id = reader.required_string("class_id");
        let surface = reader.required_string_list("surface");
        let shape = reader.optional_value("shape");
        let meta = reader
            .optional_value("meta")
            .unwrap_or_else(|| Value::Object(Default::default()));
        reader.finish()?;

        Ok(LabelInput {
            annotation_id,
            id,
            class_id: class_id.unwrap_or_default(),
            surface: surface.unwrap_or_default(),
            shape,
            meta,
        })
    }

    /// Validate one label and stage it for insertion.
    ///
    /// The owning annotation must already be known: a missing
    /// `annotation_id` is a field error, as is a client-supplied `id` that
    /// already exists.
    pub async fn validate(conn: &mut PgConnection, input: LabelInput) -> AppResult<CreateLabel> {
        let errors = Self::check(conn, &input).await?;
        match input.annotation_id {
            Some(annotation_id) if errors.is_empty() => Ok(Self::stage(input, annotation_id)),
            _ => Err(errors.into()),
        }
    }

    /// Validate a batch of labels as a group.
    ///
    /// Every label is checked and all failures are reported, keyed
    /// `labels[<index>].<field>`. Two labels of the same batch sharing a
    /// client id are rejected as well. Nothing is staged unless the whole
    /// batch passes.
    pub async fn validate_batch(
        conn: &mut PgConnection,
        inputs: Vec<LabelInput>,
    ) -> AppResult<Vec<CreateLabel>> {
        let mut errors = ValidationErrors::new();
        let mut seen = HashSet::new();
        let mut staged = Vec::with_capacity(inputs.len());

        for (i, input) in inputs.into_iter().enumerate() {
            let mut label_errors = Self::check(conn, &input).await?;
            if let Some(id) = input.id {
                if !seen.insert(id) && label_errors.get("id").is_none() {
                    label_errors.add("id", FieldError::DuplicateIdentifier(id));
                }
            }

            match input.annotation_id {
                Some(annotation_id) if label_errors.is_empty() => {
                    staged.push(Self::stage(input, annotation_id));
                }
                _ => errors.extend(label_errors.nested(&format!("labels[{i}]"))),
            }
        }

        Ok(errors.into_result(staged)?)
    }

    /// Insert staged labels in order.
    ///
    /// A primary key collision means another request inserted the same id
    /// after validation; it is reported as a duplicate identifier.
    pub async fn persist_all(
        conn: &mut PgConnection,
        staged: &[CreateLabel],
    ) -> AppResult<Vec<Label>> {
        let mut created = Vec::with_capacity(staged.len());
        for (i, label) in staged.iter().enumerate() {
            match LabelRepo::create(&mut *conn, label).await {
                Ok(row) => created.push(row),
                Err(e) if is_unique_violation(&e, LABELS_PKEY) => {
                    return Err(ValidationErrors::single(
                        format!("labels[{i}].id"),
                        FieldError::DuplicateIdentifier(label.id),
                    )
                    .into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(created)
    }

    /// Create a single label from a raw payload in its own transaction.
    ///
    /// `annotation_id` is required here and must reference an existing
    /// annotation.
    pub async fn create(pool: &PgPool, raw: &Value) -> AppResult<Label> {
        let input = Self::to_internal(raw)?;
        let mut tx = pool.begin().await?;

        if let Some(annotation_id) = input.annotation_id {
            if AnnotationRepo::find_by_id(&mut *tx, annotation_id)
                .await?
                .is_none()
            {
                return Err(ValidationErrors::single(
                    "annotation_id",
                    FieldError::Invalid(format!("Annotation does not exist: {annotation_id}")),
                )
                .into());
            }
        }

        let staged = Self::validate(&mut *tx, input).await?;
        let label = LabelRepo::create(&mut *tx, &staged).await.map_err(|e| -> AppError {
            if is_unique_violation(&e, LABELS_PKEY) {
                ValidationErrors::single("id", FieldError::DuplicateIdentifier(staged.id)).into()
            } else {
                e.into()
            }
        })?;
        tx.commit().await?;

        tracing::info!(
            label_id = %label.id,
            annotation_id = label.annotation_id,
            "Label created"
        );
        Ok(label)
    }

    /// Render a stored label.
    ///
    /// Export mode keeps only `id`, `class_id` and `surface`, and joins the
    /// surface points into one string with no separator.
    pub fn render(label: &Label, mode: RenderMode) -> LabelView {
        match mode {
            RenderMode::Full => LabelView::Full {
                id: label.id,
                class_id: label.class_id.clone(),
                surface: label.surface.clone(),
                shape: label.shape.clone(),
                meta: label.meta.clone(),
            },
            RenderMode::Export => LabelView::Export {
                id: label.id,
                class_id: label.class_id.clone(),
                surface: flatten_surface(&label.surface),
            },
        }
    }

    async fn check(conn: &mut PgConnection, input: &LabelInput) -> AppResult<ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if input.annotation_id.is_none() {
            errors.add("annotation_id", FieldError::Required);
        }
        if let Some(id) = input.id {
            if LabelRepo::exists(&mut *conn, id).await? {
                errors.add("id", FieldError::DuplicateIdentifier(id));
            }
        }
        Ok(errors)
    }

    fn stage(input: LabelInput, annotation_id: DbId) -> CreateLabel {
        CreateLabel {
            id: input.id.unwrap_or_else(Uuid::new_v4),
            annotation_id,
            class_id: input.class_id,
            surface: input.surface,
            shape: input.shape,
            meta: input.meta,
        }
    }
}
