//! Field-keyed validation errors and JSON payload readers.
//!
//! Every rejected request field is reported under its path (`file`,
//! `labels[1].id`, `annotation.labels[0].class_id`, ...) so the API layer can
//! return all problems at once.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::{DbId, LabelId};
use crate::upload::{supported_formats_display, MAX_FILE_SIZE};

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

// ---------------------------------------------------------------------------
// FieldError
// ---------------------------------------------------------------------------

/// A single validation failure attached to one field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Label with this id already exists: {0}")]
    DuplicateIdentifier(LabelId),

    #[error("File already exists")]
    DuplicateFile(String),

    #[error("{format} format is not supported. Supported formats: {}", supported_formats_display())]
    UnsupportedFormat { format: String },

    #[error("Your file is too big. Maximum size is {} bytes", MAX_FILE_SIZE)]
    FileTooLarge { size: u64 },

    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    InvalidImage,

    #[error("This field is required.")]
    Required,

    #[error("{0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// ValidationErrors
// ---------------------------------------------------------------------------

/// Ordered collection of field path -> errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<FieldError>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection holding exactly one error.
    pub fn single(field: impl Into<String>, error: FieldError) -> Self {
        let mut errors = Self::new();
        errors.add(field, error);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, error: FieldError) {
        self.fields.entry(field.into()).or_default().push(error);
    }

    /// Merge all errors of `other` into `self`.
    pub fn extend(&mut self, other: ValidationErrors) {
        for (field, errors) in other.fields {
            self.fields.entry(field).or_default().extend(errors);
        }
    }

    /// Re-key every error under `prefix`.
    ///
    /// `labels[0].id` nested under `annotation` becomes
    /// `annotation.labels[0].id`.
    pub fn nested(self, prefix: &str) -> Self {
        let fields = self
            .fields
            .into_iter()
            .map(|(field, errors)| (format!("{prefix}.{field}"), errors))
            .collect();
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&[FieldError]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[FieldError])> {
        self.fields
            .iter()
            .map(|(field, errors)| (field.as_str(), errors.as_slice()))
    }

    /// `Ok(value)` when no errors were collected, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, errors) in &self.fields {
            for error in errors {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {error}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, errors) in &self.fields {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            map.serialize_entry(field, &messages)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// PayloadReader
// ---------------------------------------------------------------------------

/// Reads typed fields out of a JSON object, collecting a [`FieldError`] for
/// every missing or mistyped field instead of stopping at the first one.
#[derive(Debug)]
pub struct PayloadReader<'a> {
    object: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> PayloadReader<'a> {
    /// Fails unless `value` is a JSON object.
    pub fn new(value: &'a Value) -> Result<Self, ValidationErrors> {
        match value {
            Value::Object(object) => Ok(Self {
                object,
                errors: ValidationErrors::new(),
            }),
            other => Err(ValidationErrors::single(
                NON_FIELD_ERRORS,
                FieldError::Invalid(format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    json_type_name(other)
                )),
            )),
        }
    }

    /// A non-blank string. Missing, null, blank and non-string values are errors.
    pub fn required_string(&mut self, field: &str) -> Option<String> {
        match self.present(field) {
            None => {
                self.errors.add(field, FieldError::Required);
                None
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.invalid(field, "This field may not be blank.");
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.invalid(field, "Not a valid string.");
                None
            }
        }
    }

    /// A string when present; absent or null yields `None`.
    pub fn optional_string(&mut self, field: &str) -> Option<String> {
        match self.present(field)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.invalid(field, "Not a valid string.");
                None
            }
        }
    }

    /// An array whose every element is a string.
    pub fn required_string_list(&mut self, field: &str) -> Option<Vec<String>> {
        let Some(value) = self.present(field) else {
            self.errors.add(field, FieldError::Required);
            return None;
        };
        let Value::Array(items) = value else {
            self.invalid(
                field,
                format!(
                    "Expected a list of items but got type \"{}\".",
                    json_type_name(value)
                ),
            );
            return None;
        };

        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item {
                Value::String(s) => out.push(s.clone()),
                _ => {
                    self.invalid(format!("{field}[{i}]"), "Not a valid string.");
                    return None;
                }
            }
        }
        Some(out)
    }

    /// A UUID in its canonical string form.
    pub fn optional_uuid(&mut self, field: &str) -> Option<Uuid> {
        let parsed = match self.present(field)? {
            Value::String(s) => Uuid::parse_str(s).ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.invalid(field, "Must be a valid UUID.");
        }
        parsed
    }

    /// An integer id, given either as a JSON number or a numeric string.
    pub fn optional_db_id(&mut self, field: &str) -> Option<DbId> {
        let parsed = match self.present(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.invalid(field, "A valid integer is required.");
        }
        parsed
    }

    /// The raw elements of an array field.
    pub fn optional_array(&mut self, field: &str) -> Option<&'a [Value]> {
        let value = self.present(field)?;
        match value {
            Value::Array(items) => Some(items.as_slice()),
            other => {
                self.invalid(
                    field,
                    format!(
                        "Expected a list of items but got type \"{}\".",
                        json_type_name(other)
                    ),
                );
                None
            }
        }
    }

    /// Any non-null JSON value, returned as-is.
    pub fn optional_value(&self, field: &str) -> Option<Value> {
        self.present(field).cloned()
    }

    /// Attach errors produced elsewhere (e.g. by a nested reader) to this payload.
    pub fn extend_errors(&mut self, errors: ValidationErrors) {
        self.errors.extend(errors);
    }

    /// `Ok(())` when every read succeeded.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        self.errors.into_result(())
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.object.get(field).filter(|v| !v.is_null())
    }

    fn invalid(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.add(field, FieldError::Invalid(message.into()));
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
