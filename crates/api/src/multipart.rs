//! Multipart request decoding.
//!
//! A multipart body may repeat a field name, so it is first read as
//! `name -> [values]`. [`MultipartForm::normalize`] then unwraps every
//! present, non-empty list to its first value. Mappers only ever see the
//! normalized form.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::{AppError, AppResult};

/// A file part of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name, not yet normalized.
    pub file_name: String,
    pub bytes: Bytes,
}

/// One value of a multipart field.
#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File(UploadedFile),
}

/// Raw multipart body: each field name with every value sent under it.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: BTreeMap<String, Vec<FormValue>>,
}

impl MultipartForm {
    /// Drain an axum [`Multipart`] stream.
    ///
    /// Parts carrying a file name become [`FormValue::File`], all others are
    /// read as text. Unnamed parts are skipped.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            let value = match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    FormValue::File(UploadedFile { file_name, bytes })
                }
                None => FormValue::Text(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                ),
            };

            form.push(name, value);
        }

        Ok(form)
    }

    pub fn push(&mut self, name: impl Into<String>, value: FormValue) {
        self.fields.entry(name.into()).or_default().push(value);
    }

    /// Unwrap each field to its first value.
    pub fn normalize(self) -> NormalizedForm {
        let fields = self
            .fields
            .into_iter()
            .filter_map(|(name, values)| values.into_iter().next().map(|v| (name, v)))
            .collect();
        NormalizedForm { fields }
    }
}

/// A multipart body with exactly one value per field.
#[derive(Debug, Default)]
pub struct NormalizedForm {
    fields: BTreeMap<String, FormValue>,
}

impl NormalizedForm {
    /// Remove and return a field's value.
    pub fn take(&mut self, name: &str) -> Option<FormValue> {
        self.fields.remove(name)
    }
}
