//! Mappers: validation, persistence and rendering of one entity type each.
//!
//! Nesting runs image -> annotation -> label. A parent mapper owns the
//! transaction and hands it down, so a failure at any depth rolls back the
//! whole request.

pub mod annotation;
pub mod image;
pub mod label;

pub use annotation::{AnnotationInput, AnnotationMapper, AnnotationView};
pub use image::{ImageInput, ImageMapper, ImageView};
pub use label::{LabelInput, LabelMapper, LabelView};

use annotator_core::error::CoreError;

use crate::error::AppError;

/// Re-key field errors of a nested mapper under `prefix`. Other errors pass
/// through unchanged.
pub(crate) fn nest_errors(err: AppError, prefix: &str) -> AppError {
    match err {
        AppError::Core(CoreError::InvalidInput(errors)) => errors.nested(prefix).into(),
        other => other,
    }
}
