//! Shared query parameter types for API handlers.

use annotator_core::render::RenderMode;
use annotator_core::types::DbId;
use serde::Deserialize;

/// `?format=` on any endpoint that renders labels.
#[derive(Debug, Default, Deserialize)]
pub struct FormatParams {
    pub format: Option<String>,
}

impl FormatParams {
    pub fn render_mode(&self) -> RenderMode {
        RenderMode::from_format_param(self.format.as_deref())
    }
}

/// Query parameters for `GET /labels` (`?annotation_id=&format=`).
#[derive(Debug, Default, Deserialize)]
pub struct LabelListParams {
    pub annotation_id: Option<DbId>,
    pub format: Option<String>,
}

impl LabelListParams {
    pub fn render_mode(&self) -> RenderMode {
        RenderMode::from_format_param(self.format.as_deref())
    }
}
