//! Label projection policy for read endpoints.

/// Value of the `format` query parameter that selects [`RenderMode::Export`].
pub const EXPORT_FORMAT_KEY: &str = "export";

/// How labels are rendered on the way out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Every declared field, as stored.
    #[default]
    Full,
    /// Only `id`, `class_id` and `surface`, with the surface flattened.
    Export,
}

impl RenderMode {
    /// Pick the mode from the raw `format` query parameter.
    ///
    /// `"export"` in any letter case selects [`RenderMode::Export`]; absent or
    /// any other value selects [`RenderMode::Full`].
    pub fn from_format_param(format: Option<&str>) -> Self {
        match format {
            Some(f) if f.eq_ignore_ascii_case(EXPORT_FORMAT_KEY) => Self::Export,
            _ => Self::Full,
        }
    }
}

/// Concatenate surface points into one string, with no separator.
pub fn flatten_surface(surface: &[String]) -> String {
    surface.concat()
}
