//! Upload rules for image files.
//!
//! Filename normalization, format sniffing and the size limit. The duplicate
//! file check needs the database and lives with the image mapper; everything
//! here is pure.

use std::io::Cursor;
use std::sync::LazyLock;

use image::{ImageFormat, ImageReader};
use regex::Regex;

use crate::validation::FieldError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum accepted file size in bytes (20 MiB). A file of exactly this size
/// is accepted.
pub const MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Decoded formats accepted for upload.
pub const SUPPORTED_FORMATS: &[&str] = &["JPEG", "PNG", "TIFF"];

/// Anything outside `[-\w.]` is dropped from uploaded filenames.
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^-\w.]").expect("valid regex"));

/// `['JPEG', 'PNG', 'TIFF']`, as shown in error messages.
pub fn supported_formats_display() -> String {
    let quoted: Vec<String> = SUPPORTED_FORMATS.iter().map(|f| format!("'{f}'")).collect();
    format!("[{}]", quoted.join(", "))
}

// ---------------------------------------------------------------------------
// Filename normalization
// ---------------------------------------------------------------------------

/// Return a filesystem-safe form of an uploaded file's name.
///
/// Directory components are discarded, surrounding whitespace trimmed, inner
/// spaces turned into underscores, and every character other than
/// alphanumerics, `_`, `-` and `.` removed. Names that end up empty, `.` or
/// `..` are rejected.
pub fn valid_filename(name: &str) -> Result<String, FieldError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let spaced = base.trim().replace(' ', "_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&spaced, "").into_owned();

    if matches!(cleaned.as_str(), "" | "." | "..") {
        return Err(FieldError::Invalid(format!(
            "Could not derive file name from '{name}'."
        )));
    }
    Ok(cleaned)
}

// ---------------------------------------------------------------------------
// Format detection
// ---------------------------------------------------------------------------

/// What could be learned about an uploaded image without decoding pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Upper-case format name, e.g. `PNG`.
    pub format: String,
    /// Only known for supported formats, read from the header.
    pub dimensions: Option<(u32, u32)>,
    pub size_bytes: u64,
}

/// Sniff the format from the file's magic bytes.
///
/// Supported formats also get their header decoded, so a truncated or
/// corrupt PNG/JPEG/TIFF is reported as [`FieldError::InvalidImage`] rather
/// than accepted. Recognised-but-unsupported formats are returned as-is so
/// [`check_format`] can name them.
pub fn inspect_image(bytes: &[u8]) -> Result<ImageInfo, FieldError> {
    let detected = image::guess_format(bytes).map_err(|_| FieldError::InvalidImage)?;
    let format = format_name(detected);

    let dimensions = if is_supported(&format) {
        let dims = ImageReader::with_format(Cursor::new(bytes), detected)
            .into_dimensions()
            .map_err(|_| FieldError::InvalidImage)?;
        Some(dims)
    } else {
        None
    };

    Ok(ImageInfo {
        format,
        dimensions,
        size_bytes: bytes.len() as u64,
    })
}

pub fn is_supported(format: &str) -> bool {
    SUPPORTED_FORMATS.contains(&format)
}

/// Fail with [`FieldError::UnsupportedFormat`] unless the format is allowed.
pub fn check_format(info: &ImageInfo) -> Result<(), FieldError> {
    if is_supported(&info.format) {
        Ok(())
    } else {
        Err(FieldError::UnsupportedFormat {
            format: info.format.clone(),
        })
    }
}

/// Fail with [`FieldError::FileTooLarge`] when `size` exceeds [`MAX_FILE_SIZE`].
pub fn check_file_size(size: u64) -> Result<(), FieldError> {
    if size > MAX_FILE_SIZE {
        Err(FieldError::FileTooLarge { size })
    } else {
        Ok(())
    }
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        ImageFormat::Gif => "GIF".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::Ico => "ICO".to_string(),
        other => format!("{other:?}").to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        image::DynamicImage::new_rgb8(width, height)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    // -- valid_filename --

    #[test]
    fn filename_spaces_become_underscores() {
        assert_eq!(valid_filename("  my cat.png ").unwrap(), "my_cat.png");
    }

    #[test]
    fn filename_unsafe_characters_are_dropped() {
        assert_eq!(valid_filename("john's portrait (1).jpg").unwrap(), "johns_portrait_1.jpg");
    }

    #[test]
    fn filename_keeps_unicode_word_characters() {
        assert_eq!(valid_filename("café-été.tiff").unwrap(), "café-été.tiff");
    }

    #[test]
    fn filename_directory_components_are_discarded() {
        assert_eq!(valid_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(valid_filename(r"C:\photos\a b.png").unwrap(), "a_b.png");
    }

    #[test]
    fn filename_that_normalizes_to_nothing_is_rejected() {
        assert_matches!(valid_filename("???"), Err(FieldError::Invalid(_)));
        assert_matches!(valid_filename(".."), Err(FieldError::Invalid(_)));
        assert_matches!(valid_filename(""), Err(FieldError::Invalid(_)));
    }

    #[test]
    fn differently_spelled_names_can_collide() {
        assert_eq!(
            valid_filename("a b.png").unwrap(),
            valid_filename("a_b.png").unwrap()
        );
    }

    // -- inspect_image / check_format --

    #[test]
    fn png_is_detected_with_dimensions() {
        let info = inspect_image(&png_bytes(4, 3)).unwrap();
        assert_eq!(info.format, "PNG");
        assert_eq!(info.dimensions, Some((4, 3)));
        assert!(check_format(&info).is_ok());
    }

    #[test]
    fn gif_is_detected_but_unsupported() {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[0u8; 32]);
        let info = inspect_image(&bytes).unwrap();
        assert_eq!(info.format, "GIF");
        assert_eq!(info.dimensions, None);
        assert_matches!(
            check_format(&info),
            Err(FieldError::UnsupportedFormat { format }) if format == "GIF"
        );
    }

    #[test]
    fn random_bytes_are_not_an_image() {
        assert_matches!(inspect_image(b"hello world"), Err(FieldError::InvalidImage));
    }

    #[test]
    fn truncated_png_is_not_an_image() {
        let bytes = png_bytes(4, 4);
        assert_matches!(inspect_image(&bytes[..12]), Err(FieldError::InvalidImage));
    }

    // -- check_file_size --

    #[test]
    fn size_limit_is_inclusive() {
        assert!(check_file_size(MAX_FILE_SIZE).is_ok());
        assert_matches!(
            check_file_size(MAX_FILE_SIZE + 1),
            Err(FieldError::FileTooLarge { size }) if size == MAX_FILE_SIZE + 1
        );
    }

    #[test]
    fn size_limit_is_twenty_mebibytes() {
        assert_eq!(MAX_FILE_SIZE, 20_971_520);
    }

    #[test]
    fn supported_formats_display_matches_message_style() {
        assert_eq!(supported_formats_display(), "['JPEG', 'PNG', 'TIFF']");
    }
}
