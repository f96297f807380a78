//! Supported input formats.
//!
//! The registry is a closed set: PNG, AVIF, JPEG and GIF. Adding a format
//! means adding a [`SupportedFormat`] variant and a decoder in
//! [`RustBackend`](crate::imaging::RustBackend), never a config switch.
//!
//! | Format | MIME type | Extensions |
//! |---|---|---|
//! | PNG | `image/png` | `png` |
//! | AVIF | `image/avif` | `avif` |
//! | JPEG | `image/jpeg` | `jpg`, `jpeg` |
//! | GIF | `image/gif` | `gif` |

use std::path::Path;

pub const SUPPORTED_MIME_TYPES: &[&str] = &["image/png", "image/avif", "image/jpeg", "image/gif"];

pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "avif", "jpg", "jpeg", "gif"];

/// MIME type reported for files whose extension is not recognized.
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedFormat {
    Png,
    Avif,
    Jpeg,
    Gif,
}

impl SupportedFormat {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/avif" => Some(Self::Avif),
            "image/jpeg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "avif" => Some(Self::Avif),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Avif => "image/avif",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
        }
    }
}

/// True iff `mime` names one of the supported input formats.
pub fn is_supported(mime: &str) -> bool {
    SupportedFormat::from_mime(mime).is_some()
}

/// Declared MIME type for a path on disk, derived from its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(SupportedFormat::from_extension)
        .map(SupportedFormat::mime_type)
        .unwrap_or(UNKNOWN_MIME_TYPE)
}

/// Aggregate count of files dropped by a selection.
///
/// Reported once per selection rather than once per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedReport {
    pub rejected: usize,
    pub total: usize,
}

impl UnsupportedReport {
    /// User-facing message, or `None` when nothing was rejected.
    pub fn message(&self) -> Option<String> {
        if self.rejected == 0 {
            None
        } else if self.rejected == self.total {
            Some("Please select PNG, AVIF, JPEG, or GIF files only.".to_string())
        } else {
            Some(format!(
                "{} unsupported files were ignored. Only PNG, AVIF, JPEG, and GIF files are supported.",
                self.rejected
            ))
        }
    }
}

/// Split a selection into supported items and an aggregate rejection report.
///
/// `mime_of` extracts the declared MIME type from each item; input order is
/// preserved among accepted items.
pub fn partition_supported<T>(
    items: Vec<T>,
    mime_of: impl Fn(&T) -> &str,
) -> (Vec<T>, UnsupportedReport) {
    let total = items.len();
    let accepted: Vec<T> = items
        .into_iter()
        .filter(|item| is_supported(mime_of(item)))
        .collect();
    let report = UnsupportedReport {
        rejected: total - accepted.len(),
        total,
    };
    (accepted, report)
}
