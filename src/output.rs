//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Convert
//!
//! ```text
//! [1/3] sunset.png
//! [2/3] broken.jpg
//! [3/3] beach.avif
//!
//! 001 sunset.png → sunset.webp
//!     2.4 MB → 312.5 KB (87.29% smaller)
//!     1920x1080, quality 80
//!     EXIF: preserved
//! 002 beach.avif → beach.webp
//!     180 KB → 201.33 KB (11.85% larger)
//!     800x600, quality 80
//!
//! Skipped
//!     broken.jpg: Failed to decode broken.jpg: ...
//!
//! Converted 2 of 3 images
//! ```
//!
//! ## EXIF
//!
//! ```text
//! photo.jpg
//!     Camera Make: Canon
//!     Aperture: f/2.8
//!     Contains location data (GPS)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects. The JSON report written by
//! `convert --report` is built here too.

use crate::batch::{BatchProgress, SkippedItem};
use crate::convert::ConvertedImage;
use crate::exif::{ExifData, has_sensitive_data, readable_summary};
use crate::metadata::ImageMetadata;
use serde::Serialize;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count in base-1024 units with at most two decimals.
///
/// ```text
/// 0       → 0 Bytes
/// 1536    → 1.5 KB
/// 1048576 → 1 MB
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", trim_decimals(value), UNITS[unit])
}

/// Two decimals, trailing zeros (and a bare point) removed.
fn trim_decimals(value: f64) -> String {
    let fixed = format!("{value:.2}");
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// `87.29% smaller`, `11.85% larger`, or `same size`.
pub fn format_ratio(ratio: f64) -> String {
    if ratio > 0.0 {
        format!("{}% smaller", trim_decimals(ratio))
    } else if ratio < 0.0 {
        format!("{}% larger", trim_decimals(-ratio))
    } else {
        "same size".to_string()
    }
}

// ============================================================================
// Convert
// ============================================================================

/// One progress line per processed file.
pub fn format_progress(progress: BatchProgress, name: &str) -> String {
    format!("[{}/{}] {}", progress.completed, progress.total, name)
}

/// Summary of a conversion run: one entry per result, then skipped files.
///
/// `names` holds the export name of each image, in the same order.
pub fn format_convert_output(
    images: &[ConvertedImage],
    names: &[String],
    skipped: &[SkippedItem],
    cancelled: bool,
) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, (image, name)) in images.iter().zip(names).enumerate() {
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            image.original.name,
            name
        ));
        lines.push(format!(
            "{}{} \u{2192} {} ({})",
            indent(1),
            format_size(image.original_size),
            format_size(image.output_size),
            format_ratio(image.compression_ratio)
        ));
        lines.push(format!(
            "{}{}x{}, quality {}",
            indent(1),
            image.width,
            image.height,
            image.quality.value()
        ));
        if image.exif_preserved {
            lines.push(format!("{}EXIF: preserved", indent(1)));
        }
    }

    if !skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for item in skipped {
            lines.push(format!("{}{}: {}", indent(1), item.name, item.reason));
        }
    }

    let total = images.len() + skipped.len();
    lines.push(String::new());
    if cancelled {
        lines.push(format!(
            "Cancelled after {} of {} images",
            images.len(),
            total
        ));
    } else {
        lines.push(format!("Converted {} of {} images", images.len(), total));
    }
    lines
}

pub fn print_convert_output(
    images: &[ConvertedImage],
    names: &[String],
    skipped: &[SkippedItem],
    cancelled: bool,
) {
    for line in format_convert_output(images, names, skipped, cancelled) {
        println!("{}", line);
    }
}

// ============================================================================
// EXIF
// ============================================================================

/// Readable EXIF summary for one file, with a privacy note when GPS data is present.
pub fn format_exif_output(name: &str, exif: Option<&ExifData>) -> Vec<String> {
    let mut lines = vec![name.to_string()];
    let Some(exif) = exif else {
        lines.push(format!("{}No EXIF data found", indent(1)));
        return lines;
    };

    let summary = readable_summary(exif);
    if summary.is_empty() {
        lines.push(format!("{}No readable EXIF fields", indent(1)));
    }
    for (label, value) in summary {
        lines.push(format!("{}{}: {}", indent(1), label, value));
    }
    if has_sensitive_data(exif) {
        lines.push(format!("{}Contains location data (GPS)", indent(1)));
    }
    lines
}

pub fn print_exif_output(name: &str, exif: Option<&ExifData>) {
    for line in format_exif_output(name, exif) {
        println!("{}", line);
    }
}

// ============================================================================
// Metadata
// ============================================================================

pub fn format_metadata(metadata: &ImageMetadata) -> Vec<String> {
    if metadata.is_empty() {
        return vec!["No metadata".to_string()];
    }
    let mut lines = Vec::new();
    let scalars = [
        ("Author", &metadata.author),
        ("Title", &metadata.title),
        ("Description", &metadata.description),
        ("Copyright", &metadata.copyright),
    ];
    for (label, value) in scalars {
        if let Some(value) = value {
            lines.push(format!("{}: {}", label, value));
        }
    }
    if !metadata.keywords.is_empty() {
        lines.push(format!("Keywords: {}", metadata.keywords.join(", ")));
    }
    lines
}

pub fn print_metadata(metadata: &ImageMetadata) {
    for line in format_metadata(metadata) {
        println!("{}", line);
    }
}

// ============================================================================
// JSON report
// ============================================================================

/// Machine-readable summary of a conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub images: Vec<ReportEntry>,
    pub skipped: Vec<ReportSkipped>,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub original: String,
    pub output: String,
    pub original_size: u64,
    pub output_size: u64,
    pub compression_ratio: f64,
    pub quality: u32,
    pub width: u32,
    pub height: u32,
    pub metadata: ImageMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif: Option<ExifData>,
    pub exif_preserved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSkipped {
    pub name: String,
    pub reason: String,
}

pub fn build_report(
    images: &[ConvertedImage],
    names: &[String],
    skipped: &[SkippedItem],
    cancelled: bool,
) -> ConversionReport {
    ConversionReport {
        images: images
            .iter()
            .zip(names)
            .map(|(image, name)| ReportEntry {
                original: image.original.name.clone(),
                output: name.clone(),
                original_size: image.original_size,
                output_size: image.output_size,
                compression_ratio: image.compression_ratio,
                quality: image.quality.value(),
                width: image.width,
                height: image.height,
                metadata: image.metadata.clone(),
                exif: image.exif.clone(),
                exif_preserved: image.exif_preserved,
            })
            .collect(),
        skipped: skipped
            .iter()
            .map(|s| ReportSkipped {
                name: s.name.clone(),
                reason: s.reason.clone(),
            })
            .collect(),
        cancelled,
    }
}
