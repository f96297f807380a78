//! Descriptive metadata: user input, filename-derived defaults, merging.
//!
//! Each converted image carries an [`ImageMetadata`] record resolved from two
//! sources:
//!
//! - **User metadata**: whatever was typed on the command line or loaded from
//!   the [`MetadataStore`](crate::store::MetadataStore). Applies to every image
//!   in a batch.
//! - **Auto metadata**: derived from the original filename by
//!   [`auto_metadata`]. `my-beach_trip.png` becomes title "My Beach Trip",
//!   description "Image file: my-beach_trip", keywords `[my, beach, trip]`.
//!
//! ## Resolution priority
//!
//! Scalar fields are resolved independently, first non-empty value wins:
//! user → auto → None. Keywords are the union of auto keywords followed by user
//! keywords, with exact duplicates removed and first-occurrence order kept.
//!
//! After merging, [`clean`] trims every field and drops anything left empty,
//! so a resolved record never stores `""`.

use crate::formats::SUPPORTED_EXTENSIONS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_AUTHOR_LEN: usize = 100;
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_KEYWORDS: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl ImageMetadata {
    pub fn is_empty(&self) -> bool {
        self.author.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.copyright.is_none()
            && self.keywords.is_empty()
    }
}

/// Validation failures for user-entered metadata.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataIssue {
    #[error("Author name is too long (max {MAX_AUTHOR_LEN} characters)")]
    AuthorTooLong,
    #[error("Title is too long (max {MAX_TITLE_LEN} characters)")]
    TitleTooLong,
    #[error("Description is too long (max {MAX_DESCRIPTION_LEN} characters)")]
    DescriptionTooLong,
    #[error("Too many keywords (max {MAX_KEYWORDS})")]
    TooManyKeywords,
}

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value, trimmed.
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Merge user metadata over auto metadata. User scalars win; keywords are unioned.
pub fn merge(user: &ImageMetadata, auto: &ImageMetadata) -> ImageMetadata {
    let mut keywords: Vec<String> = Vec::new();
    for keyword in auto.keywords.iter().chain(&user.keywords) {
        if !keywords.contains(keyword) {
            keywords.push(keyword.clone());
        }
    }

    ImageMetadata {
        author: resolve(&[user.author.as_deref(), auto.author.as_deref()]),
        title: resolve(&[user.title.as_deref(), auto.title.as_deref()]),
        description: resolve(&[user.description.as_deref(), auto.description.as_deref()]),
        copyright: resolve(&[user.copyright.as_deref(), auto.copyright.as_deref()]),
        keywords,
    }
}

/// Trim every field and drop the ones that end up empty.
pub fn clean(metadata: &ImageMetadata) -> ImageMetadata {
    let trimmed = |v: &Option<String>| resolve(&[v.as_deref()]);
    ImageMetadata {
        author: trimmed(&metadata.author),
        title: trimmed(&metadata.title),
        description: trimmed(&metadata.description),
        copyright: trimmed(&metadata.copyright),
        keywords: metadata
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect(),
    }
}

/// Check user metadata against the field limits.
pub fn validate(metadata: &ImageMetadata) -> Vec<MetadataIssue> {
    let too_long = |v: &Option<String>, max: usize| {
        v.as_deref().is_some_and(|s| s.chars().count() > max)
    };

    let mut issues = Vec::new();
    if too_long(&metadata.author, MAX_AUTHOR_LEN) {
        issues.push(MetadataIssue::AuthorTooLong);
    }
    if too_long(&metadata.title, MAX_TITLE_LEN) {
        issues.push(MetadataIssue::TitleTooLong);
    }
    if too_long(&metadata.description, MAX_DESCRIPTION_LEN) {
        issues.push(MetadataIssue::DescriptionTooLong);
    }
    if metadata.keywords.len() > MAX_KEYWORDS {
        issues.push(MetadataIssue::TooManyKeywords);
    }
    issues
}

/// Filename without a trailing image extension (case-insensitive).
///
/// Names with any other extension are returned unchanged.
pub fn strip_image_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if SUPPORTED_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)) => stem,
        _ => filename,
    }
}

/// Capitalize the first character of every word, leaving the rest untouched.
fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_word = false;
    for c in text.chars() {
        let is_word = c.is_alphanumeric() || c == '_';
        if is_word && !prev_is_word {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        prev_is_word = is_word;
    }
    out
}

/// Derive default metadata from an original filename.
pub fn auto_metadata(filename: &str) -> ImageMetadata {
    let stem = strip_image_extension(filename);

    ImageMetadata {
        title: Some(capitalize_words(&stem.replace(['-', '_'], " "))),
        description: Some(format!("Image file: {stem}")),
        keywords: stem
            .to_lowercase()
            .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        ..Default::default()
    }
}
