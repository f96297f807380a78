//! The conversion engine: one selected file in, one WebP result out.
//!
//! ## Pipeline
//!
//! ```text
//! bytes ──decode──▶ raster ──plan──▶ Dimensions ──render──▶ raster' ──encode──▶ WebP bytes
//!                                                                                  │
//!           EXIF policy ◀── original EXIF          metadata merge ◀── filename ────┤
//!                                                                                  ▼
//!                                                                           ConvertedImage
//! ```
//!
//! Pixel work goes through an [`ImageBackend`]; everything else is pure.
//! Rasters are owned locals and are dropped before [`Converter::convert`]
//! returns, so repeated conversions in a batch never accumulate them.

use crate::exif::{ConversionSettings, ExifData};
use crate::formats::mime_for_path;
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, PlanError, Quality, ResizeSettings, plan_dimensions,
};
use crate::metadata::{ImageMetadata, auto_metadata, clean, merge};
use crate::preview::PreviewHandle;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to decode {name}: {source}")]
    Decode { name: String, source: BackendError },
    #[error("Cannot plan output size for {name}: {source}")]
    Plan { name: String, source: PlanError },
    #[error("Failed to encode {name} as WebP: {reason}")]
    Encode { name: String, reason: String },
}

/// A raw input file as selected by the user. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    /// Declared MIME type, as reported by the selection source.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its MIME type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, mime_for_path(path), bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// An accepted input plus everything derived from it at selection time.
#[derive(Debug)]
pub struct SelectedFile {
    pub id: Uuid,
    pub file: Arc<InputFile>,
    pub preview: Option<PreviewHandle>,
    pub exif: Option<ExifData>,
    pub auto_metadata: Option<ImageMetadata>,
}

impl SelectedFile {
    /// Selection with a fresh identifier and nothing derived yet.
    pub fn new(file: InputFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            file: Arc::new(file),
            preview: None,
            exif: None,
            auto_metadata: None,
        }
    }
}

/// Result of one successful conversion. Immutable once created.
#[derive(Debug, Clone)]
pub struct ConvertedImage {
    /// Identifier of the [`SelectedFile`] this came from.
    pub id: Uuid,
    pub original: Arc<InputFile>,
    pub original_size: u64,
    pub webp: Vec<u8>,
    pub output_size: u64,
    pub width: u32,
    pub height: u32,
    /// Percentage saved relative to the original; negative when the output grew.
    pub compression_ratio: f64,
    pub quality: Quality,
    pub metadata: ImageMetadata,
    pub exif: Option<ExifData>,
    pub exif_preserved: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub quality: Quality,
    pub resize: Option<ResizeSettings>,
    pub metadata: Option<ImageMetadata>,
    pub settings: Option<ConversionSettings>,
}

/// `(original - output) / original * 100`, or 0 for an empty original.
pub fn compression_ratio(original_size: u64, output_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    (original_size as f64 - output_size as f64) / original_size as f64 * 100.0
}

/// Runs the conversion pipeline against a backend.
pub struct Converter<'a> {
    backend: &'a dyn ImageBackend,
}

impl<'a> Converter<'a> {
    pub fn new(backend: &'a dyn ImageBackend) -> Self {
        Self { backend }
    }

    pub fn convert(
        &self,
        selected: &SelectedFile,
        options: &ConvertOptions,
    ) -> Result<ConvertedImage, ConvertError> {
        let input = &selected.file;
        let name = || input.name.clone();

        let (webp, target) = {
            let decoded = self
                .backend
                .decode(input)
                .map_err(|source| ConvertError::Decode { name: name(), source })?;

            let target = match &options.resize {
                Some(resize) => plan_dimensions(Dimensions::of(&decoded), resize)
                    .map_err(|source| ConvertError::Plan { name: name(), source })?,
                None => Dimensions::of(&decoded),
            };

            let rendered = self.backend.render(&decoded, target);
            drop(decoded);

            let webp = self
                .backend
                .encode_webp(&rendered, options.quality)
                .map_err(|e| ConvertError::Encode {
                    name: name(),
                    reason: e.to_string(),
                })?;
            (webp, target)
        };

        if webp.is_empty() {
            return Err(ConvertError::Encode {
                name: name(),
                reason: "encoder produced no data".to_string(),
            });
        }

        let original_size = input.size();
        let output_size = webp.len() as u64;

        let policy = options.settings.unwrap_or_default().exif;
        let exif = policy.apply(selected.exif.as_ref());

        let auto = selected
            .auto_metadata
            .clone()
            .unwrap_or_else(|| auto_metadata(&input.name));
        let user = options.metadata.clone().unwrap_or_default();

        Ok(ConvertedImage {
            id: selected.id,
            original: Arc::clone(input),
            original_size,
            webp,
            output_size,
            width: target.width,
            height: target.height,
            compression_ratio: compression_ratio(original_size, output_size),
            quality: options.quality,
            metadata: clean(&merge(&user, &auto)),
            exif_preserved: exif.is_some(),
            exif,
        })
    }
}
