//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: decode, render and encode_webp. Everything else in the conversion
//! pipeline (planning, ratios, EXIF, metadata) is pure and lives outside.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::Quality;
use crate::convert::InputFile;
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Width and height of a raster, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Trait for image processing backends.
///
/// Rasters are owned [`RgbaImage`] values; the converter drops them as soon
/// as the encoded bytes exist.
pub trait ImageBackend: Sync {
    /// Decode the input bytes into a raster at natural size.
    fn decode(&self, input: &InputFile) -> Result<RgbaImage, BackendError>;

    /// Draw `image` onto a raster of exactly `target` size.
    fn render(&self, image: &RgbaImage, target: Dimensions) -> RgbaImage;

    /// Lossy WebP encode at `quality`.
    fn encode_webp(&self, image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError>;
}
