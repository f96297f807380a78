//! Shared test utilities for the towebp test suite.
//!
//! Provides in-memory image fixtures for every supported input format, a JPEG
//! with a small hand-built EXIF block, and ready-made [`ConvertedImage`]
//! values for tests that only care about naming, export or output.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let png = create_test_png_bytes(40, 30);
//! let tagged = jpeg_with_exif(&create_test_jpeg_bytes(8, 8));
//! let image = converted_image("sunset.png", 1000, 250);
//! ```

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use uuid::Uuid;

use crate::convert::{ConvertedImage, InputFile, compression_ratio};
use crate::imaging::Quality;
use crate::metadata::auto_metadata;

// =========================================================================
// Encoded fixtures
// =========================================================================

fn gradient_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    })
}

fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn create_test_png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgba8(gradient_rgba(width, height)),
        ImageFormat::Png,
    )
}

pub fn create_test_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(gradient_rgb(width, height)),
        ImageFormat::Jpeg,
    )
}

pub fn create_test_gif_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgba8(gradient_rgba(width, height)),
        ImageFormat::Gif,
    )
}

/// Encode with ravif/rav1e at speed 6.
pub fn create_test_avif_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut buf, 6, 85);
    DynamicImage::ImageRgb8(gradient_rgb(width, height))
        .write_with_encoder(encoder)
        .unwrap();
    buf
}

// =========================================================================
// EXIF fixture
// =========================================================================

/// Little-endian TIFF block with `Make`, `Model`, `FNumber` and ISO.
///
/// ```text
///  0  II*\0, IFD0 at 8
///  8  IFD0: Make → 50, Model → 56, ExifIFDPointer = 64
/// 50  "Canon\0"  56 "EOS R5\0"  63 pad
/// 64  Exif IFD: FNumber → 94, PhotographicSensitivity = 400
/// 94  28/10
/// ```
fn exif_tiff() -> Vec<u8> {
    fn entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }
    const ASCII: u16 = 2;
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    const RATIONAL: u16 = 5;

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II*\0");
    tiff.extend_from_slice(&8u32.to_le_bytes());

    tiff.extend_from_slice(&3u16.to_le_bytes());
    entry(&mut tiff, 0x010F, ASCII, 6, 50);
    entry(&mut tiff, 0x0110, ASCII, 7, 56);
    entry(&mut tiff, 0x8769, LONG, 1, 64);
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(b"Canon\0");
    tiff.extend_from_slice(b"EOS R5\0");
    tiff.push(0);
    assert_eq!(tiff.len(), 64);

    tiff.extend_from_slice(&2u16.to_le_bytes());
    entry(&mut tiff, 0x829D, RATIONAL, 1, 94);
    entry(&mut tiff, 0x8827, SHORT, 1, 400);
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(&28u32.to_le_bytes());
    tiff.extend_from_slice(&10u32.to_le_bytes());
    tiff
}

/// Insert an APP1 EXIF segment right after the JPEG SOI marker.
pub fn jpeg_with_exif(jpeg: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");
    let tiff = exif_tiff();
    let segment_len = (2 + 6 + tiff.len()) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

// =========================================================================
// Conversion results
// =========================================================================

/// A 640x480 result at default quality with no EXIF and filename metadata.
pub fn converted_image(name: &str, original_size: u64, output_size: u64) -> ConvertedImage {
    let original = Arc::new(InputFile::new(
        name,
        "image/png",
        vec![0; original_size as usize],
    ));
    ConvertedImage {
        id: Uuid::new_v4(),
        original,
        original_size,
        webp: (0..output_size).map(|i| (i % 251) as u8).collect(),
        output_size,
        width: 640,
        height: 480,
        compression_ratio: compression_ratio(original_size, output_size),
        quality: Quality::default(),
        metadata: auto_metadata(name),
        exif: None,
        exif_preserved: false,
    }
}
