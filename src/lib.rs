//! # towebp
//!
//! Converts PNG, AVIF, JPEG and GIF images to WebP, with optional resizing,
//! EXIF filtering, metadata stamping and renaming. Everything runs locally and
//! one file at a time.
//!
//! # Architecture: Select → Convert → Export
//!
//! ```text
//! 1. Select    paths / bytes   →  Session        (filter, EXIF, auto metadata, preview)
//! 2. Convert   Session         →  ConvertedImage (decode, resize, encode, policies)
//! 3. Export    ConvertedImage  →  ExportSink     (single files or one ZIP archive)
//! ```
//!
//! Each stage is usable on its own. Pixel work sits behind the
//! [`imaging::ImageBackend`] trait and EXIF parsing behind
//! [`imaging::ExifReader`], so every policy above them is testable without
//! encoding real images.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`formats`] | Supported input types and the "unsupported files" report |
//! | [`exif`] | EXIF summary, GPS detection, sanitizing, WebP projection, [`exif::ExifPolicy`] |
//! | [`metadata`] | User/filename metadata merge, cleaning, validation |
//! | [`imaging`] | Backend trait, resize planning, AVIF/PNG/JPEG/GIF decode, WebP encode |
//! | [`convert`] | One selected file → one [`convert::ConvertedImage`] |
//! | [`batch`] | Sequential driver with progress, failure isolation, cancellation |
//! | [`naming`] | Output filename composition |
//! | [`session`] | Selected files and results; input collection from disk |
//! | [`preview`] | Scoped preview handles released on drop |
//! | [`export`] | Single, multiple and ZIP export through an [`export::ExportSink`] |
//! | [`store`] | Saved user metadata in the per-user config directory |
//! | [`config`] | `towebp.toml` loading, validation, merging |
//! | [`output`] | CLI output formatting and the JSON report |
//!
//! # Design Decisions
//!
//! ## Sequential Batches
//!
//! A batch converts one file after another. Progress is reported in input
//! order, a failure skips only its own file, and a cancelled batch stops
//! before the next file starts.
//!
//! ## Pure-Rust Decoding, libwebp Encoding
//!
//! PNG, JPEG and GIF decode through the `image` crate; AVIF goes through
//! `avif-parse` and `rav1d`, so no system codec libraries are needed to read
//! inputs. The `image` crate only writes lossless WebP, so lossy encoding at a
//! quality setting uses the `webp` crate (bundled libwebp).
//!
//! ## EXIF Is Filtered, Never Re-embedded
//!
//! The WebP output never carries binary EXIF. The chosen
//! [`exif::ExifPolicy`] decides which fields are kept on the
//! [`convert::ConvertedImage`] record, where they are reported (CLI, JSON
//! report) but not written into the file. Orientation is carried as a field
//! only; pixels are never rotated.

pub mod batch;
pub mod config;
pub mod convert;
pub mod exif;
pub mod export;
pub mod formats;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod preview;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
