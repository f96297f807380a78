//! Image processing: decode, plan, render, encode, read EXIF.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image` (PNG, JPEG, GIF), `avif-parse` + `rav1d` (AVIF) |
//! | **Plan** | [`plan_dimensions`] (pure) |
//! | **Render** | Lanczos3 via `image::imageops::resize` |
//! | **Encode → WebP** | `webp` (lossy, quality-controlled) |
//! | **EXIF** | `kamadak-exif` via [`KamadakReader`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Quality and resize settings
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **EXIF reader**: [`ExifReader`] trait + [`KamadakReader`]

pub mod backend;
mod calculations;
mod exif_reader;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{PlanError, plan_dimensions};
pub use exif_reader::{ExifReadError, ExifReader, KamadakReader};
pub use params::{AspectRatio, Quality, ResizeSettings, parse_box};
pub use rust_backend::RustBackend;
