//! Pure Rust decode and resize, libwebp for lossy WebP output.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, GIF first frame) | `image::load_from_memory_with_format` |
//! | Decode (AVIF) | `avif-parse` (container) + `rav1d` (AV1 decode) + YUV→RGBA |
//! | Render | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → WebP | `webp::Encoder::encode_simple` (lossy) |
//!
//! The `image` crate's `"avif"` feature only enables the **encoder** (rav1e);
//! decoding goes through `rav1d`, the pure Rust port of dav1d. Its `"webp"`
//! feature only writes lossless WebP, so quality-controlled output uses the
//! `webp` crate.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::Quality;
use crate::convert::InputFile;
use crate::formats::SupportedFormat;
use image::imageops::FilterType;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// Production backend.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Format from the declared MIME type, falling back to the filename extension.
fn input_format(input: &InputFile) -> Result<SupportedFormat, BackendError> {
    SupportedFormat::from_mime(&input.mime_type)
        .or_else(|| {
            input
                .name
                .rsplit_once('.')
                .and_then(|(_, ext)| SupportedFormat::from_extension(ext))
        })
        .ok_or_else(|| BackendError::UnsupportedFormat(input.mime_type.clone()))
}

fn decode_with_image(bytes: &[u8], format: ImageFormat) -> Result<RgbaImage, BackendError> {
    image::load_from_memory_with_format(bytes, format)
        .map(|img| img.to_rgba8())
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode: {e}")))
}

/// Decode AVIF bytes using avif-parse (container) + rav1d (AV1 decode).
///
/// Only the colour item is decoded; the result is opaque.
fn decode_avif(bytes: &[u8]) -> Result<RgbaImage, BackendError> {
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use std::ptr::NonNull;

    let avif = avif_parse::read_avif(&mut Cursor::new(bytes))
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to parse AVIF: {e:?}")))?;
    let av1_bytes: &[u8] = &avif.primary_item;

    let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
    unsafe {
        rav1d::src::lib::dav1d_default_settings(NonNull::from(&mut settings).cast::<Dav1dSettings>())
    };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc =
        unsafe { rav1d::src::lib::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "rav1d open failed ({})",
            rc.0
        )));
    }

    // The context is closed on every path once decoding is over.
    let decoded = (|| {
        use rav1d::include::dav1d::data::Dav1dData;
        use rav1d::include::dav1d::picture::Dav1dPicture;

        let mut data = Dav1dData::default();
        let buf_ptr =
            unsafe { rav1d::src::lib::dav1d_data_create(NonNull::new(&mut data), av1_bytes.len()) };
        if buf_ptr.is_null() {
            return Err(BackendError::ProcessingFailed(
                "rav1d data_create failed".into(),
            ));
        }
        unsafe { std::ptr::copy_nonoverlapping(av1_bytes.as_ptr(), buf_ptr, av1_bytes.len()) };

        let rc = unsafe { rav1d::src::lib::dav1d_send_data(ctx, NonNull::new(&mut data)) };
        if rc.0 != 0 {
            unsafe { rav1d::src::lib::dav1d_data_unref(NonNull::new(&mut data)) };
            return Err(BackendError::ProcessingFailed(format!(
                "rav1d send_data failed ({})",
                rc.0
            )));
        }

        let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
        let rc = unsafe { rav1d::src::lib::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
        if rc.0 != 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "rav1d get_picture failed ({})",
                rc.0
            )));
        }

        let rgba = picture_to_rgba(&pic);
        unsafe { rav1d::src::lib::dav1d_picture_unref(NonNull::new(&mut pic)) };
        rgba
    })();

    unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
    decoded
}

/// Convert a decoded rav1d picture into an RGBA raster.
fn picture_to_rgba(
    pic: &rav1d::include::dav1d::picture::Dav1dPicture,
) -> Result<RgbaImage, BackendError> {
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };

    let plane = |i: usize| {
        pic.data[i]
            .map(|p| p.as_ptr() as *const u8)
            .ok_or_else(|| BackendError::ProcessingFailed(format!("AVIF plane {i} missing")))
    };

    let width = pic.p.w as u32;
    let height = pic.p.h as u32;
    let layout = pic.p.layout;
    let y_ptr = plane(0)?;

    let planes = if layout == DAV1D_PIXEL_LAYOUT_I400 {
        YuvPlanes {
            y_ptr,
            u_ptr: y_ptr,
            v_ptr: y_ptr,
            y_stride: pic.stride[0],
            uv_stride: 0,
            width,
            height,
            bpc: pic.p.bpc as u32,
            ss_x: false,
            ss_y: false,
            monochrome: true,
        }
    } else {
        let (ss_x, ss_y) = match layout {
            DAV1D_PIXEL_LAYOUT_I420 => (true, true),
            DAV1D_PIXEL_LAYOUT_I422 => (true, false),
            DAV1D_PIXEL_LAYOUT_I444 => (false, false),
            _ => {
                return Err(BackendError::ProcessingFailed(format!(
                    "Unsupported AVIF pixel layout: {layout}"
                )));
            }
        };
        YuvPlanes {
            y_ptr,
            u_ptr: plane(1)?,
            v_ptr: plane(2)?,
            y_stride: pic.stride[0],
            uv_stride: pic.stride[1],
            width,
            height,
            bpc: pic.p.bpc as u32,
            ss_x,
            ss_y,
            monochrome: false,
        }
    };

    RgbaImage::from_raw(width, height, planes.to_rgba()).ok_or_else(|| {
        BackendError::ProcessingFailed("Failed to create image from decoded AVIF data".into())
    })
}

/// Decoded YUV plane data from rav1d, ready for RGB conversion.
struct YuvPlanes {
    y_ptr: *const u8,
    u_ptr: *const u8,
    v_ptr: *const u8,
    y_stride: isize,
    uv_stride: isize,
    width: u32,
    height: u32,
    bpc: u32,
    /// Chroma subsampling: horizontal, vertical (e.g. I420 = true, true)
    ss_x: bool,
    ss_y: bool,
    monochrome: bool,
}

impl YuvPlanes {
    /// Convert to interleaved opaque RGBA8 using BT.601 coefficients.
    fn to_rgba(&self) -> Vec<u8> {
        let max_val = ((1u32 << self.bpc) - 1) as f32;
        let center = (1u32 << (self.bpc - 1)) as f32;
        let scale = 255.0 / max_val;
        let to_u8 = |v: f32| (v * scale).clamp(0.0, 255.0) as u8;

        let mut out = Vec::with_capacity((self.width * self.height * 4) as usize);
        for row in 0..self.height {
            for col in 0..self.width {
                let y = read_sample(self.y_ptr, self.y_stride, col, row, self.bpc);

                let [r, g, b] = if self.monochrome {
                    [to_u8(y); 3]
                } else {
                    let (cx, cy) = (
                        if self.ss_x { col / 2 } else { col },
                        if self.ss_y { row / 2 } else { row },
                    );
                    let cb = read_sample(self.u_ptr, self.uv_stride, cx, cy, self.bpc) - center;
                    let cr = read_sample(self.v_ptr, self.uv_stride, cx, cy, self.bpc) - center;
                    [
                        to_u8(y + 1.402 * cr),
                        to_u8(y - 0.344136 * cb - 0.714136 * cr),
                        to_u8(y + 1.772 * cb),
                    ]
                };
                out.extend_from_slice(&[r, g, b, 255]);
            }
        }
        out
    }
}

/// Read one sample from a plane; more than 8 bits per channel are stored as u16.
#[inline]
fn read_sample(ptr: *const u8, stride: isize, x: u32, y: u32, bpc: u32) -> f32 {
    if bpc <= 8 {
        (unsafe { *ptr.offset(y as isize * stride + x as isize) }) as f32
    } else {
        let byte_offset = y as isize * stride + x as isize * 2;
        (unsafe { (ptr.offset(byte_offset) as *const u16).read_unaligned() }) as f32
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, input: &InputFile) -> Result<RgbaImage, BackendError> {
        match input_format(input)? {
            SupportedFormat::Avif => decode_avif(&input.bytes),
            SupportedFormat::Png => decode_with_image(&input.bytes, ImageFormat::Png),
            SupportedFormat::Jpeg => decode_with_image(&input.bytes, ImageFormat::Jpeg),
            SupportedFormat::Gif => decode_with_image(&input.bytes, ImageFormat::Gif),
        }
    }

    fn render(&self, image: &RgbaImage, target: Dimensions) -> RgbaImage {
        if Dimensions::of(image) == target {
            return image.clone();
        }
        image::imageops::resize(image, target.width, target.height, FilterType::Lanczos3)
    }

    fn encode_webp(&self, image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let encoder = webp::Encoder::from_rgba(image.as_raw(), image.width(), image.height());
        let encoded = encoder
            .encode_simple(false, quality.fraction() * 100.0)
            .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {e:?}")))?;
        Ok(encoded.to_vec())
    }
}
