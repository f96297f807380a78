//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`Converter`](crate::convert::Converter) (which
//! decides what raster to produce) and the [`backend`](super::backend) (which
//! does the actual pixel work).
//!
//! ## Types
//!
//! - [`Quality`] — Lossy WebP quality (1–100, default 80). Clamped on construction.
//! - [`AspectRatio`] — How a resize target box is interpreted.
//! - [`ResizeSettings`] — Resize toggle plus target box and aspect policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Encoder-facing quality in `0.01..=1.0`.
    pub fn fraction(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

/// Aspect policy for a resize target box.
///
/// - `Preserve`: fit inside the box, keeping the source proportions.
/// - `Free`: stretch to exactly the box.
/// - `Square`: exactly the box, which must itself be square.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    #[default]
    Preserve,
    Free,
    Square,
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preserve" => Ok(Self::Preserve),
            "free" => Ok(Self::Free),
            "square" => Ok(Self::Square),
            other => Err(format!(
                "unknown aspect ratio '{other}' (expected preserve, free or square)"
            )),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Preserve => "preserve",
            Self::Free => "free",
            Self::Square => "square",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeSettings {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: AspectRatio,
}

impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 1920,
            height: 1080,
            aspect_ratio: AspectRatio::Preserve,
        }
    }
}

impl ResizeSettings {
    /// Enabled settings for a `WxH` box.
    pub fn to_box(width: u32, height: u32, aspect_ratio: AspectRatio) -> Self {
        Self {
            enabled: true,
            width,
            height,
            aspect_ratio,
        }
    }
}

/// Parse a `WIDTHxHEIGHT` target such as `1920x1080`.
pub fn parse_box(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid dimension '{v}' in '{s}'"))
    };
    Ok((parse(w)?, parse(h)?))
}
