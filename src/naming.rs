//! Output filename composition.
//!
//! Every converted image is exported under a name built from its original
//! filename and the user's [`NamingSettings`]:
//!
//! 1. **Base**: original name with its image extension swapped for `.webp`
//!    (`IMG_001.png` → `IMG_001.webp`), or `<custom>.webp` when a non-blank
//!    custom name is set.
//! 2. **Suffixes**, in fixed order and joined with `_`:
//!    number (1-based batch position), date (`YYYY-MM-DD`), time (`HH-MM-SS`).
//!
//! | Settings | Result for `IMG_001.png`, index 2 |
//! |---|---|
//! | none | `IMG_001.webp` |
//! | custom `trip`, number | `trip_3.webp` |
//! | number, date | `IMG_001_3_2024-06-01.webp` |
//!
//! Date and time come from a [`Clock`], so tests pin them with a fixed one.

use crate::convert::ConvertedImage;
use crate::metadata::strip_image_extension;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const OUTPUT_EXTENSION: &str = ".webp";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingSettings {
    pub custom_name: String,
    pub add_number: bool,
    pub add_date: bool,
    pub add_time: bool,
}

/// Source of the wall-clock time used for date/time suffixes.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// Local wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// `photo.JPG` → `photo.webp`; names without an image extension get `.webp` appended.
pub fn replace_extension(filename: &str) -> String {
    format!("{}{OUTPUT_EXTENSION}", strip_image_extension(filename))
}

/// Output filename for `image` using the system clock.
pub fn generate_file_name(
    image: &ConvertedImage,
    settings: Option<&NamingSettings>,
    index: Option<usize>,
) -> String {
    generate_file_name_at(image, settings, index, &SystemClock)
}

/// Output filename for `image`, reading date/time from `clock`.
pub fn generate_file_name_at(
    image: &ConvertedImage,
    settings: Option<&NamingSettings>,
    index: Option<usize>,
    clock: &dyn Clock,
) -> String {
    compose_name(&image.original.name, settings, index, clock)
}

fn compose_name(
    original_name: &str,
    settings: Option<&NamingSettings>,
    index: Option<usize>,
    clock: &dyn Clock,
) -> String {
    let Some(settings) = settings else {
        return replace_extension(original_name);
    };

    let custom = settings.custom_name.trim();
    let stem = if custom.is_empty() {
        strip_image_extension(original_name).to_string()
    } else {
        // A custom name never introduces directories.
        custom.replace(['/', '\\'], "_")
    };

    let mut parts = vec![stem];
    if let (true, Some(i)) = (settings.add_number, index) {
        parts.push((i + 1).to_string());
    }
    if settings.add_date || settings.add_time {
        let now = clock.now();
        if settings.add_date {
            parts.push(now.format("%Y-%m-%d").to_string());
        }
        if settings.add_time {
            parts.push(now.format("%H-%M-%S").to_string());
        }
    }

    format!("{}{OUTPUT_EXTENSION}", parts.join("_"))
}
