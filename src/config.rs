//! Converter configuration module.
//!
//! Handles loading, validating, and merging `towebp.toml`. Stock defaults are
//! overridden by the user's file, and command-line flags override both.
//!
//! ## Config File Location
//!
//! `towebp.toml` is read from the current directory, or from the path given
//! with `--config`. Without a file the stock defaults apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [conversion]
//! quality = 80              # WebP quality (1-100)
//! exif = "strip"            # preserve | strip | sanitize
//!
//! [resize]
//! enabled = false
//! width = 1920
//! height = 1080
//! aspect_ratio = "preserve" # preserve | free | square
//!
//! [naming]
//! custom_name = ""
//! add_number = false
//! add_date = false
//! add_time = false
//!
//! [export]
//! out_dir = "converted"     # Directory for exported files
//! zip = false               # Bundle everything into one archive
//! stagger_ms = 0            # Pause between individual files
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! [conversion]
//! exif = "sanitize"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::exif::{ConversionSettings, ExifPolicy};
use crate::imaging::{AspectRatio, Quality, ResizeSettings};
use crate::naming::NamingSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "towebp.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter configuration loaded from `towebp.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub conversion: ConversionConfig,
    pub resize: ResizeSettings,
    pub naming: NamingSettings,
    pub export: ExportConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.conversion.quality) {
            return Err(ConfigError::Validation(
                "conversion.quality must be 1-100".into(),
            ));
        }
        if self.resize.enabled && (self.resize.width == 0 || self.resize.height == 0) {
            return Err(ConfigError::Validation(
                "resize.width and resize.height must be non-zero when resize is enabled".into(),
            ));
        }
        if self.resize.enabled
            && self.resize.aspect_ratio == AspectRatio::Square
            && self.resize.width != self.resize.height
        {
            return Err(ConfigError::Validation(
                "resize.width must equal resize.height for square aspect ratio".into(),
            ));
        }
        if self.export.out_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "export.out_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.conversion.quality)
    }

    pub fn conversion_settings(&self) -> ConversionSettings {
        ConversionSettings::new(self.conversion.exif)
    }
}

/// Encoding and EXIF settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    /// WebP quality, 1 (smallest) to 100 (best).
    pub quality: u32,
    pub exif: ExifPolicy,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
            exif: ExifPolicy::default(),
        }
    }
}

/// Where and how converted files are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub out_dir: String,
    pub zip: bool,
    /// Pause between individually exported files, in milliseconds.
    pub stagger_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_dir: "converted".to_string(),
            zip: false,
            stagger_ms: 0,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let config = merge_config(base, overlay)?;
    config.validate()?;
    Ok(config)
}

/// Merge and deserialize without validating.
///
/// For callers that adjust the result (command-line overrides) and validate
/// once afterwards.
pub fn merge_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    Ok(config)
}

/// Load `towebp.toml` from the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILE_NAME))
}

/// Like [`load_config`], for an explicit file path.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = read_config_file(path)?;
    config.validate()?;
    Ok(config)
}

/// Like [`load_config_file`], but leaves validation to the caller.
///
/// Unknown keys and malformed TOML are still rejected.
pub fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_some() {
        tracing::debug!(path = %path.display(), "loaded config");
    }
    merge_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `towebp.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# towebp Configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the directory you run towebp from, or pass it with
# --config. Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[conversion]
# WebP quality (1 = smallest files, 100 = best quality).
quality = 80

# What happens to camera EXIF data:
#   "strip"    - drop it entirely
#   "preserve" - keep the WebP-compatible subset (camera, exposure, date)
#   "sanitize" - like preserve, minus GPS location and capture timestamps
exif = "strip"

# ---------------------------------------------------------------------------
# Resize
# ---------------------------------------------------------------------------
[resize]
enabled = false
width = 1920
height = 1080

# "preserve" fits inside width x height keeping proportions,
# "free" stretches to exactly width x height,
# "square" needs width == height.
aspect_ratio = "preserve"

# ---------------------------------------------------------------------------
# Output file names
# ---------------------------------------------------------------------------
[naming]
# Replaces the original file name when non-empty.
custom_name = ""
# Suffixes, appended in this order and joined with "_".
add_number = false   # 1-based position in the batch
add_date = false     # YYYY-MM-DD
add_time = false     # HH-MM-SS

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
out_dir = "converted"
# Bundle every converted file into converted-webp-images-<timestamp>.zip.
zip = false
# Pause between individually written files, in milliseconds.
stagger_ms = 0
"##
}
