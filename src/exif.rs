//! EXIF policy: summaries, privacy detection, sanitizing, WebP projection.
//!
//! The core never parses EXIF itself. A reader implementing
//! [`ExifReader`](crate::imaging::ExifReader) turns raw file bytes into a flat
//! [`ExifData`] map (tag name → value) and everything here only filters or
//! formats that map. Tag names follow the common flat convention (`Make`,
//! `FNumber`, `ISOSpeedRatings`, `GPSLatitude`, ...).
//!
//! ## Field sets
//!
//! | Set | Used by |
//! |---|---|
//! | [`SENSITIVE_FIELDS`] | [`has_sensitive_data`] |
//! | [`GPS_FIELDS`] + any `GPS*` tag, [`TIMESTAMP_FIELDS`] | [`sanitize`] |
//! | [`WEBP_COMPATIBLE_FIELDS`] | [`to_webp_compatible`] |

use crate::imaging::ExifReader;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single EXIF value as produced by the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExifValue {
    Number(f64),
    Text(String),
    List(Vec<ExifValue>),
}

impl ExifValue {
    /// Numeric view: numbers as-is, lists by their first element, numeric text parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::List(items) => items.first().and_then(Self::as_f64),
        }
    }

    /// Whether the value carries information (zero, NaN and empty text do not).
    fn is_meaningful(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
            Self::List(_) => true,
        }
    }
}

impl fmt::Display for ExifValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<f64> for ExifValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for ExifValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Flat tag-name → value map.
pub type ExifData = BTreeMap<String, ExifValue>;

/// Ordered `(label, value)` pairs for display.
pub type ExifSummary = Vec<(&'static str, String)>;

pub const SENSITIVE_FIELDS: &[&str] = &[
    "GPSLatitude",
    "GPSLongitude",
    "GPSAltitude",
    "GPSTimeStamp",
    "GPSDateStamp",
];

pub const GPS_FIELDS: &[&str] = &[
    "GPSLatitude",
    "GPSLongitude",
    "GPSAltitude",
    "GPSTimeStamp",
    "GPSDateStamp",
    "GPSLatitudeRef",
    "GPSLongitudeRef",
    "GPSAltitudeRef",
    "GPSMapDatum",
    "GPSProcessingMethod",
    "GPSAreaInformation",
];

pub const TIMESTAMP_FIELDS: &[&str] = &["DateTime", "DateTimeOriginal", "DateTimeDigitized"];

pub const WEBP_COMPATIBLE_FIELDS: &[&str] = &[
    "Make",
    "Model",
    "Software",
    "DateTime",
    "FNumber",
    "ExposureTime",
    "ISOSpeedRatings",
    "FocalLength",
    "PixelXDimension",
    "PixelYDimension",
    "Orientation",
];

fn field<'a>(exif: &'a ExifData, name: &str) -> Option<&'a ExifValue> {
    exif.get(name).filter(|v| v.is_meaningful())
}

fn format_shutter(value: &ExifValue) -> String {
    match value.as_f64() {
        Some(t) if t < 1.0 => format!("1/{}s", (1.0 / t).round()),
        Some(t) => format!("{t}s"),
        None => format!("{value}s"),
    }
}

/// Curated, human-readable subset of the map. Absent fields are omitted.
pub fn readable_summary(exif: &ExifData) -> ExifSummary {
    let mut summary = ExifSummary::new();

    if let Some(v) = field(exif, "Make") {
        summary.push(("Camera Make", v.to_string()));
    }
    if let Some(v) = field(exif, "Model") {
        summary.push(("Camera Model", v.to_string()));
    }
    if let Some(v) = field(exif, "FNumber") {
        summary.push(("Aperture", format!("f/{v}")));
    }
    if let Some(v) = field(exif, "ExposureTime") {
        summary.push(("Shutter Speed", format_shutter(v)));
    }
    if let Some(v) = field(exif, "ISOSpeedRatings") {
        summary.push(("ISO", v.to_string()));
    }
    if let Some(v) = field(exif, "FocalLength") {
        summary.push(("Focal Length", format!("{v}mm")));
    }
    if let Some(v) = field(exif, "PixelXDimension") {
        summary.push(("Width", format!("{v}px")));
    }
    if let Some(v) = field(exif, "PixelYDimension") {
        summary.push(("Height", format!("{v}px")));
    }
    if let Some(v) = field(exif, "DateTime") {
        summary.push(("Date Taken", v.to_string()));
    }
    if let Some(v) = field(exif, "DateTimeOriginal") {
        summary.push(("Original Date", v.to_string()));
    }
    if let (Some(lat), Some(lon)) = (field(exif, "GPSLatitude"), field(exif, "GPSLongitude")) {
        summary.push(("GPS Coordinates", format!("{lat}, {lon}")));
    }
    if let Some(v) = field(exif, "Software") {
        summary.push(("Software", v.to_string()));
    }

    summary
}

/// True iff any location field is present.
pub fn has_sensitive_data(exif: &ExifData) -> bool {
    SENSITIVE_FIELDS.iter().any(|f| exif.contains_key(*f))
}

/// Copy without GPS and capture-timestamp fields. Everything else is kept.
pub fn sanitize(exif: &ExifData) -> ExifData {
    exif.iter()
        .filter(|(tag, _)| {
            !tag.starts_with("GPS")
                && !GPS_FIELDS.contains(&tag.as_str())
                && !TIMESTAMP_FIELDS.contains(&tag.as_str())
        })
        .map(|(tag, value)| (tag.clone(), value.clone()))
        .collect()
}

/// Project onto the fields worth carrying alongside a WebP output.
pub fn to_webp_compatible(exif: &ExifData) -> ExifData {
    WEBP_COMPATIBLE_FIELDS
        .iter()
        .filter_map(|f| exif.get(*f).map(|v| (f.to_string(), v.clone())))
        .collect()
}

/// What happens to source EXIF when an image is converted.
///
/// Exactly one policy is active at a time. The `set_*` toggles on
/// [`ConversionSettings`] switch between them without ever enabling two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExifPolicy {
    Preserve,
    #[default]
    Strip,
    Sanitize,
}

impl ExifPolicy {
    /// EXIF to record for a converted image, or `None` when nothing survives.
    pub fn apply(self, original: Option<&ExifData>) -> Option<ExifData> {
        let original = original?;
        let projected = match self {
            Self::Strip => return None,
            Self::Preserve => to_webp_compatible(original),
            Self::Sanitize => to_webp_compatible(&sanitize(original)),
        };
        (!projected.is_empty()).then_some(projected)
    }
}

impl std::str::FromStr for ExifPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preserve" => Ok(Self::Preserve),
            "strip" => Ok(Self::Strip),
            "sanitize" => Ok(Self::Sanitize),
            other => Err(format!(
                "unknown EXIF policy '{other}' (expected preserve, strip or sanitize)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionSettings {
    pub exif: ExifPolicy,
}

impl ConversionSettings {
    pub fn new(exif: ExifPolicy) -> Self {
        Self { exif }
    }

    pub fn preserve_exif(&self) -> bool {
        self.exif == ExifPolicy::Preserve
    }

    pub fn strip_exif(&self) -> bool {
        self.exif == ExifPolicy::Strip
    }

    pub fn sanitize_exif(&self) -> bool {
        self.exif == ExifPolicy::Sanitize
    }

    /// Turning preserve off falls back to strip.
    pub fn set_preserve(&mut self, on: bool) {
        if on {
            self.exif = ExifPolicy::Preserve;
        } else if self.preserve_exif() {
            self.exif = ExifPolicy::Strip;
        }
    }

    /// Turning strip off falls back to preserve.
    pub fn set_strip(&mut self, on: bool) {
        if on {
            self.exif = ExifPolicy::Strip;
        } else if self.strip_exif() {
            self.exif = ExifPolicy::Preserve;
        }
    }

    /// Turning sanitize off falls back to strip.
    pub fn set_sanitize(&mut self, on: bool) {
        if on {
            self.exif = ExifPolicy::Sanitize;
        } else if self.sanitize_exif() {
            self.exif = ExifPolicy::Strip;
        }
    }
}

/// Read EXIF through `reader`, treating any failure as absence.
///
/// Unsupported or malformed sources and empty maps all yield `None`; the
/// parser error only reaches the debug log.
pub fn extract_exif(reader: &dyn ExifReader, bytes: &[u8], name: &str) -> Option<ExifData> {
    match reader.read(bytes) {
        Ok(data) if data.is_empty() => None,
        Ok(data) => Some(data),
        Err(e) => {
            tracing::debug!(file = name, error = %e, "no EXIF available");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ExifReadError;

    fn num(n: f64) -> ExifValue {
        ExifValue::Number(n)
    }

    fn text(s: &str) -> ExifValue {
        ExifValue::Text(s.to_string())
    }

    fn exif(pairs: &[(&str, ExifValue)]) -> ExifData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn camera_exif() -> ExifData {
        exif(&[
            ("Make", text("Canon")),
            ("Model", text("EOS R5")),
            ("FNumber", num(2.8)),
            ("ExposureTime", num(0.004)),
            ("ISOSpeedRatings", num(400.0)),
            ("FocalLength", num(50.0)),
            ("PixelXDimension", num(8192.0)),
            ("PixelYDimension", num(5464.0)),
            ("DateTime", text("2024:06:01 18:30:00")),
            ("DateTimeOriginal", text("2024:06:01 18:29:58")),
            (
                "GPSLatitude",
                ExifValue::List(vec![num(40.0), num(26.0), num(46.5)]),
            ),
            ("GPSLatitudeRef", text("N")),
            (
                "GPSLongitude",
                ExifValue::List(vec![num(79.0), num(58.0), num(56.0)]),
            ),
            ("Software", text("Lightroom")),
            ("MakerNote", text("opaque")),
        ])
    }

    // =========================================================================
    // readable_summary
    // =========================================================================

    #[test]
    fn summary_formats_fields_in_fixed_order() {
        let summary = readable_summary(&camera_exif());
        let labels: Vec<&str> = summary.iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            vec![
                "Camera Make",
                "Camera Model",
                "Aperture",
                "Shutter Speed",
                "ISO",
                "Focal Length",
                "Width",
                "Height",
                "Date Taken",
                "Original Date",
                "GPS Coordinates",
                "Software",
            ]
        );
        let get = |label: &str| {
            summary
                .iter()
                .find(|(l, _)| *l == label)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };
        assert_eq!(get("Aperture"), "f/2.8");
        assert_eq!(get("Shutter Speed"), "1/250s");
        assert_eq!(get("ISO"), "400");
        assert_eq!(get("Focal Length"), "50mm");
        assert_eq!(get("Width"), "8192px");
        assert_eq!(get("GPS Coordinates"), "40,26,46.5, 79,58,56");
    }

    #[test]
    fn summary_long_exposure_in_seconds() {
        let summary = readable_summary(&exif(&[("ExposureTime", num(2.5))]));
        assert_eq!(summary, vec![("Shutter Speed", "2.5s".to_string())]);
    }

    #[test]
    fn summary_omits_absent_fields() {
        let summary = readable_summary(&exif(&[("Make", text("Nikon"))]));
        assert_eq!(summary, vec![("Camera Make", "Nikon".to_string())]);
    }

    #[test]
    fn summary_skips_zero_and_empty_values() {
        let summary = readable_summary(&exif(&[
            ("FNumber", num(0.0)),
            ("Model", text("")),
        ]));
        assert!(summary.is_empty());
    }

    #[test]
    fn summary_needs_both_gps_coordinates() {
        let summary = readable_summary(&exif(&[("GPSLatitude", num(40.0))]));
        assert!(summary.is_empty());
    }

    // =========================================================================
    // has_sensitive_data / sanitize
    // =========================================================================

    #[test]
    fn sensitive_when_any_location_field_present() {
        assert!(has_sensitive_data(&exif(&[("GPSAltitude", num(12.0))])));
        assert!(has_sensitive_data(&camera_exif()));
        assert!(!has_sensitive_data(&exif(&[("Make", text("Sony"))])));
        assert!(!has_sensitive_data(&exif(&[("GPSLatitudeRef", text("N"))])));
    }

    #[test]
    fn sanitize_drops_gps_and_timestamps_keeps_make() {
        let input = exif(&[
            ("GPSLatitude", num(40.0)),
            ("GPSLongitude", num(79.0)),
            ("DateTimeOriginal", text("2024:01:01 00:00:00")),
            ("Make", text("Canon")),
        ]);
        let out = sanitize(&input);
        assert_eq!(out, exif(&[("Make", text("Canon"))]));
    }

    #[test]
    fn sanitize_drops_gps_reference_fields_and_unknown_gps_tags() {
        let out = sanitize(&camera_exif());
        assert!(out.keys().all(|k| !k.starts_with("GPS")));
        assert!(!out.contains_key("DateTime"));
        assert!(out.contains_key("MakerNote"));
        assert!(out.contains_key("Software"));
    }

    #[test]
    fn sanitize_leaves_input_untouched() {
        let input = camera_exif();
        let _ = sanitize(&input);
        assert!(input.contains_key("GPSLatitude"));
    }

    // =========================================================================
    // to_webp_compatible
    // =========================================================================

    #[test]
    fn webp_projection_keeps_only_allow_listed_fields() {
        let out = to_webp_compatible(&camera_exif());
        let keys: Vec<&str> = out.keys().map(String::as_str).collect();
        assert!(keys.iter().all(|k| WEBP_COMPATIBLE_FIELDS.contains(k)));
        assert!(out.contains_key("DateTime"));
        assert!(!out.contains_key("DateTimeOriginal"));
        assert!(!out.contains_key("GPSLatitude"));
        assert!(!out.contains_key("MakerNote"));
    }

    #[test]
    fn webp_projection_of_unknown_fields_is_empty() {
        assert!(to_webp_compatible(&exif(&[("MakerNote", text("x"))])).is_empty());
    }

    // =========================================================================
    // ExifPolicy / ConversionSettings
    // =========================================================================

    #[test]
    fn default_policy_strips() {
        assert_eq!(ConversionSettings::default().exif, ExifPolicy::Strip);
        assert_eq!(ExifPolicy::Strip.apply(Some(&camera_exif())), None);
    }

    #[test]
    fn preserve_projects_onto_webp_fields() {
        let out = ExifPolicy::Preserve.apply(Some(&camera_exif())).unwrap();
        assert_eq!(out.get("Make"), Some(&text("Canon")));
        assert!(out.contains_key("DateTime"));
        assert!(!out.contains_key("GPSLatitude"));
    }

    #[test]
    fn sanitize_policy_removes_timestamps_before_projection() {
        let out = ExifPolicy::Sanitize.apply(Some(&camera_exif())).unwrap();
        assert!(!out.contains_key("DateTime"));
        assert_eq!(out.get("Model"), Some(&text("EOS R5")));
    }

    #[test]
    fn policy_without_surviving_fields_is_absent() {
        let only_gps = exif(&[("GPSLatitude", num(1.0)), ("DateTime", text("x"))]);
        assert_eq!(ExifPolicy::Sanitize.apply(Some(&only_gps)), None);
        assert_eq!(ExifPolicy::Preserve.apply(None), None);
    }

    #[test]
    fn toggles_keep_exactly_one_policy() {
        let mut settings = ConversionSettings::default();
        settings.set_sanitize(true);
        assert!(settings.sanitize_exif() && !settings.strip_exif() && !settings.preserve_exif());

        settings.set_preserve(true);
        assert_eq!(settings.exif, ExifPolicy::Preserve);

        settings.set_preserve(false);
        assert_eq!(settings.exif, ExifPolicy::Strip);

        settings.set_strip(false);
        assert_eq!(settings.exif, ExifPolicy::Preserve);

        // Turning off an inactive policy changes nothing.
        settings.set_sanitize(false);
        assert_eq!(settings.exif, ExifPolicy::Preserve);
    }

    #[test]
    fn set_strip_replaces_any_active_policy() {
        for from in [ExifPolicy::Preserve, ExifPolicy::Sanitize] {
            let mut settings = ConversionSettings::new(from);
            settings.set_strip(true);
            assert_eq!(settings.exif, ExifPolicy::Strip);
            assert!(settings.strip_exif() && !settings.preserve_exif() && !settings.sanitize_exif());
        }
    }

    #[test]
    fn policy_parses_from_cli_and_toml_spelling() {
        assert_eq!("Sanitize".parse::<ExifPolicy>(), Ok(ExifPolicy::Sanitize));
        assert!("keep".parse::<ExifPolicy>().is_err());
        let settings: ConversionSettings = toml::from_str("exif = \"preserve\"").unwrap();
        assert_eq!(settings.exif, ExifPolicy::Preserve);
    }

    // =========================================================================
    // extract_exif
    // =========================================================================

    struct FailingReader;

    impl ExifReader for FailingReader {
        fn read(&self, _bytes: &[u8]) -> Result<ExifData, ExifReadError> {
            Err(ExifReadError("truncated IFD".to_string()))
        }
    }

    struct FixedReader(ExifData);

    impl ExifReader for FixedReader {
        fn read(&self, _bytes: &[u8]) -> Result<ExifData, ExifReadError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn extract_swallows_parse_errors() {
        assert_eq!(extract_exif(&FailingReader, b"junk", "a.jpg"), None);
    }

    #[test]
    fn extract_treats_empty_map_as_absent() {
        assert_eq!(extract_exif(&FixedReader(ExifData::new()), b"", "a.jpg"), None);
    }

    #[test]
    fn extract_returns_parsed_map() {
        let data = exif(&[("Make", text("Fuji"))]);
        assert_eq!(
            extract_exif(&FixedReader(data.clone()), b"", "a.jpg"),
            Some(data)
        );
    }

    #[test]
    fn value_display_and_numeric_view() {
        let list = ExifValue::List(vec![num(1.0), num(2.5)]);
        assert_eq!(list.to_string(), "1,2.5");
        assert_eq!(list.as_f64(), Some(1.0));
        assert_eq!(ExifValue::from("0.5").as_f64(), Some(0.5));
        assert_eq!(ExifValue::from("n/a").as_f64(), None);
    }
}
