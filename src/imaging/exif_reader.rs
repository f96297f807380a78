//! EXIF extraction from raw container bytes.
//!
//! [`KamadakReader`] walks the primary image's IFDs (including the Exif and
//! GPS sub-IFDs) with `kamadak-exif` and flattens them into an
//! [`ExifData`] map. Thumbnail IFD fields are ignored.
//!
//! | EXIF type | [`ExifValue`] |
//! |---|---|
//! | ASCII | `Text` (components joined, NULs trimmed) |
//! | BYTE/SHORT/LONG/SBYTE/SSHORT/SLONG/FLOAT/DOUBLE | `Number`, or `List` when repeated |
//! | RATIONAL/SRATIONAL | as above, via `to_f64` |
//! | UNDEFINED/unknown | `Text` of the display value |

use crate::exif::{ExifData, ExifValue};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ExifReadError(pub String);

/// Source of flat EXIF maps.
pub trait ExifReader: Sync {
    fn read(&self, bytes: &[u8]) -> Result<ExifData, ExifReadError>;
}

/// [`ExifReader`] backed by the `kamadak-exif` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct KamadakReader;

impl ExifReader for KamadakReader {
    fn read(&self, bytes: &[u8]) -> Result<ExifData, ExifReadError> {
        let exif = exif::Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .map_err(|e| ExifReadError(e.to_string()))?;

        let mut data = ExifData::new();
        for field in exif.fields() {
            if field.ifd_num != exif::In::PRIMARY {
                continue;
            }
            let name = match field.tag {
                exif::Tag::PhotographicSensitivity => "ISOSpeedRatings".to_string(),
                tag => tag.to_string(),
            };
            if let Some(value) = convert_value(field) {
                data.entry(name).or_insert(value);
            }
        }
        Ok(data)
    }
}

fn numbers<T: Copy>(values: &[T], to_f64: impl Fn(T) -> f64) -> Option<ExifValue> {
    match values {
        [] => None,
        [single] => Some(ExifValue::Number(to_f64(*single))),
        many => Some(ExifValue::List(
            many.iter().map(|v| ExifValue::Number(to_f64(*v))).collect(),
        )),
    }
}

fn convert_value(field: &exif::Field) -> Option<ExifValue> {
    use exif::Value;

    match &field.value {
        Value::Ascii(parts) => {
            let text = parts
                .iter()
                .map(|p| {
                    String::from_utf8_lossy(p)
                        .trim_matches(char::from(0))
                        .trim()
                        .to_string()
                })
                .collect::<Vec<_>>()
                .join(" ");
            Some(ExifValue::Text(text))
        }
        Value::Byte(v) => numbers(v, f64::from),
        Value::Short(v) => numbers(v, f64::from),
        Value::Long(v) => numbers(v, f64::from),
        Value::SByte(v) => numbers(v, f64::from),
        Value::SShort(v) => numbers(v, f64::from),
        Value::SLong(v) => numbers(v, f64::from),
        Value::Float(v) => numbers(v, f64::from),
        Value::Double(v) => numbers(v, |d| d),
        Value::Rational(v) => numbers(v, |r| r.to_f64()),
        Value::SRational(v) => numbers(v, |r| r.to_f64()),
        _ => Some(ExifValue::Text(
            field.display_value().to_string().replace('"', "").trim().to_string(),
        )),
    }
}
