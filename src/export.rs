//! Exporting converted images.
//!
//! | Mode | Function | What the sink receives |
//! |---|---|---|
//! | Single | [`export_single`] | one `.webp` file |
//! | Multiple | [`export_multiple`] | one `.webp` per image, `stagger` apart |
//! | Archive | [`export_archive`] | one `converted-webp-images-<unix ms>.zip` |
//!
//! Names come from the [naming engine](crate::naming); [`export_names`] makes
//! them unique within one export so an archive never holds two entries with
//! the same name. Export never mutates the converted images, so a failed
//! export can simply be retried.

use crate::convert::ConvertedImage;
use crate::naming::{Clock, NamingSettings, OUTPUT_EXTENSION, generate_file_name_at};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error creating ZIP file. Please try again. ({0})")]
    Archive(#[from] zip::result::ZipError),
    #[error("Invalid output file name: {0}")]
    InvalidName(String),
}

/// Destination for exported files.
pub trait ExportSink {
    fn accept(&mut self, name: &str, bytes: &[u8]) -> Result<(), ExportError>;
}

/// Writes every accepted file into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ExportSink for DirectorySink {
    fn accept(&mut self, name: &str, bytes: &[u8]) -> Result<(), ExportError> {
        // Exactly one plain component, so nothing lands outside `dir`.
        let mut components = Path::new(name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(ExportError::InvalidName(name.to_string()));
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "exported");
        self.written.push(path);
        Ok(())
    }
}

/// Output names for a set of images, in order, deduplicated.
///
/// A repeated name gets `-2`, `-3`, ... inserted before the extension.
pub fn export_names(
    images: &[ConvertedImage],
    naming: Option<&NamingSettings>,
    clock: &dyn Clock,
) -> Vec<String> {
    let mut taken = HashSet::new();
    images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let name = generate_file_name_at(image, naming, Some(i), clock);
            let unique = if taken.contains(&name) {
                let stem = name.strip_suffix(OUTPUT_EXTENSION).unwrap_or(&name);
                (2..)
                    .map(|n| format!("{stem}-{n}{OUTPUT_EXTENSION}"))
                    .find(|candidate| !taken.contains(candidate))
                    .unwrap_or_else(|| name.clone())
            } else {
                name
            };
            taken.insert(unique.clone());
            unique
        })
        .collect()
}

pub fn export_single(
    image: &ConvertedImage,
    name: &str,
    sink: &mut dyn ExportSink,
) -> Result<(), ExportError> {
    sink.accept(name, &image.webp)
}

/// Export each image separately, sleeping `stagger` between consecutive files.
pub fn export_multiple(
    images: &[ConvertedImage],
    names: &[String],
    sink: &mut dyn ExportSink,
    stagger: Duration,
) -> Result<(), ExportError> {
    for (i, (image, name)) in images.iter().zip(names).enumerate() {
        if i > 0 && !stagger.is_zero() {
            std::thread::sleep(stagger);
        }
        export_single(image, name, sink)?;
    }
    Ok(())
}

/// `converted-webp-images-<unix millis>.zip`
pub fn archive_name(unix_millis: i64) -> String {
    format!("converted-webp-images-{unix_millis}.zip")
}

/// Build a ZIP archive in memory from `(name, image)` pairs.
pub fn build_archive(images: &[ConvertedImage], names: &[String]) -> Result<Vec<u8>, ExportError> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);

    for (image, name) in images.iter().zip(names) {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(&image.webp)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Bundle every image into one archive and hand it to `sink`.
///
/// Returns the archive name, or `None` when there was nothing to export.
pub fn export_archive(
    images: &[ConvertedImage],
    names: &[String],
    sink: &mut dyn ExportSink,
    clock: &dyn Clock,
) -> Result<Option<String>, ExportError> {
    if images.is_empty() {
        return Ok(None);
    }
    let bytes = build_archive(images, names)?;
    let name = archive_name(clock.now().timestamp_millis());
    sink.accept(&name, &bytes)?;
    Ok(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::converted_image;
    use chrono::{DateTime, Local};
    use std::io::Read;

    #[derive(Default)]
    struct MemorySink {
        files: Vec<(String, Vec<u8>)>,
    }

    impl ExportSink for MemorySink {
        fn accept(&mut self, name: &str, bytes: &[u8]) -> Result<(), ExportError> {
            self.files.push((name.to_string(), bytes.to_vec()));
            Ok(())
        }
    }

    struct FailingSink;

    impl ExportSink for FailingSink {
        fn accept(&mut self, _name: &str, _bytes: &[u8]) -> Result<(), ExportError> {
            Err(ExportError::Io(std::io::Error::other("disk full")))
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Local> {
            DateTime::from_timestamp_millis(1_717_236_000_123)
                .unwrap()
                .with_timezone(&Local)
        }
    }

    fn images(names: &[&str]) -> Vec<ConvertedImage> {
        names.iter().map(|n| converted_image(n, 1000, 300)).collect()
    }

    // =========================================================================
    // Names
    // =========================================================================

    #[test]
    fn names_follow_naming_settings_with_batch_index() {
        let naming = NamingSettings {
            custom_name: "trip".into(),
            add_number: true,
            ..Default::default()
        };
        let names = export_names(&images(&["a.png", "b.png"]), Some(&naming), &FixedClock);
        assert_eq!(names, vec!["trip_1.webp", "trip_2.webp"]);
    }

    #[test]
    fn duplicate_names_are_disambiguated() {
        let naming = NamingSettings {
            custom_name: "trip".into(),
            ..Default::default()
        };
        let names = export_names(&images(&["a.png", "b.png", "c.png"]), Some(&naming), &FixedClock);
        assert_eq!(names, vec!["trip.webp", "trip-2.webp", "trip-3.webp"]);
    }

    // =========================================================================
    // Single / multiple
    // =========================================================================

    #[test]
    fn multiple_export_writes_every_file_in_order() {
        let imgs = images(&["a.png", "b.jpg"]);
        let names = export_names(&imgs, None, &FixedClock);
        let mut sink = MemorySink::default();

        export_multiple(&imgs, &names, &mut sink, Duration::ZERO).unwrap();

        let written: Vec<&str> = sink.files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(written, vec!["a.webp", "b.webp"]);
        assert_eq!(sink.files[0].1, imgs[0].webp);
    }

    #[test]
    fn directory_sink_writes_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let mut sink = DirectorySink::new(&out);
        let img = converted_image("photo.png", 1000, 300);

        export_single(&img, "photo.webp", &mut sink).unwrap();

        assert_eq!(std::fs::read(out.join("photo.webp")).unwrap(), img.webp);
        assert_eq!(sink.written(), &[out.join("photo.webp")]);
    }

    #[test]
    fn directory_sink_rejects_names_leaving_its_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("converted");
        let mut sink = DirectorySink::new(&out);
        let img = converted_image("photo.png", 1000, 300);

        for name in ["../escaped.webp", "nested/photo.webp", "/tmp/abs.webp", "..", ""] {
            let err = export_single(&img, name, &mut sink).unwrap_err();
            assert!(matches!(err, ExportError::InvalidName(_)), "{name:?}");
        }
        assert!(!tmp.path().join("escaped.webp").exists());
        assert!(!out.join("nested").exists());
        assert!(sink.written().is_empty());
    }

    // =========================================================================
    // Archive
    // =========================================================================

    #[test]
    fn archive_contains_every_generated_name() {
        let imgs = images(&["one.png", "two.gif", "three.avif"]);
        let names = export_names(&imgs, None, &FixedClock);
        let mut sink = MemorySink::default();

        let name = export_archive(&imgs, &names, &mut sink, &FixedClock)
            .unwrap()
            .unwrap();
        assert_eq!(name, "converted-webp-images-1717236000123.zip");

        let (_, bytes) = &sink.files[0];
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
        assert_eq!(archive.len(), 3);
        for (img, entry) in imgs.iter().zip(&names) {
            let mut content = Vec::new();
            archive.by_name(entry).unwrap().read_to_end(&mut content).unwrap();
            assert_eq!(content, img.webp);
        }
    }

    #[test]
    fn empty_archive_export_is_a_noop() {
        let mut sink = MemorySink::default();
        assert_eq!(export_archive(&[], &[], &mut sink, &FixedClock).unwrap(), None);
        assert!(sink.files.is_empty());
    }

    #[test]
    fn sink_failure_propagates_and_leaves_images_intact() {
        let imgs = images(&["a.png"]);
        let before = imgs[0].webp.clone();
        let names = export_names(&imgs, None, &FixedClock);

        let result = export_archive(&imgs, &names, &mut FailingSink, &FixedClock);
        assert!(matches!(result, Err(ExportError::Io(_))));
        assert_eq!(imgs[0].webp, before);
    }

    #[test]
    fn archive_error_message_asks_for_retry() {
        let err = ExportError::Archive(zip::result::ZipError::FileNotFound);
        assert!(err.to_string().starts_with("Error creating ZIP file. Please try again."));
    }
}
