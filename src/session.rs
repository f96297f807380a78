//! The conversion session: selected files, their previews, and results.
//!
//! A [`Session`] owns both collections the user works with:
//!
//! - **Selected files**: accepted inputs with an id, preview handle, EXIF map
//!   and filename-derived metadata. Unsupported inputs are filtered out and
//!   reported once per [`Session::add_files`] call.
//! - **Converted images**: the results of the last [`Session::convert`] run.
//!   Adding files clears them; removing a file drops its result too.
//!
//! Preview handles live inside the selected files, so removing or clearing
//! files releases them.
//!
//! Input collection from disk ([`collect_paths`], [`load_supported`]) lives here
//! too: it is the CLI's way of "selecting" files.

use crate::batch::{BatchProgress, CancelToken, SkippedItem, convert_all_cancellable};
use crate::convert::{ConvertOptions, ConvertedImage, Converter, InputFile, SelectedFile};
use crate::exif::extract_exif;
use crate::formats::{UnsupportedReport, mime_for_path, partition_supported};
use crate::imaging::{ExifReader, KamadakReader};
use crate::metadata::auto_metadata;
use crate::preview::PreviewPool;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;
use walkdir::WalkDir;

/// What a [`Session::convert`] run left behind besides the results.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionRun {
    pub skipped: Vec<SkippedItem>,
    pub cancelled: bool,
}

pub struct Session {
    reader: Box<dyn ExifReader>,
    previews: PreviewPool,
    selected: Vec<SelectedFile>,
    converted: Vec<ConvertedImage>,
    error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_reader(Box::new(KamadakReader))
    }

    pub fn with_reader(reader: Box<dyn ExifReader>) -> Self {
        Self {
            reader,
            previews: PreviewPool::new(),
            selected: Vec::new(),
            converted: Vec::new(),
            error: None,
        }
    }

    pub fn selected(&self) -> &[SelectedFile] {
        &self.selected
    }

    pub fn converted(&self) -> &[ConvertedImage] {
        &self.converted
    }

    pub fn previews(&self) -> &PreviewPool {
        &self.previews
    }

    /// The last user-facing selection error, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Accept the supported files, append them, and drop previous results.
    ///
    /// When nothing is supported the session is left untouched apart from the
    /// error message.
    pub fn add_files(&mut self, files: Vec<InputFile>) -> UnsupportedReport {
        let (accepted, report) = partition_supported(files, |f| f.mime_type.as_str());
        if let Some(message) = report.message() {
            self.error = Some(message);
        }
        if accepted.is_empty() {
            return report;
        }

        for input in accepted {
            let file = Arc::new(input);
            let exif = extract_exif(self.reader.as_ref(), &file.bytes, &file.name);
            let auto = auto_metadata(&file.name);
            self.selected.push(SelectedFile {
                id: Uuid::new_v4(),
                preview: Some(self.previews.acquire(&file)),
                exif,
                auto_metadata: Some(auto),
                file,
            });
        }
        self.converted.clear();
        report
    }

    /// Remove a selected file and its result. Returns false for unknown ids.
    pub fn remove_file(&mut self, id: Uuid) -> bool {
        let before = self.selected.len();
        self.selected.retain(|f| f.id != id);
        self.converted.retain(|c| c.id != id);
        self.selected.len() != before
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.converted.clear();
    }

    /// Convert every selected file, replacing the previous results.
    pub fn convert(
        &mut self,
        converter: &Converter<'_>,
        options: &ConvertOptions,
        on_progress: impl FnMut(BatchProgress),
    ) -> ConversionRun {
        self.convert_cancellable(converter, options, on_progress, &CancelToken::new())
    }

    pub fn convert_cancellable(
        &mut self,
        converter: &Converter<'_>,
        options: &ConvertOptions,
        on_progress: impl FnMut(BatchProgress),
        cancel: &CancelToken,
    ) -> ConversionRun {
        let outcome =
            convert_all_cancellable(converter, &self.selected, options, on_progress, cancel);
        self.converted = outcome.converted;
        ConversionRun {
            skipped: outcome.skipped,
            cancelled: outcome.cancelled,
        }
    }
}

/// Expand CLI inputs into file paths.
///
/// Files are taken as given. Directories contribute their files, one level
/// deep unless `recursive`, sorted by name. Nothing is filtered by type here.
pub fn collect_paths(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }
        let walker = WalkDir::new(input).sort_by_file_name();
        let walker = if recursive {
            walker
        } else {
            walker.max_depth(1)
        };
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }
    }
    Ok(paths)
}

/// Read the paths whose extension names a supported type.
///
/// Paths are filtered before any bytes are read, so unsupported files are
/// counted in the report but never opened.
pub fn load_supported(paths: Vec<PathBuf>) -> std::io::Result<(Vec<InputFile>, UnsupportedReport)> {
    let (accepted, report) = partition_supported(paths, |p| mime_for_path(p));
    let files = accepted
        .iter()
        .map(|p| InputFile::from_path(p))
        .collect::<std::io::Result<Vec<_>>>()?;
    Ok((files, report))
}
