//! Sequential batch conversion.
//!
//! Files are converted one at a time, in input order. A failing file is
//! logged, recorded in [`BatchOutcome::skipped`] and left out of
//! [`BatchOutcome::converted`]; it never aborts the batch. The progress
//! callback fires once per processed file, after its outcome is known, with
//! `completed` counting up from 1 to `total`.
//!
//! Cancellation is cooperative: the [`CancelToken`] is checked before each
//! file, so a file already being converted always finishes.

use crate::convert::{ConvertOptions, ConvertedImage, Converter, SelectedFile};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

/// A file that failed to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub converted: Vec<ConvertedImage>,
    pub skipped: Vec<SkippedItem>,
    pub cancelled: bool,
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Convert every file, isolating failures.
pub fn convert_all(
    converter: &Converter<'_>,
    files: &[SelectedFile],
    options: &ConvertOptions,
    on_progress: impl FnMut(BatchProgress),
) -> BatchOutcome {
    convert_all_cancellable(converter, files, options, on_progress, &CancelToken::new())
}

/// [`convert_all`] that stops before the next file once `cancel` is set.
pub fn convert_all_cancellable(
    converter: &Converter<'_>,
    files: &[SelectedFile],
    options: &ConvertOptions,
    mut on_progress: impl FnMut(BatchProgress),
    cancel: &CancelToken,
) -> BatchOutcome {
    let total = files.len();
    let mut outcome = BatchOutcome::default();

    for (i, file) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!(completed = i, total, "batch cancelled");
            outcome.cancelled = true;
            break;
        }

        match converter.convert(file, options) {
            Ok(image) => outcome.converted.push(image),
            Err(e) => {
                tracing::warn!(file = %file.file.name, error = %e, "skipping file");
                outcome.skipped.push(SkippedItem {
                    name: file.file.name.clone(),
                    reason: e.to_string(),
                });
            }
        }

        on_progress(BatchProgress {
            completed: i + 1,
            total,
        });
    }

    outcome
}
