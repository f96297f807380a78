//! Preview handles for selected files.
//!
//! A [`PreviewHandle`] is a scoped acquisition: it registers its file with the
//! owning [`PreviewPool`] when created and unregisters on drop. Dropping a
//! [`SelectedFile`](crate::convert::SelectedFile) therefore releases its
//! preview without any explicit call, and [`PreviewPool::live`] reports how
//! many are still held.

use crate::convert::InputFile;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct PoolInner {
    next_id: AtomicU64,
    live: Mutex<HashMap<u64, Arc<InputFile>>>,
}

impl PoolInner {
    fn live_map(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Arc<InputFile>>> {
        // A poisoned map is still a valid map.
        self.live.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Registry of outstanding preview handles.
#[derive(Clone, Default)]
pub struct PreviewPool {
    inner: Arc<PoolInner>,
}

impl PreviewPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, file: &Arc<InputFile>) -> PreviewHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.live_map().insert(id, Arc::clone(file));
        PreviewHandle {
            id,
            file: Arc::clone(file),
            pool: Arc::clone(&self.inner),
        }
    }

    /// Number of handles not yet dropped.
    pub fn live(&self) -> usize {
        self.inner.live_map().len()
    }
}

/// A renderable reference to a selected file's bytes. Released on drop.
pub struct PreviewHandle {
    id: u64,
    file: Arc<InputFile>,
    pool: Arc<PoolInner>,
}

impl PreviewHandle {
    /// Stable key for this preview, unique within its pool.
    pub fn key(&self) -> String {
        format!("preview:{}", self.id)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.file.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.file.mime_type
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("id", &self.id)
            .field("file", &self.file.name)
            .finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.pool.live_map().remove(&self.id);
    }
}
