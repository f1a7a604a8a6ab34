//! Open file handles
//!
//! A handle holds the content materialized by the first read so that the
//! kernel's follow-up reads at higher offsets see one consistent snapshot.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// State of one open file
#[derive(Debug)]
pub struct FileHandle {
    pub ino: u64,
    content: Option<Vec<u8>>,
}

impl FileHandle {
    /// Bytes `offset..offset+size` of the held content
    pub fn slice(&self, offset: u64, size: u32) -> Option<&[u8]> {
        let content = self.content.as_ref()?;
        let start = (offset as usize).min(content.len());
        let end = start.saturating_add(size as usize).min(content.len());
        Some(&content[start..end])
    }

    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = Some(content);
    }

    /// Forget held content, e.g. after a write changed it remotely
    pub fn invalidate(&mut self) {
        self.content = None;
    }
}

/// Allocates file handle numbers
pub struct HandleManager {
    next_fh: AtomicU64,
    handles: RwLock<HashMap<u64, FileHandle>>,
}

impl HandleManager {
    pub fn new() -> Self {
        HandleManager {
            next_fh: AtomicU64::new(1),
            handles: RwLock::new(HashMap::new()),
        }
    }

    pub fn open(&self, ino: u64) -> u64 {
        let fh = self.next_fh.fetch_add(1, Ordering::SeqCst);
        self.handles.write().insert(
            fh,
            FileHandle {
                ino,
                content: None,
            },
        );
        fh
    }

    pub fn with_handle_mut<R>(&self, fh: u64, f: impl FnOnce(&mut FileHandle) -> R) -> Option<R> {
        self.handles.write().get_mut(&fh).map(f)
    }

    pub fn close(&self, fh: u64) -> Option<FileHandle> {
        self.handles.write().remove(&fh)
    }
}

impl Default for HandleManager {
    fn default() -> Self {
        Self::new()
    }
}
