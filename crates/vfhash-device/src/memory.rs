//! In-memory device with fault injection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};

use crate::{Device, Handle, HandleTable};

/// Files held in memory, keyed by their full virtual path.
///
/// Faults can be injected per path: [`MemoryDevice::fail_open`] makes opens
/// fail, [`MemoryDevice::truncate_reads`] makes reads fail part way through
/// while `length` keeps reporting the full size.
pub struct MemoryDevice {
    name: String,
    files: DashMap<String, Arc<[u8]>>,
    failing_opens: DashSet<String>,
    truncations: DashMap<String, usize>,
    handles: HandleTable<OpenBlob>,
    opens: AtomicU64,
}

struct OpenBlob {
    data: Arc<[u8]>,
    pos: usize,
    readable: usize,
}

impl Default for MemoryDevice {
    fn default() -> Self {
        Self::named("memory")
    }
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: DashMap::new(),
            failing_opens: DashSet::new(),
            truncations: DashMap::new(),
            handles: HandleTable::new(),
            opens: AtomicU64::new(0),
        }
    }

    /// Add or replace a file
    pub fn insert(&self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        let data: Vec<u8> = data.into();
        self.files.insert(path.into(), Arc::from(data));
    }

    pub fn remove(&self, path: &str) {
        self.files.remove(path);
    }

    /// Make every future open of `path` fail
    pub fn fail_open(&self, path: impl Into<String>) {
        self.failing_opens.insert(path.into());
    }

    /// Serve only the first `after` bytes of `path`, then fail reads
    pub fn truncate_reads(&self, path: impl Into<String>, after: usize) {
        self.truncations.insert(path.into(), after);
    }

    /// Handles opened and not yet closed
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    /// Successful opens since creation
    pub fn total_opens(&self) -> u64 {
        self.opens.load(Ordering::Relaxed)
    }
}

impl Device for MemoryDevice {
    fn open(&self, path: &str, read_only: bool) -> Option<Handle> {
        if !read_only || self.failing_opens.contains(path) {
            return None;
        }
        let data = Arc::clone(self.files.get(path)?.value());
        let readable = self
            .truncations
            .get(path)
            .map(|after| (*after).min(data.len()))
            .unwrap_or(data.len());

        self.opens.fetch_add(1, Ordering::Relaxed);
        Some(self.handles.insert(OpenBlob {
            data,
            pos: 0,
            readable,
        }))
    }

    fn length(&self, handle: Handle) -> u64 {
        self.handles
            .get_mut(handle)
            .map(|blob| blob.data.len() as u64)
            .unwrap_or(0)
    }

    fn read(&self, handle: Handle, buf: &mut [u8]) -> i64 {
        let Some(mut blob) = self.handles.get_mut(handle) else {
            return -1;
        };
        if blob.pos >= blob.readable {
            // Truncated blobs fail instead of reporting end of data
            return if blob.readable < blob.data.len() { -1 } else { 0 };
        }
        let n = buf.len().min(blob.readable - blob.pos);
        let start = blob.pos;
        buf[..n].copy_from_slice(&blob.data[start..start + n]);
        blob.pos += n;
        n as i64
    }

    fn close(&self, handle: Handle) {
        self.handles.remove(handle);
    }

    fn name(&self) -> &str {
        &self.name
    }
}
