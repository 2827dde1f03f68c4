//! Handle bookkeeping shared by the bundled devices.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;

use crate::Handle;

/// Concurrent table of open files keyed by [`Handle`].
///
/// Handle ids are never reused within one table.
pub struct HandleTable<T> {
    open: DashMap<Handle, T>,
    next: AtomicU64,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self {
            open: DashMap::new(),
            next: AtomicU64::new(1),
        }
    }
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open file and return its handle
    pub fn insert(&self, file: T) -> Handle {
        let handle = Handle(self.next.fetch_add(1, Ordering::Relaxed));
        self.open.insert(handle, file);
        handle
    }

    /// Exclusive access to an open file
    pub fn get_mut(&self, handle: Handle) -> Option<RefMut<'_, Handle, T>> {
        self.open.get_mut(&handle)
    }

    /// Forget a handle, returning the file it referred to
    pub fn remove(&self, handle: Handle) -> Option<T> {
        self.open.remove(&handle).map(|(_, file)| file)
    }

    /// Number of handles currently open
    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}
