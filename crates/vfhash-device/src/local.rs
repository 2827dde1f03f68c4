//! Host directory exposed as a read-only virtual volume.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Component, Path, PathBuf};

use crate::{Device, DeviceError, Handle, HandleTable, Result};

/// Serves `prefix + relative/path` from `root/relative/path`.
pub struct LocalDevice {
    prefix: String,
    root: PathBuf,
    files: HandleTable<OpenFile>,
}

struct OpenFile {
    file: File,
    len: u64,
}

impl LocalDevice {
    /// Create a device rooted at an existing host directory.
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        let prefix = prefix.into();
        let root = root.into();
        if prefix.is_empty() {
            return Err(DeviceError::InvalidPrefix { prefix });
        }
        if !root.is_dir() {
            return Err(DeviceError::RootNotFound { path: root });
        }
        Ok(Self {
            prefix,
            root,
            files: HandleTable::new(),
        })
    }

    /// Host location of a virtual path, if it stays inside the root.
    pub fn host_path(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.strip_prefix(self.prefix.as_str())?);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained {
            return None;
        }
        Some(self.root.join(relative))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Handles opened and not yet closed
    pub fn open_handles(&self) -> usize {
        self.files.len()
    }
}

impl Device for LocalDevice {
    fn open(&self, path: &str, read_only: bool) -> Option<Handle> {
        if !read_only {
            return None;
        }
        let host = self.host_path(path)?;
        let file = match File::open(&host) {
            Ok(file) => file,
            Err(e) => {
                let error = e.to_string();
                vfhash_config::log_device_debug!(
                    "Open failed",
                    path = path,
                    error = error.as_str()
                );
                return None;
            }
        };
        let meta = file.metadata().ok()?;
        if !meta.is_file() {
            return None;
        }
        Some(self.files.insert(OpenFile {
            file,
            len: meta.len(),
        }))
    }

    fn length(&self, handle: Handle) -> u64 {
        self.files.get_mut(handle).map(|f| f.len).unwrap_or(0)
    }

    fn read(&self, handle: Handle, buf: &mut [u8]) -> i64 {
        let Some(mut open) = self.files.get_mut(handle) else {
            return -1;
        };
        loop {
            match open.file.read(buf) {
                Ok(n) => return n as i64,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    let error = e.to_string();
                    vfhash_config::log_device_warn!(
                        "Read failed",
                        device = self.prefix.as_str(),
                        error = error.as_str()
                    );
                    return -1;
                }
            }
        }
    }

    fn close(&self, handle: Handle) {
        self.files.remove(handle);
    }

    fn name(&self) -> &str {
        &self.prefix
    }
}
