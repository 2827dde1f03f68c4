//! # vfhash-device
//!
//! Storage device abstraction for the virtual volumes hashed by vfhash.
//!
//! A virtual path such as `platform:/data/level.rpf` is resolved to a
//! [`Device`] through a [`DeviceResolver`]. The device then serves the file
//! through a small handle-based, read-only API:
//!
//! ```text
//! resolve(path) -> Device
//!   open(path)  -> Handle
//!   length(h)   -> u64
//!   read(h,buf) -> n > 0 | 0 (end) | < 0 (error)
//!   close(h)
//! ```
//!
//! Two devices ship with the crate:
//! - [`LocalDevice`]: a host directory exposed under a virtual prefix
//! - [`MemoryDevice`]: in-memory files with fault injection, for tests

mod handles;
mod local;
mod memory;

pub use handles::HandleTable;
pub use local::LocalDevice;
pub use memory::MemoryDevice;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Opaque identifier of an open file on one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub u64);

/// Errors raised while assembling a mount table
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Mount root not found: {}", path.display())]
    RootNotFound { path: PathBuf },

    #[error("Invalid mount prefix: {prefix:?}")]
    InvalidPrefix { prefix: String },
}

pub type Result<T> = std::result::Result<T, DeviceError>;

/// Read-only file access on a mounted volume.
///
/// Mirrors the host storage contract: failures are reported through `None`
/// and negative read counts rather than errors.
pub trait Device: Send + Sync {
    /// Open `path` (the full virtual path). Only read-only opens succeed.
    fn open(&self, path: &str, read_only: bool) -> Option<Handle>;

    /// Total length of the open file in bytes.
    fn length(&self, handle: Handle) -> u64;

    /// Read up to `buf.len()` bytes. Returns the count read, `0` at end of
    /// data, or a negative value on failure.
    fn read(&self, handle: Handle, buf: &mut [u8]) -> i64;

    /// Release the handle. Closing an unknown handle is a no-op.
    fn close(&self, handle: Handle);

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Maps a virtual path to the device that serves it
pub trait DeviceResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Option<Arc<dyn Device>>;
}

/// Prefix-based resolver over a set of mounted devices.
///
/// The longest mounted prefix matching a path wins.
#[derive(Default)]
pub struct MountTable {
    mounts: Vec<(String, Arc<dyn Device>)>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `device` under `prefix`, replacing any device already there.
    pub fn mount(&mut self, prefix: impl Into<String>, device: Arc<dyn Device>) -> Result<()> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(DeviceError::InvalidPrefix { prefix });
        }

        vfhash_config::log_device_debug!(
            "Mounting device",
            prefix = prefix.as_str(),
            device = device.name()
        );

        match self.mounts.iter_mut().find(|(p, _)| *p == prefix) {
            Some(slot) => slot.1 = device,
            None => self.mounts.push((prefix, device)),
        }
        Ok(())
    }

    /// Builder form of [`MountTable::mount`].
    pub fn with(mut self, prefix: impl Into<String>, device: Arc<dyn Device>) -> Result<Self> {
        self.mount(prefix, device)?;
        Ok(self)
    }

    /// Mount each `(prefix, host directory)` pair as a [`LocalDevice`].
    pub fn from_dirs<I, P>(dirs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, P)>,
        P: Into<PathBuf>,
    {
        let mut table = Self::new();
        for (prefix, dir) in dirs {
            let device = LocalDevice::new(prefix.clone(), dir)?;
            table.mount(prefix, Arc::new(device))?;
        }
        Ok(table)
    }

    /// Mounted prefixes, in mount order
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.mounts.iter().map(|(p, _)| p.as_str())
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}

impl DeviceResolver for MountTable {
    fn resolve(&self, path: &str) -> Option<Arc<dyn Device>> {
        self.mounts
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, device)| Arc::clone(device))
    }
}
